use num_traits::{Float, FromPrimitive};

/// Returns `n` evenly spaced values from `y_start` to `y_end`,
/// inclusive. A single value is just `y_start`.
pub fn linspace<T>(y_start: T, y_end: T, n: usize) -> impl ExactSizeIterator<Item = T> + Clone
where
    T: Float + FromPrimitive,
{
    let dy = if n > 1 {
        (y_end - y_start) / T::from(n - 1).unwrap()
    } else {
        T::zero()
    };
    (0..n).map(move |x| y_start + T::from(x).unwrap() * dy)
}
