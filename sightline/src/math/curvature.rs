use num_traits::Float;

/// Returns the apparent rise of terrain at `d` meters along a path of
/// `total` meters, relative to the straight chord joining its ends, on
/// a sphere of radius `effective_radius`.
///
/// Zero at both endpoints and largest at the midpoint.
pub fn curvature_correction<T: Float>(d: T, total: T, effective_radius: T) -> T {
    let two = T::one() + T::one();
    d * (total - d) / (two * effective_radius)
}

/// Returns the earth radius bent by refraction coefficient `k`, or
/// `None` when `k == 1` and light follows the surface exactly.
pub fn effective_radius<T: Float>(radius: T, k: T) -> Option<T> {
    let factor = T::one() - k;
    if factor <= T::zero() {
        None
    } else {
        Some(radius / factor)
    }
}
