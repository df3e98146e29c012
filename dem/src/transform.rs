//! Affine georeferencing between grid indices and world coordinates.

use crate::{DemError, C};
use geo::geometry::Coord;

/// A six coefficient affine transform, in GDAL order.
///
/// ```text
/// x = c[0] + col * c[1] + row * c[2]
/// y = c[3] + col * c[4] + row * c[5]
/// ```
///
/// `(row, col) = (0, 0)` is the outer corner of the first cell, so
/// the _center_ of cell `(r, c)` is at `(r + 0.5, c + 0.5)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    coefficients: [C; 6],
    inverse: [C; 6],
}

impl GeoTransform {
    pub fn new(coefficients: [C; 6]) -> Result<Self, DemError> {
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(DemError::InvalidConfiguration(
                "transform coefficients must be finite",
            ));
        }
        let inverse = inverse(coefficients)
            .ok_or(DemError::InvalidConfiguration("transform is singular"))?;
        Ok(Self {
            coefficients,
            inverse,
        })
    }

    /// Returns a north-up transform whose first cell's NW corner is at
    /// `(origin_x, origin_y)`.
    pub fn north_up(origin_x: C, origin_y: C, cell_size: C) -> Result<Self, DemError> {
        Self::new([origin_x, cell_size, 0.0, origin_y, 0.0, -cell_size])
    }

    pub fn coefficients(&self) -> [C; 6] {
        self.coefficients
    }

    /// Maps fractional `(row, col)` to world coordinates.
    pub fn apply(&self, row: C, col: C) -> Coord<C> {
        let [c0, c1, c2, c3, c4, c5] = self.coefficients;
        Coord {
            x: c0 + col * c1 + row * c2,
            y: c3 + col * c4 + row * c5,
        }
    }

    /// Maps world coordinates to fractional `(row, col)`.
    pub fn invert(&self, coord: Coord<C>) -> (C, C) {
        let [i0, i1, i2, i3, i4, i5] = self.inverse;
        let col = i0 + coord.x * i1 + coord.y * i2;
        let row = i3 + coord.x * i4 + coord.y * i5;
        (row, col)
    }

    /// Returns the transform of a sub-window whose first cell is
    /// `(row, col)` of this transform.
    pub fn offset(&self, row: usize, col: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let origin = self.apply(row as C, col as C);
        let mut coefficients = self.coefficients;
        coefficients[0] = origin.x;
        coefficients[3] = origin.y;
        Self {
            coefficients,
            // Offsetting leaves the linear part, and so the
            // determinant, unchanged.
            inverse: inverse(coefficients).unwrap_or(self.inverse),
        }
    }
}

/// Returns the coefficients solving for `(col, row)` from `(x, y)`,
/// or `None` if the linear part is singular.
fn inverse([c0, c1, c2, c3, c4, c5]: [C; 6]) -> Option<[C; 6]> {
    let det = c1 * c5 - c2 * c4;
    if det.abs() < C::EPSILON {
        return None;
    }
    Some([
        (c2 * c3 - c0 * c5) / det,
        c5 / det,
        -c2 / det,
        (c0 * c4 - c1 * c3) / det,
        -c4 / det,
        c1 / det,
    ])
}

/// A world coordinate resolved to a grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
    /// Position within the cell along the row axis, in `[0, 1)`.
    pub row_frac: C,
    /// Position within the cell along the column axis, in `[0, 1)`.
    pub col_frac: C,
}

#[cfg(test)]
mod tests {
    use super::{Coord, GeoTransform};
    use approx::assert_relative_eq;

    #[test]
    fn test_north_up_apply_and_invert() {
        let t = GeoTransform::north_up(1000.0, 5000.0, 30.0).unwrap();
        let corner = t.apply(0.0, 0.0);
        assert_eq!(corner, Coord { x: 1000.0, y: 5000.0 });
        let center = t.apply(0.5, 0.5);
        assert_eq!(center, Coord { x: 1015.0, y: 4985.0 });
        let (row, col) = t.invert(Coord { x: 1075.0, y: 4925.0 });
        assert_relative_eq!(row, 2.5, epsilon = 1e-9);
        assert_relative_eq!(col, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_rotated_invert() {
        let t = GeoTransform::new([10.0, 2.0, 1.0, 20.0, 0.5, -3.0]).unwrap();
        let world = t.apply(7.25, 3.5);
        let (row, col) = t.invert(world);
        assert_relative_eq!(row, 7.25, epsilon = 1e-9);
        assert_relative_eq!(col, 3.5, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_transform_is_rejected() {
        assert!(GeoTransform::new([0.0, 1.0, 2.0, 0.0, 2.0, 4.0]).is_err());
        assert!(GeoTransform::north_up(0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_offset() {
        let t = GeoTransform::north_up(0.0, 300.0, 30.0).unwrap();
        let sub = t.offset(2, 3);
        assert_eq!(sub.apply(0.0, 0.0), Coord { x: 90.0, y: 240.0 });
        let (row, col) = sub.invert(Coord { x: 105.0, y: 225.0 });
        assert_relative_eq!(row, 0.5, epsilon = 1e-9);
        assert_relative_eq!(col, 0.5, epsilon = 1e-9);
    }
}
