//! Immutable, format agnostic elevation grids.
//!
//! An [`ElevationGrid`] is a dense row-major raster of elevation
//! samples (meters) georeferenced by an affine [`GeoTransform`] into
//! a single projected world system. Decoding raster files and
//! reprojecting between reference systems happen elsewhere; this
//! crate only answers "what is the ground elevation here?".

mod error;
pub mod projection;
mod transform;

pub use crate::{
    error::DemError,
    projection::{Equirectangular, Projection},
    transform::{CellIndex, GeoTransform},
};
use geo::{
    geometry::{Coord, LineString, Polygon},
    EuclideanDistance, Point,
};
use log::debug;

/// Base floating point type used for all coordinates and calculations.
///
/// Samples are stored as `f32`, which is more precision than any DEM
/// we consume carries, and widened on read.
pub type C = f64;

/// How to sample elevation between cell centers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Value of the cell containing the coordinate.
    Nearest,

    /// Bilinear blend of the four surrounding cell centers.
    ///
    /// Nearest-cell sampling staircases LOS profiles over steep
    /// terrain, so this is the default.
    #[default]
    Bilinear,
}

pub struct ElevationGrid {
    /// Number of columns.
    width: usize,

    /// Number of rows.
    height: usize,

    /// Ground distance covered by one cell edge, in meters.
    cell_size: C,

    /// Maps (row, col) to world coordinates.
    transform: GeoTransform,

    /// Sentinel marking cells without elevation. May be NaN.
    nodata: f32,

    /// Row-major elevation samples.
    samples: Box<[f32]>,
}

impl ElevationGrid {
    pub fn new(
        width: usize,
        height: usize,
        cell_size: C,
        transform: GeoTransform,
        nodata: f32,
        samples: Vec<f32>,
    ) -> Result<Self, DemError> {
        if width == 0 || height == 0 {
            return Err(DemError::InvalidConfiguration(
                "grid dimensions must be non-zero",
            ));
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(DemError::InvalidConfiguration(
                "cell size must be positive",
            ));
        }
        if nodata.is_infinite() {
            return Err(DemError::InvalidConfiguration(
                "no-data sentinel must be finite or NaN",
            ));
        }
        let expected = width
            .checked_mul(height)
            .ok_or(DemError::InvalidConfiguration("grid dimensions overflow"))?;
        if samples.len() != expected {
            return Err(DemError::SampleCount {
                expected,
                actual: samples.len(),
            });
        }
        debug!("grid; {width}x{height}, cell_size: {cell_size}, nodata: {nodata}");
        Ok(Self {
            width,
            height,
            cell_size,
            transform,
            nodata,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Returns a north-up grid with every cell at `elevation`.
    pub fn constant(
        width: usize,
        height: usize,
        cell_size: C,
        origin: Coord<C>,
        elevation: f32,
    ) -> Result<Self, DemError> {
        let transform = GeoTransform::north_up(origin.x, origin.y, cell_size)?;
        let len = width
            .checked_mul(height)
            .ok_or(DemError::InvalidConfiguration("grid dimensions overflow"))?;
        Self::new(
            width,
            height,
            cell_size,
            transform,
            f32::NAN,
            vec![elevation; len],
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of samples in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn cell_size(&self) -> C {
        self.cell_size
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    /// Returns true if `value` marks a missing sample.
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || value == self.nodata
    }

    /// Returns the elevation of cell `(row, col)`.
    pub fn elevation_at(&self, row: usize, col: usize) -> Result<C, DemError> {
        if row >= self.height || col >= self.width {
            #[allow(clippy::cast_possible_wrap)]
            let (row, col) = (row as isize, col as isize);
            return Err(DemError::CellOutOfBounds { row, col });
        }
        let raw = self.samples[row * self.width + col];
        if self.is_nodata(raw) {
            Err(DemError::NoData { row, col })
        } else {
            Ok(C::from(raw))
        }
    }

    /// Returns the elevation at world coordinate `coord`.
    pub fn elevation_at_world(
        &self,
        coord: Coord<C>,
        interpolation: Interpolation,
    ) -> Result<C, DemError> {
        match interpolation {
            Interpolation::Nearest => {
                let CellIndex { row, col, .. } = self.world_to_cell(coord)?;
                self.elevation_at(row, col)
            }
            Interpolation::Bilinear => self.bilinear(coord),
        }
    }

    /// Resolves `coord` to the cell containing it.
    pub fn world_to_cell(&self, coord: Coord<C>) -> Result<CellIndex, DemError> {
        let (row, col) = self.transform.invert(coord);
        #[allow(clippy::cast_precision_loss)]
        let (height, width) = (self.height as C, self.width as C);
        if !(0.0..height).contains(&row) || !(0.0..width).contains(&col) {
            return Err(DemError::OutOfBounds {
                x: coord.x,
                y: coord.y,
            });
        }
        let (row_floor, col_floor) = (row.floor(), col.floor());
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = CellIndex {
            row: row_floor as usize,
            col: col_floor as usize,
            row_frac: row - row_floor,
            col_frac: col - col_floor,
        };
        Ok(index)
    }

    /// Returns the world coordinate of the center of cell `(row, col)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_to_world(&self, row: usize, col: usize) -> Coord<C> {
        self.transform.apply(row as C + 0.5, col as C + 0.5)
    }

    pub fn contains_world(&self, coord: Coord<C>) -> bool {
        self.world_to_cell(coord).is_ok()
    }

    /// Planar distance between two world coordinates.
    ///
    /// Great-circle distance is ignored; over the tens of kilometers a
    /// grid like this covers the difference is well below a cell.
    pub fn distance(a: Coord<C>, b: Coord<C>) -> C {
        Point::from(a).euclidean_distance(&Point::from(b))
    }

    /// Returns the footprint of this grid in world coordinates.
    pub fn extent(&self) -> Polygon<C> {
        #[allow(clippy::cast_precision_loss)]
        let (h, w) = (self.height as C, self.width as C);
        let corners = vec![
            self.transform.apply(0.0, 0.0),
            self.transform.apply(0.0, w),
            self.transform.apply(h, w),
            self.transform.apply(h, 0.0),
            self.transform.apply(0.0, 0.0),
        ];
        Polygon::new(LineString::from(corners), vec![])
    }

    /// Returns the lowest valid elevation, if any cell has data.
    pub fn min_elevation(&self) -> Option<C> {
        self.valid_samples().reduce(C::min)
    }

    /// Returns the highest valid elevation, if any cell has data.
    pub fn max_elevation(&self) -> Option<C> {
        self.valid_samples().reduce(C::max)
    }

    /// Returns an iterator over `self`'s cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Cell<'_>> + '_ {
        (0..self.samples.len()).map(|index| Cell { grid: self, index })
    }
}

/// Private API
impl ElevationGrid {
    fn valid_samples(&self) -> impl Iterator<Item = C> + '_ {
        self.samples
            .iter()
            .filter(|raw| !self.is_nodata(**raw))
            .map(|raw| C::from(*raw))
    }

    /// Bilinear interpolation anchored on cell centers.
    ///
    /// Inside the half-cell border along the grid's edge the nearest
    /// edge centers are used, so every in-extent coordinate resolves.
    fn bilinear(&self, coord: Coord<C>) -> Result<C, DemError> {
        // Fail on out-of-extent coordinates before shifting to centers.
        self.world_to_cell(coord)?;
        let (row, col) = self.transform.invert(coord);
        #[allow(clippy::cast_precision_loss)]
        let (max_row, max_col) = ((self.height - 1) as C, (self.width - 1) as C);
        let v = (row - 0.5).clamp(0.0, max_row);
        let u = (col - 0.5).clamp(0.0, max_col);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (r0, c0) = (v.floor() as usize, u.floor() as usize);
        let r1 = (r0 + 1).min(self.height - 1);
        let c1 = (c0 + 1).min(self.width - 1);
        #[allow(clippy::cast_precision_loss)]
        let (fr, fc) = (v - r0 as C, u - c0 as C);

        let corners = [
            (r0, c0, (1.0 - fr) * (1.0 - fc)),
            (r0, c1, (1.0 - fr) * fc),
            (r1, c0, fr * (1.0 - fc)),
            (r1, c1, fr * fc),
        ];
        let mut elevation = 0.0;
        for (r, c, weight) in corners {
            if weight > 0.0 {
                elevation += weight * self.elevation_at(r, c)?;
            }
        }
        Ok(elevation)
    }
}

/// A single grid cell.
pub struct Cell<'a> {
    /// The parent [ElevationGrid] this cell belongs to.
    grid: &'a ElevationGrid,
    /// Index into parent's elevation data corresponding to this cell.
    index: usize,
}

impl<'a> Cell<'a> {
    pub fn row(&self) -> usize {
        self.index / self.grid.width
    }

    pub fn col(&self) -> usize {
        self.index % self.grid.width
    }

    pub fn elevation(&self) -> Result<C, DemError> {
        self.grid.elevation_at(self.row(), self.col())
    }

    /// World coordinate of this cell's center.
    pub fn center(&self) -> Coord<C> {
        self.grid.cell_to_world(self.row(), self.col())
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, DemError, ElevationGrid, GeoTransform, Interpolation};
    use approx::assert_relative_eq;

    const NODATA: f32 = -9999.0;

    /// 5x5 grid, 30m cells, NW corner at world (0, 150).
    ///
    /// Center is a 100m peak, ringed by 50m cells, with a no-data
    /// cell in the SE corner.
    fn peak_grid() -> ElevationGrid {
        #[rustfmt::skip]
        let samples = vec![
            0.0,  0.0,   0.0,  0.0, 0.0,
            0.0, 50.0,  50.0, 50.0, 0.0,
            0.0, 50.0, 100.0, 50.0, 0.0,
            0.0, 50.0,  50.0, 50.0, 0.0,
            0.0,  0.0,   0.0,  0.0, NODATA,
        ];
        let transform = GeoTransform::north_up(0.0, 150.0, 30.0).unwrap();
        ElevationGrid::new(5, 5, 30.0, transform, NODATA, samples).unwrap()
    }

    #[test]
    fn test_construction_is_validated() {
        let t = GeoTransform::north_up(0.0, 0.0, 30.0).unwrap();
        assert!(matches!(
            ElevationGrid::new(0, 5, 30.0, t, NODATA, vec![]),
            Err(DemError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            ElevationGrid::new(2, 2, -30.0, t, NODATA, vec![0.0; 4]),
            Err(DemError::InvalidConfiguration(_))
        ));
        assert_eq!(
            ElevationGrid::new(2, 2, 30.0, t, NODATA, vec![0.0; 3]).err(),
            Some(DemError::SampleCount {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_dimensions_overflow() {
        let t = GeoTransform::north_up(0.0, 0.0, 30.0).unwrap();
        assert_eq!(
            ElevationGrid::new(usize::MAX, 2, 30.0, t, NODATA, vec![0.0; 2]).err(),
            Some(DemError::InvalidConfiguration("grid dimensions overflow"))
        );
        let origin = Coord { x: 0.0, y: 0.0 };
        assert_eq!(
            ElevationGrid::constant(2, usize::MAX, 30.0, origin, 0.0).err(),
            Some(DemError::InvalidConfiguration("grid dimensions overflow"))
        );
    }

    #[test]
    fn test_elevation_at_index() {
        let grid = peak_grid();
        assert_eq!(grid.elevation_at(2, 2), Ok(100.0));
        assert_eq!(grid.elevation_at(4, 4), Err(DemError::NoData { row: 4, col: 4 }));
        assert!(grid.elevation_at(5, 0).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_cell_center_roundtrip() {
        let grid = peak_grid();
        let center = grid.cell_to_world(2, 3);
        assert_eq!(center, Coord { x: 105.0, y: 75.0 });
        let idx = grid.world_to_cell(center).unwrap();
        assert_eq!((idx.row, idx.col), (2, 3));
        assert_relative_eq!(idx.row_frac, 0.5);
        assert_relative_eq!(idx.col_frac, 0.5);
    }

    #[test]
    fn test_out_of_extent_is_not_zero() {
        let grid = peak_grid();
        for coord in [
            Coord { x: -0.1, y: 75.0 },
            Coord { x: 150.1, y: 75.0 },
            Coord { x: 75.0, y: 150.1 },
            Coord { x: 75.0, y: -0.1 },
        ] {
            for interpolation in [Interpolation::Nearest, Interpolation::Bilinear] {
                assert_eq!(
                    grid.elevation_at_world(coord, interpolation),
                    Err(DemError::OutOfBounds {
                        x: coord.x,
                        y: coord.y
                    })
                );
            }
        }
    }

    #[test]
    fn test_nearest() {
        let grid = peak_grid();
        // Just inside the peak cell's NW corner.
        let coord = Coord { x: 60.1, y: 89.9 };
        assert_eq!(
            grid.elevation_at_world(coord, Interpolation::Nearest),
            Ok(100.0)
        );
    }

    #[test]
    fn test_bilinear_between_centers() {
        let grid = peak_grid();
        // Halfway between the center of (1, 2) and (2, 2).
        let coord = Coord { x: 75.0, y: 90.0 };
        let elev = grid
            .elevation_at_world(coord, Interpolation::Bilinear)
            .unwrap();
        assert_relative_eq!(elev, 75.0, epsilon = 1e-9);

        // Exactly on a center reproduces the cell value.
        let elev = grid
            .elevation_at_world(grid.cell_to_world(2, 2), Interpolation::Bilinear)
            .unwrap();
        assert_relative_eq!(elev, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bilinear_edge_clamps() {
        let grid = peak_grid();
        // Within the half-cell border, NW corner of the grid.
        let elev = grid
            .elevation_at_world(Coord { x: 1.0, y: 149.0 }, Interpolation::Bilinear)
            .unwrap();
        assert_relative_eq!(elev, 0.0);
    }

    #[test]
    fn test_bilinear_touching_nodata() {
        let grid = peak_grid();
        // Between (3, 3) and (4, 4), blends the no-data corner.
        let coord = Coord { x: 120.0, y: 30.0 };
        assert_eq!(
            grid.elevation_at_world(coord, Interpolation::Bilinear),
            Err(DemError::NoData { row: 4, col: 4 })
        );
        // The center of (3, 3) gives the no-data cell zero weight.
        let coord = grid.cell_to_world(3, 3);
        assert_eq!(
            grid.elevation_at_world(coord, Interpolation::Bilinear),
            Ok(50.0)
        );
    }

    #[test]
    fn test_min_max_skip_nodata() {
        let grid = peak_grid();
        assert_eq!(grid.min_elevation(), Some(0.0));
        assert_eq!(grid.max_elevation(), Some(100.0));
    }

    #[test]
    fn test_iter_cells() {
        let grid = peak_grid();
        assert_eq!(grid.iter().count(), grid.len());
        let peak = grid.iter().nth(12).unwrap();
        assert_eq!((peak.row(), peak.col()), (2, 2));
        assert_eq!(peak.elevation(), Ok(100.0));
        assert_eq!(peak.center(), Coord { x: 75.0, y: 75.0 });
    }

    #[test]
    fn test_nan_sentinel() {
        let grid =
            ElevationGrid::constant(3, 3, 30.0, Coord { x: 0.0, y: 90.0 }, 12.5).unwrap();
        assert!(grid.nodata().is_nan());
        assert_eq!(grid.elevation_at(1, 1), Ok(12.5));
        assert!(grid.is_nodata(f32::NAN));
    }
}
