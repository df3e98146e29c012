//! Seam between geographic (lat/lon) positions and the grid's
//! projected world system.
//!
//! Real geodetic reprojection is the job of an external collaborator
//! implementing [`Projection`]. [`Equirectangular`] is a local
//! approximation, adequate for study areas tens of kilometers across.

use crate::C;
use geo::geometry::Coord;

/// Meters per degree of latitude.
pub const METERS_PER_DEGREE: C = 111_320.0;

/// Converts between geographic coordinates (`x` = longitude, `y` =
/// latitude, degrees) and the grid's world coordinates (meters).
pub trait Projection {
    fn to_world(&self, geographic: Coord<C>) -> Coord<C>;

    fn to_geographic(&self, world: Coord<C>) -> Coord<C>;
}

impl<P: Projection + ?Sized> Projection for &P {
    fn to_world(&self, geographic: Coord<C>) -> Coord<C> {
        (**self).to_world(geographic)
    }

    fn to_geographic(&self, world: Coord<C>) -> Coord<C> {
        (**self).to_geographic(world)
    }
}

/// Equirectangular projection anchored at a reference point, which
/// maps to world `(0, 0)`. `x` grows east, `y` grows north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equirectangular {
    ref_lat: C,
    ref_lon: C,
    /// Cached cos(ref_lat) for longitude scaling.
    cos_ref_lat: C,
}

impl Equirectangular {
    pub fn new(ref_lat: C, ref_lon: C) -> Self {
        Self {
            ref_lat,
            ref_lon,
            cos_ref_lat: ref_lat.to_radians().cos(),
        }
    }

    pub fn ref_lat(&self) -> C {
        self.ref_lat
    }

    pub fn ref_lon(&self) -> C {
        self.ref_lon
    }
}

impl Projection for Equirectangular {
    fn to_world(&self, Coord { x: lon, y: lat }: Coord<C>) -> Coord<C> {
        Coord {
            x: (lon - self.ref_lon) * METERS_PER_DEGREE * self.cos_ref_lat,
            y: (lat - self.ref_lat) * METERS_PER_DEGREE,
        }
    }

    fn to_geographic(&self, Coord { x, y }: Coord<C>) -> Coord<C> {
        Coord {
            x: self.ref_lon + x / (METERS_PER_DEGREE * self.cos_ref_lat),
            y: self.ref_lat + y / METERS_PER_DEGREE,
        }
    }
}
