use crate::{constants::DEFAULT_EYE_HEIGHT_M, SightlineError};
use dem::C;
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A geographic position with a height above ground.
///
/// Used for both observers and targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude, degrees.
    pub lat: C,

    /// Longitude, degrees.
    pub lon: C,

    /// Height above ground, in meters.
    #[serde(default = "default_height")]
    pub height: C,
}

fn default_height() -> C {
    DEFAULT_EYE_HEIGHT_M
}

impl GeoPoint {
    /// Returns a point at eye level above the ground at `(lat, lon)`.
    pub fn new(lat: C, lon: C) -> Self {
        Self {
            lat,
            lon,
            height: DEFAULT_EYE_HEIGHT_M,
        }
    }

    #[must_use]
    pub fn with_height(mut self, meters: C) -> Self {
        self.height = meters;
        self
    }

    /// Fails unless every field is finite.
    pub fn validate(&self) -> Result<(), SightlineError> {
        if !(self.lat.is_finite() && self.lon.is_finite()) {
            return Err(SightlineError::InvalidConfiguration(
                "position must be finite",
            ));
        }
        if !self.height.is_finite() {
            return Err(SightlineError::InvalidConfiguration(
                "height must be finite",
            ));
        }
        Ok(())
    }

    /// Returns this point's ground position as `x` = lon, `y` = lat.
    pub fn coord(&self) -> Coord<C> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// Parses "lat,lon" or "lat,lon,height".
impl FromStr for GeoPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split(',')
            .map(|field| C::from_str(field.trim()).map_err(|e| format!("{field:?}: {e}")))
            .collect::<Result<Vec<C>, _>>()?;
        let point = match fields[..] {
            [lat, lon] => Self::new(lat, lon),
            [lat, lon, height] => Self::new(lat, lon).with_height(height),
            _ => return Err(format!("not a valid lat,lon[,height]: {s:?}")),
        };
        point.validate().map_err(|e| format!("{s:?}: {e}"))?;
        Ok(point)
    }
}
