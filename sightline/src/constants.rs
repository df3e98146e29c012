/// Mean earth radius in meters.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_000.0;

/// Standard atmospheric refraction coefficient.
pub const STANDARD_REFRACTION: f64 = 0.13;

/// Default observer and target height above ground, in meters.
pub const DEFAULT_EYE_HEIGHT_M: f64 = 1.7;

/// Default slack, in meters, before terrain is considered above or
/// on the sightline.
pub const DEFAULT_TOLERANCE_M: f64 = 1e-6;
