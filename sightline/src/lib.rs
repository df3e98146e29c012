//! # Terrain line of sight
//!
//! `sightline` decides whether two points can see each other over an
//! [`ElevationGrid`](dem::ElevationGrid), correcting for earth
//! curvature and atmospheric refraction.

mod config;
pub mod constants;
mod error;
mod evaluator;
mod geopoint;
mod los;
pub mod math;
mod profile;
mod sightline;

pub use {
    crate::{
        config::{LosConfig, NoDataPolicy, TieBreak},
        error::SightlineError,
        evaluator::{Cause, Evaluator, LosResult, Obstruction, SampleClass},
        geopoint::GeoPoint,
        los::{line_of_sight, PointLos},
        profile::{Profile, ProfileBuilder},
        sightline::{Sightline, SightlineSample},
    },
    dem, geo,
};
