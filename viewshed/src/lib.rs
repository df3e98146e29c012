//! # Viewsheds
//!
//! `viewshed` computes which cells of an elevation grid are visible
//! from a single observer, cleans sampling noise from the result and
//! formats point and area outcomes for output.
//!
//! ```
//! use viewshed::{dem::{ElevationGrid, Equirectangular}, geo::Coord, sightline::GeoPoint, Viewshed};
//!
//! let grid = ElevationGrid::constant(20, 20, 30.0, Coord { x: -300.0, y: 300.0 }, 0.0).unwrap();
//! let viewshed = Viewshed::builder()
//!     .observer(GeoPoint::new(0.0, 0.0))
//!     .build(&grid, Equirectangular::new(0.0, 0.0))
//!     .unwrap();
//! assert_eq!(viewshed.raster.summary().visible_cells, 400);
//! ```

mod config;
pub mod denoise;
mod engine;
mod error;
mod raster;
pub mod report;

pub use {
    crate::{
        config::Config,
        denoise::{DenoiseConfig, DenoiseReport},
        engine::{Viewshed, ViewshedBuilder},
        error::ViewshedError,
        raster::{Summary, ViewshedRaster, Visibility, Window},
        report::{PointLosReport, ViewshedReport},
    },
    dem, geo, sightline,
};
