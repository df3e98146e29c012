//! Serializable outcomes.
//!
//! These are plain views of already computed results; building one
//! never touches the grid.

use crate::{DenoiseReport, Summary, Viewshed, Window};
use dem::C;
use serde::{Deserialize, Serialize};
use sightline::{Cause, GeoPoint, PointLos};

/// Cell value marking no-data in [`ViewshedReport::cells`].
pub const NO_DATA_VALUE: u8 = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointLosReport {
    pub observer: GeoPoint,
    pub target: GeoPoint,
    pub visible: bool,
    pub distance_meters: C,
    pub obstruction: Option<ObstructionReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstructionReport {
    pub distance_meters: C,
    pub lat: C,
    pub lon: C,
    pub cause: Cause,
}

impl From<&PointLos> for PointLosReport {
    fn from(los: &PointLos) -> Self {
        let obstruction = los.result.obstruction.zip(los.obstruction_geographic).map(
            |(obstruction, location)| ObstructionReport {
                distance_meters: obstruction.distance_m,
                lat: location.y,
                lon: location.x,
                cause: obstruction.cause,
            },
        );
        Self {
            observer: los.observer(),
            target: los.target(),
            visible: los.visible(),
            distance_meters: los.distance_m(),
            obstruction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewshedReport {
    pub observer: GeoPoint,
    pub window: Window,
    pub width: usize,
    pub height: usize,
    /// Affine transform of the window, GDAL order.
    pub transform: [C; 6],
    pub no_data_value: u8,
    /// Row-major; 1 visible, 0 not visible, [`NO_DATA_VALUE`] no-data.
    pub cells: Vec<u8>,
    pub summary: Summary,
    pub indeterminate_cells: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denoise: Option<DenoiseReport>,
}

impl ViewshedReport {
    pub fn new(viewshed: &Viewshed, denoise: Option<DenoiseReport>) -> Self {
        let raster = &viewshed.raster;
        Self {
            observer: viewshed.observer,
            window: raster.window(),
            width: raster.width(),
            height: raster.height(),
            transform: raster.transform().coefficients(),
            no_data_value: NO_DATA_VALUE,
            cells: raster.cells().iter().copied().map(u8::from).collect(),
            summary: raster.summary(),
            indeterminate_cells: viewshed.indeterminate_cells,
            denoise,
        }
    }
}

impl From<&Viewshed> for ViewshedReport {
    fn from(viewshed: &Viewshed) -> Self {
        Self::new(viewshed, None)
    }
}
