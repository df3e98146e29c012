use anyhow::{Context, Error as AnyError};
use log::info;
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};
use viewshed::dem::{ElevationGrid, Equirectangular, GeoTransform};

/// An elevation grid serialized as JSON.
///
/// ```json
/// {
///   "width": 3, "height": 2, "cellSize": 30,
///   "transform": [-45, 30, 0, 30, 0, -30],
///   "noData": -9999,
///   "origin": {"lat": 46.5, "lon": 7.5},
///   "elevations": [1, 2, 3, 4, 5, 6]
/// }
/// ```
///
/// `transform` maps grid indices into a local equirectangular system
/// centered on `origin`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridFile {
    pub width: usize,
    pub height: usize,
    pub cell_size: f64,
    pub transform: [f64; 6],
    /// Absent when missing cells are stored as `null`.
    pub no_data: Option<f32>,
    pub origin: Origin,
    /// Row-major; `null` marks a missing cell.
    pub elevations: Vec<Option<f32>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Origin {
    pub lat: f64,
    pub lon: f64,
}

impl GridFile {
    pub fn load(path: &Path) -> Result<Self, AnyError> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let grid: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        info!(
            "loaded {}; {}x{}, cell_size: {}",
            path.display(),
            grid.width,
            grid.height,
            grid.cell_size
        );
        Ok(grid)
    }

    pub fn into_grid(self) -> Result<(ElevationGrid, Equirectangular), AnyError> {
        let nodata = self.no_data.unwrap_or(f32::NAN);
        let samples = self
            .elevations
            .into_iter()
            .map(|elevation| elevation.unwrap_or(nodata))
            .collect();
        let transform = GeoTransform::new(self.transform)?;
        let grid = ElevationGrid::new(
            self.width,
            self.height,
            self.cell_size,
            transform,
            nodata,
            samples,
        )?;
        Ok((grid, Equirectangular::new(self.origin.lat, self.origin.lon)))
    }
}
