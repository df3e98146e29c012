//! Morphological cleanup of viewshed rasters.
//!
//! Per-cell sampling leaves isolated cells and short streaks whose
//! visibility flips against their neighbourhood. A pass smooths the
//! raster with a majority vote and then closes it with a 3x3
//! structuring element. Passes repeat until the raster stops changing,
//! so denoising an already denoised raster is a no-op.
//!
//! No-data cells never change and never vote. Cells outside the raster
//! or without data are ignored by dilation and satisfy erosion, which
//! keeps closing from shrinking the visible area.

use crate::{ViewshedError, ViewshedRaster, Visibility};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Upper bound on smoothing passes.
pub const MAX_PASSES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    /// Side of the square majority window, in cells. Odd; 1 disables
    /// smoothing.
    #[serde(rename = "denoiseWindowSize", alias = "windowSize")]
    pub window_size: usize,

    /// Dilations, then as many erosions, per closing. 0 disables
    /// closing.
    #[serde(rename = "denoiseIterations", alias = "iterations")]
    pub iterations: usize,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            window_size: 3,
            iterations: 1,
        }
    }
}

impl DenoiseConfig {
    pub fn validate(&self) -> Result<(), ViewshedError> {
        if self.window_size % 2 == 0 {
            return Err(ViewshedError::InvalidConfiguration(
                "denoise window size must be odd",
            ));
        }
        Ok(())
    }
}

/// What denoising did to a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenoiseReport {
    /// Cells whose state differs from the input.
    pub changed_cells: usize,
    pub visible_before: usize,
    pub visible_after: usize,
    pub not_visible_after: usize,
    /// Passes run, including the final one that changed nothing.
    pub passes: usize,
    /// False if [`MAX_PASSES`] ran out before the raster settled, in
    /// which case denoising again may still change it.
    pub converged: bool,
}

impl ViewshedRaster {
    /// Smooths and closes `self` in place.
    pub fn denoise(&mut self, config: &DenoiseConfig) -> Result<DenoiseReport, ViewshedError> {
        config.validate()?;
        let visible_before = self.summary().visible_cells;
        let input = self.cells().to_vec();
        let mut filter = Filter::new(self.width(), self.height());

        let (passes, converged) = filter.run(self.cells_mut(), config, MAX_PASSES);
        if !converged {
            warn!("denoise; raster still changing after {passes} passes");
        }

        let after = self.summary();
        let report = DenoiseReport {
            changed_cells: input
                .iter()
                .zip(self.cells())
                .filter(|(before, after)| before != after)
                .count(),
            visible_before,
            visible_after: after.visible_cells,
            not_visible_after: after.not_visible_cells,
            passes,
            converged,
        };
        info!(
            "denoise; changed: {}, visible: {} -> {}, passes: {}",
            report.changed_cells, report.visible_before, report.visible_after, report.passes
        );
        Ok(report)
    }
}

struct Filter {
    width: usize,
    height: usize,
    /// Cell states at the start of the current step.
    snapshot: Vec<Visibility>,
}

impl Filter {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            snapshot: Vec::with_capacity(width * height),
        }
    }

    /// Runs passes until one changes nothing or `max_passes` have run.
    /// Returns the passes run and whether the raster settled.
    fn run(
        &mut self,
        cells: &mut [Visibility],
        config: &DenoiseConfig,
        max_passes: usize,
    ) -> (usize, bool) {
        for passes in 1..=max_passes {
            if !self.pass(cells, config) {
                return (passes, true);
            }
        }
        (max_passes, false)
    }

    /// Runs one smoothing pass, returning true if any cell changed.
    fn pass(&mut self, cells: &mut [Visibility], config: &DenoiseConfig) -> bool {
        let start = cells.to_vec();
        self.majority(cells, config.window_size / 2);
        self.close(cells, config.iterations);
        start != cells
    }

    fn close(&mut self, cells: &mut [Visibility], iterations: usize) {
        for _ in 0..iterations {
            self.spread(cells, Visibility::NotVisible, Visibility::Visible);
        }
        for _ in 0..iterations {
            self.spread(cells, Visibility::Visible, Visibility::NotVisible);
        }
    }

    /// Majority vote over the `(2 radius + 1)` square around each cell
    /// with data. Ties keep the current state.
    fn majority(&mut self, cells: &mut [Visibility], radius: usize) {
        if radius == 0 {
            return;
        }
        self.take_snapshot(cells);
        for (idx, cell) in cells.iter_mut().enumerate() {
            if cell.is_no_data() {
                continue;
            }
            let (mut visible, mut not_visible) = (0_usize, 0_usize);
            for neighbor in self.neighbors(idx, radius) {
                match self.snapshot[neighbor] {
                    Visibility::Visible => visible += 1,
                    Visibility::NotVisible => not_visible += 1,
                    Visibility::NoData => (),
                }
            }
            *cell = match visible.cmp(&not_visible) {
                Ordering::Greater => Visibility::Visible,
                Ordering::Less => Visibility::NotVisible,
                Ordering::Equal => *cell,
            };
        }
    }

    /// Turns every `from` cell with an 8-connected `to` neighbor into
    /// `to`. Dilation spreads visible cells, erosion spreads not
    /// visible ones.
    fn spread(&mut self, cells: &mut [Visibility], from: Visibility, to: Visibility) {
        self.take_snapshot(cells);
        for (idx, cell) in cells.iter_mut().enumerate() {
            if *cell == from && self.neighbors(idx, 1).any(|n| self.snapshot[n] == to) {
                *cell = to;
            }
        }
    }

    fn take_snapshot(&mut self, cells: &[Visibility]) {
        self.snapshot.clear();
        self.snapshot.extend_from_slice(cells);
    }

    /// Indices of the in-bounds cells within `radius` of `idx`,
    /// `idx` included.
    fn neighbors(&self, idx: usize, radius: usize) -> impl Iterator<Item = usize> {
        let width = self.width;
        let (row, col) = (idx / width, idx % width);
        let rows = row.saturating_sub(radius)..=(row + radius).min(self.height - 1);
        let cols = col.saturating_sub(radius)..=(col + radius).min(width - 1);
        rows.flat_map(move |r| cols.clone().map(move |c| r * width + c))
    }
}

#[cfg(test)]
mod tests {
    use super::{DenoiseConfig, Filter};
    use crate::{ViewshedRaster, Visibility, Window};
    use dem::GeoTransform;

    /// Parses rows of `#` (visible), `.` (not visible) and `?` (no
    /// data).
    fn raster(rows: &[&str]) -> ViewshedRaster {
        let cells: Vec<Visibility> = rows
            .iter()
            .flat_map(|row| row.chars())
            .map(|c| match c {
                '#' => Visibility::Visible,
                '.' => Visibility::NotVisible,
                _ => Visibility::NoData,
            })
            .collect();
        let window = Window::new(0, 0, rows.len(), rows[0].len());
        let transform = GeoTransform::north_up(0.0, 0.0, 30.0).unwrap();
        ViewshedRaster::new(window, &transform, cells).unwrap()
    }

    fn render(raster: &ViewshedRaster) -> Vec<String> {
        raster
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Visibility::Visible => '#',
                        Visibility::NotVisible => '.',
                        Visibility::NoData => '?',
                    })
                    .collect()
            })
            .collect()
    }

    /// Deterministic noisy raster: roughly 2/3 visible, 1/17 no-data.
    fn noise(size: usize) -> ViewshedRaster {
        let mut state: u64 = 7;
        let cells = (0..size * size)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                match state >> 33 {
                    v if v % 17 == 0 => Visibility::NoData,
                    v if v % 3 == 0 => Visibility::NotVisible,
                    _ => Visibility::Visible,
                }
            })
            .collect();
        let transform = GeoTransform::north_up(0.0, 0.0, 30.0).unwrap();
        ViewshedRaster::new(Window::new(0, 0, size, size), &transform, cells).unwrap()
    }

    #[test]
    fn test_removes_isolated_cells() {
        let mut hole = raster(&["#####", "#####", "##.##", "#####", "#####"]);
        let report = hole.denoise(&DenoiseConfig::default()).unwrap();
        assert_eq!(hole.summary().visible_cells, 25);
        assert_eq!(report.changed_cells, 1);
        assert_eq!(report.visible_before, 24);
        assert_eq!(report.visible_after, 25);
        assert_eq!(report.not_visible_after, 0);
        assert_eq!(report.passes, 2);
        assert!(report.converged);

        let mut speck = raster(&[".....", ".....", "..#..", ".....", "....."]);
        speck.denoise(&DenoiseConfig::default()).unwrap();
        assert_eq!(speck.summary().visible_cells, 0);
    }

    #[test]
    fn test_pass_limit_reports_unsettled() {
        let config = DenoiseConfig::default();
        let mut hole = raster(&["#####", "#####", "##.##", "#####", "#####"]);
        let mut filter = Filter::new(hole.width(), hole.height());
        assert_eq!(filter.run(hole.cells_mut(), &config, 1), (1, false));
        assert_eq!(filter.run(hole.cells_mut(), &config, 1), (1, true));

        let mut hole = raster(&["#####", "#####", "##.##", "#####", "#####"]);
        assert_eq!(filter.run(hole.cells_mut(), &config, 0), (0, false));
        assert_eq!(hole.summary().visible_cells, 24);
    }

    #[test]
    fn test_preserves_silhouette() {
        let mut rect = raster(&[
            "............",
            "............",
            "............",
            "..########..",
            "..########..",
            "..########..",
            "..########..",
            "..########..",
            "..########..",
            "............",
            "............",
            "............",
        ]);
        let report = rect.denoise(&DenoiseConfig::default()).unwrap();
        // Only the corners are rounded off.
        assert_eq!(report.changed_cells, 4);
        assert_eq!(
            render(&rect),
            [
                "............",
                "............",
                "............",
                "...######...",
                "..########..",
                "..########..",
                "..########..",
                "..########..",
                "...######...",
                "............",
                "............",
                "............",
            ]
        );
    }

    #[test]
    fn test_no_data_untouched() {
        let mut raster = raster(&["#?###", "#####", "??.??", "#####", "###?#"]);
        let no_data: Vec<usize> = raster
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_no_data())
            .map(|(idx, _)| idx)
            .collect();
        let report = raster.denoise(&DenoiseConfig::default()).unwrap();
        let after: Vec<usize> = raster
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_no_data())
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(no_data, after);
        assert_eq!(report.changed_cells, 1);
        assert_eq!(raster.summary().no_data_cells, 6);
    }

    #[test]
    fn test_idempotent() {
        let mut once = noise(24);
        let first = once.denoise(&DenoiseConfig::default()).unwrap();
        assert!(first.changed_cells > 0);

        let mut twice = once.clone();
        let second = twice.denoise(&DenoiseConfig::default()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(second.changed_cells, 0);
        assert_eq!(second.passes, 1);
        assert_eq!(second.visible_before, second.visible_after);
    }

    #[test]
    fn test_report_counts() {
        let mut raster = noise(16);
        let input = raster.clone();
        let before = input.summary();
        let report = raster.denoise(&DenoiseConfig::default()).unwrap();
        let after = raster.summary();

        assert_eq!(report.visible_before, before.visible_cells);
        assert_eq!(report.visible_after, after.visible_cells);
        assert_eq!(report.not_visible_after, after.not_visible_cells);
        assert_eq!(after.no_data_cells, before.no_data_cells);
        assert_eq!(
            report.visible_after + report.not_visible_after + after.no_data_cells,
            256
        );
        let changed = input
            .cells()
            .iter()
            .zip(raster.cells())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(report.changed_cells, changed);
    }

    #[test]
    fn test_disabled() {
        let mut raster = noise(10);
        let input = raster.clone();
        let report = raster
            .denoise(&DenoiseConfig {
                window_size: 1,
                iterations: 0,
            })
            .unwrap();
        assert_eq!(raster, input);
        assert_eq!(report.changed_cells, 0);
        assert_eq!(report.passes, 1);
    }

    #[test]
    fn test_tie_keeps_state() {
        let mut pair = raster(&["#."]);
        pair.denoise(&DenoiseConfig {
            window_size: 3,
            iterations: 0,
        })
        .unwrap();
        assert_eq!(render(&pair), ["#."]);
    }

    #[test]
    fn test_closing_fills_gaps() {
        let ring = raster(&[
            ".......",
            ".......",
            "..###..",
            "..#.#..",
            "..###..",
            ".......",
            ".......",
        ]);
        let mut cells = ring.cells().to_vec();
        Filter::new(7, 7).close(&mut cells, 1);
        // Closing only ever adds visible cells.
        assert!(ring
            .cells()
            .iter()
            .zip(&cells)
            .all(|(before, after)| !before.is_visible() || after.is_visible()));
        let closed = ViewshedRaster::new(ring.window(), ring.transform(), cells).unwrap();
        assert_eq!(
            render(&closed),
            [
                ".......",
                ".......",
                "..###..",
                "..###..",
                "..###..",
                ".......",
                ".......",
            ]
        );
    }

    #[test]
    fn test_invalid_window() {
        let mut raster = noise(4);
        for window_size in [0, 2, 4] {
            let config = DenoiseConfig {
                window_size,
                iterations: 1,
            };
            assert!(raster.denoise(&config).is_err());
        }
    }

    #[test]
    fn test_config_json() {
        let config: DenoiseConfig = serde_json::from_str(r#"{"denoiseIterations": 2}"#).unwrap();
        assert_eq!(config.window_size, 3);
        assert_eq!(config.iterations, 2);
    }
}
