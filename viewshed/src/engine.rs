use crate::{ViewshedError, ViewshedRaster, Visibility, Window};
use dem::{CellIndex, ElevationGrid, Projection, C};
use geo::geometry::Coord;
use log::{debug, info, warn};
use rayon::prelude::*;
use sightline::{Cause, Evaluator, GeoPoint, LosConfig, Sightline};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

/// Cells visible from a single observer.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewshed {
    pub observer: GeoPoint,

    /// Grid cell under the observer.
    pub observer_cell: (usize, usize),

    pub raster: ViewshedRaster,

    /// Cells whose outcome depended on a sample without elevation.
    pub indeterminate_cells: usize,
}

impl Viewshed {
    pub fn builder<'a>() -> ViewshedBuilder<'a> {
        ViewshedBuilder {
            observer: None,
            window: None,
            target_height_m: 0.0,
            config: LosConfig::default(),
            cancel: None,
            on_row: None,
        }
    }
}

pub struct ViewshedBuilder<'a> {
    /// Observer position and eye height (required).
    observer: Option<GeoPoint>,

    /// Cells to evaluate (defaults to the whole grid).
    window: Option<Window>,

    /// Height above ground of every target cell (meters, defaults
    /// to 0).
    target_height_m: C,

    config: LosConfig,

    /// Checked before each row.
    cancel: Option<Arc<AtomicBool>>,

    /// Called from worker threads as each row completes.
    on_row: Option<Box<dyn Fn() + Send + Sync + 'a>>,
}

/// Observer state shared by every cell evaluation.
struct Origin {
    world: Coord<C>,
    eye_m: C,
    cell: CellIndex,
}

impl<'a> ViewshedBuilder<'a> {
    /// Observer position and eye height (required).
    #[must_use]
    pub fn observer(mut self, point: GeoPoint) -> Self {
        self.observer = Some(point);
        self
    }

    /// Cells to evaluate (defaults to the whole grid).
    #[must_use]
    pub fn window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// Height above ground of every target cell (meters, defaults
    /// to 0).
    #[must_use]
    pub fn target_height(mut self, meters: C) -> Self {
        self.target_height_m = meters;
        self
    }

    #[must_use]
    pub fn config(mut self, config: LosConfig) -> Self {
        self.config = config;
        self
    }

    /// Abandon the computation once `flag` is set.
    #[must_use]
    pub fn cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Called, possibly concurrently, each time a row completes.
    #[must_use]
    pub fn on_row<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'a,
    {
        self.on_row = Some(Box::new(callback));
        self
    }

    /// Evaluates line of sight from the observer to the center of
    /// every cell in the window.
    ///
    /// Every parameter is checked before any cell is evaluated. A
    /// cancelled build returns [`ViewshedError::Cancelled`] and
    /// discards its partial raster.
    pub fn build<P: Projection>(
        &self,
        grid: &ElevationGrid,
        projection: P,
    ) -> Result<Viewshed, ViewshedError> {
        let observer = self.observer.ok_or(ViewshedError::Builder("observer"))?;
        observer.validate()?;
        self.config.validate()?;
        if !self.target_height_m.is_finite() {
            return Err(ViewshedError::InvalidConfiguration(
                "target height must be finite",
            ));
        }
        let window = self.window.unwrap_or_else(|| Window::full(grid));
        window.validate(grid)?;

        let origin = Self::origin(grid, &projection, observer, self.config)?;
        let evaluator = Evaluator::new(&self.config);
        let step_m = self.config.step_m(grid.cell_size());
        let indeterminate = AtomicUsize::new(0);

        let now = std::time::Instant::now();
        let mut cells = vec![Visibility::NoData; window.len()];
        cells
            .par_chunks_mut(window.width)
            .enumerate()
            .try_for_each(|(offset, row_cells)| {
                if self.is_cancelled() {
                    return Err(ViewshedError::Cancelled);
                }
                let row = window.row + offset;
                let mut row_indeterminate = 0;
                for (col_offset, cell) in row_cells.iter_mut().enumerate() {
                    let col = window.col + col_offset;
                    let (visibility, missing_data) =
                        self.cell(grid, &evaluator, &origin, step_m, row, col)?;
                    *cell = visibility;
                    row_indeterminate += usize::from(missing_data);
                }
                indeterminate.fetch_add(row_indeterminate, Ordering::Relaxed);
                if let Some(on_row) = &self.on_row {
                    on_row();
                }
                Ok(())
            })?;
        let runtime = now.elapsed();

        let raster = ViewshedRaster::new(window, grid.transform(), cells)?;
        let summary = raster.summary();
        let indeterminate_cells = indeterminate.into_inner();
        info!(
            "viewshed; {}x{}, visible: {}, not_visible: {}, no_data: {}, exec: {:?}",
            window.width,
            window.height,
            summary.visible_cells,
            summary.not_visible_cells,
            summary.no_data_cells,
            runtime
        );
        if indeterminate_cells > 0 {
            warn!(
                "viewshed; {indeterminate_cells} cells depend on missing elevation ({:?})",
                self.config.no_data_policy
            );
        }

        Ok(Viewshed {
            observer,
            observer_cell: (origin.cell.row, origin.cell.col),
            raster,
            indeterminate_cells,
        })
    }
}

/// Private API
impl<'a> ViewshedBuilder<'a> {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn origin<P: Projection>(
        grid: &ElevationGrid,
        projection: &P,
        observer: GeoPoint,
        config: LosConfig,
    ) -> Result<Origin, ViewshedError> {
        let out_of_grid = |source| ViewshedError::ObserverOutOfGrid {
            lat: observer.lat,
            lon: observer.lon,
            source,
        };
        let world = projection.to_world(observer.coord());
        let cell = grid.world_to_cell(world).map_err(out_of_grid)?;
        let ground_m = grid
            .elevation_at_world(world, config.interpolation)
            .map_err(out_of_grid)?;
        debug!(
            "viewshed; observer cell: ({}, {}), ground: {ground_m:.1}",
            cell.row, cell.col
        );
        Ok(Origin {
            world,
            eye_m: ground_m + observer.height,
            cell,
        })
    }

    /// Returns the visibility of grid cell `(row, col)` and whether it
    /// depended on missing elevation.
    fn cell(
        &self,
        grid: &ElevationGrid,
        evaluator: &Evaluator,
        origin: &Origin,
        step_m: C,
        row: usize,
        col: usize,
    ) -> Result<(Visibility, bool), ViewshedError> {
        if (row, col) == (origin.cell.row, origin.cell.col) {
            return Ok((Visibility::Visible, false));
        }
        let Ok(ground_m) = grid.elevation_at(row, col) else {
            return Ok((Visibility::NoData, false));
        };
        let line = Sightline::new(
            origin.world,
            origin.eye_m,
            grid.cell_to_world(row, col),
            ground_m + self.target_height_m,
            step_m,
        )?;
        let result = evaluator.evaluate_sightline(&line, grid);
        let outcome = match result.obstruction {
            None => (Visibility::Visible, result.indeterminate_samples > 0),
            Some(obstruction) if obstruction.cause == Cause::Terrain => {
                (Visibility::NotVisible, result.indeterminate_samples > 0)
            }
            Some(_) => (Visibility::NoData, true),
        };
        Ok(outcome)
    }
}
