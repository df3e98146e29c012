use crate::ViewshedError;
use dem::{ElevationGrid, GeoTransform};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A rectangular block of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// First row, in grid coordinates.
    pub row: usize,

    /// First column, in grid coordinates.
    pub col: usize,

    /// Number of rows.
    pub height: usize,

    /// Number of columns.
    pub width: usize,
}

impl Window {
    pub fn new(row: usize, col: usize, height: usize, width: usize) -> Self {
        Self {
            row,
            col,
            height,
            width,
        }
    }

    /// Every cell of `grid`.
    pub fn full(grid: &ElevationGrid) -> Self {
        Self::new(0, 0, grid.height(), grid.width())
    }

    /// Fails unless `self` is non-empty and lies inside `grid`.
    pub fn validate(&self, grid: &ElevationGrid) -> Result<(), ViewshedError> {
        let (end_row, end_col) = self.end()?;
        let fits = end_row <= grid.height() && end_col <= grid.width();
        if !fits {
            return Err(ViewshedError::InvalidConfiguration(
                "window extends past the grid",
            ));
        }
        Ok(())
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    /// Returns true if grid cell `(row, col)` is inside `self`.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row.checked_sub(self.row).is_some_and(|dr| dr < self.height)
            && col.checked_sub(self.col).is_some_and(|dc| dc < self.width)
    }

    /// One past the last `(row, col)`, for a non-empty window whose
    /// bounds and cell count fit in `usize`.
    fn end(&self) -> Result<(usize, usize), ViewshedError> {
        if self.height == 0 || self.width == 0 {
            return Err(ViewshedError::InvalidConfiguration(
                "window dimensions must be non-zero",
            ));
        }
        self.row
            .checked_add(self.height)
            .zip(self.col.checked_add(self.width))
            .filter(|_| self.height.checked_mul(self.width).is_some())
            .ok_or(ViewshedError::InvalidConfiguration(
                "window bounds overflow",
            ))
    }
}

/// Parses "row,col,height,width".
impl FromStr for Window {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split(',')
            .map(|field| usize::from_str(field.trim()).map_err(|e| format!("{field:?}: {e}")))
            .collect::<Result<Vec<usize>, _>>()?;
        match fields[..] {
            [row, col, height, width] => Ok(Self::new(row, col, height, width)),
            _ => Err(format!("not a valid row,col,height,width: {s:?}")),
        }
    }
}

/// Visibility of a single cell from the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Visibility {
    NotVisible = 0,
    Visible = 1,
    /// No elevation at the cell, or the only obstruction on the way to
    /// it was missing data.
    NoData = 255,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Self::Visible
    }

    pub fn is_no_data(self) -> bool {
        self == Self::NoData
    }
}

impl From<Visibility> for u8 {
    fn from(visibility: Visibility) -> u8 {
        visibility as u8
    }
}

/// Cell counts by [`Visibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub visible_cells: usize,
    pub not_visible_cells: usize,
    pub no_data_cells: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.visible_cells + self.not_visible_cells + self.no_data_cells
    }

    /// Visible share of the cells with data.
    #[allow(clippy::cast_precision_loss)]
    pub fn visible_fraction(&self) -> Option<f64> {
        let with_data = self.visible_cells + self.not_visible_cells;
        (with_data > 0).then(|| self.visible_cells as f64 / with_data as f64)
    }
}

impl<'a> FromIterator<&'a Visibility> for Summary {
    fn from_iter<I: IntoIterator<Item = &'a Visibility>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |mut summary, visibility| {
                match visibility {
                    Visibility::Visible => summary.visible_cells += 1,
                    Visibility::NotVisible => summary.not_visible_cells += 1,
                    Visibility::NoData => summary.no_data_cells += 1,
                }
                summary
            })
    }
}

/// Row-major visibility of a window of an [`ElevationGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewshedRaster {
    window: Window,

    /// Maps window-relative `(row, col)` to world coordinates.
    transform: GeoTransform,

    cells: Vec<Visibility>,
}

impl ViewshedRaster {
    /// Returns a raster over `window` of a grid georeferenced by
    /// `grid_transform`.
    pub fn new(
        window: Window,
        grid_transform: &GeoTransform,
        cells: Vec<Visibility>,
    ) -> Result<Self, ViewshedError> {
        window.end()?;
        if cells.len() != window.len() {
            return Err(ViewshedError::InvalidConfiguration(
                "cell count does not match window",
            ));
        }
        Ok(Self {
            window,
            transform: grid_transform.offset(window.row, window.col),
            cells,
        })
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn width(&self) -> usize {
        self.window.width
    }

    pub fn height(&self) -> usize {
        self.window.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn cells(&self) -> &[Visibility] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Visibility] {
        &mut self.cells
    }

    /// Visibility at window-relative `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<Visibility> {
        if row < self.height() && col < self.width() {
            Some(self.cells[row * self.width() + col])
        } else {
            None
        }
    }

    /// Visibility at grid cell `(row, col)`.
    pub fn get_grid(&self, row: usize, col: usize) -> Option<Visibility> {
        if self.window.contains(row, col) {
            self.get(row - self.window.row, col - self.window.col)
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Visibility]> + '_ {
        self.cells.chunks(self.width())
    }

    pub fn summary(&self) -> Summary {
        self.cells.iter().collect()
    }
}
