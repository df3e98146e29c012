use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DemError {
    #[error("world coordinate ({x}, {y}) is outside the grid extent")]
    OutOfBounds { x: f64, y: f64 },

    #[error("cell (row {row}, col {col}) is outside the grid")]
    CellOutOfBounds { row: isize, col: isize },

    #[error("no elevation data at cell (row {row}, col {col})")]
    NoData { row: usize, col: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    #[error("expected {expected} elevation samples, got {actual}")]
    SampleCount { expected: usize, actual: usize },
}

impl DemError {
    /// Returns true if this error came from a position outside the
    /// grid, as opposed to a position inside it lacking data.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. } | Self::CellOutOfBounds { .. })
    }
}
