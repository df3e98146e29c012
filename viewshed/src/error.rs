use dem::{DemError, C};
use sightline::SightlineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewshedError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    #[error("viewshed cancelled")]
    Cancelled,

    #[error("observer at ({lat}, {lon}) has no ground elevation: {source}")]
    ObserverOutOfGrid { lat: C, lon: C, source: DemError },

    #[error("{0}")]
    Sightline(#[from] SightlineError),

    #[error("{0}")]
    Dem(#[from] DemError),
}
