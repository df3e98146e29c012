use dem::DemError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SightlineError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    #[error("{0}")]
    Dem(#[from] DemError),
}
