use crate::{
    constants::{DEFAULT_TOLERANCE_M, MEAN_EARTH_RADIUS, STANDARD_REFRACTION},
    SightlineError,
};
use dem::{Interpolation, C};
use serde::{Deserialize, Serialize};

/// What a sample without elevation data does to a sightline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoDataPolicy {
    /// Missing data is assumed to obstruct.
    #[default]
    TreatAsBlocking,

    /// Missing data is skipped.
    TreatAsVisible,
}

/// How terrain lying exactly on the sightline is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TieBreak {
    /// Terrain must rise above the sightline to block it.
    #[default]
    Strict,

    /// Terrain touching the sightline blocks it.
    Inclusive,
}

/// Line of sight parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LosConfig {
    /// Distance between sightline samples, meters. Defaults to the
    /// grid's cell size.
    pub sample_step_meters: Option<C>,

    /// Atmospheric refraction coefficient `k`. The earth appears to
    /// have radius `R / (1 - k)`; `k == 1` removes the correction.
    pub refraction_coefficient: C,

    pub earth_radius_meters: C,

    /// Apply the earth curvature and refraction correction.
    pub earth_curvature: bool,

    pub no_data_policy: NoDataPolicy,

    pub tie_break: TieBreak,

    /// Slack absorbing floating point noise at grazing angles.
    pub tolerance_meters: C,

    pub interpolation: Interpolation,
}

impl Default for LosConfig {
    fn default() -> Self {
        Self {
            sample_step_meters: None,
            refraction_coefficient: STANDARD_REFRACTION,
            earth_radius_meters: MEAN_EARTH_RADIUS,
            earth_curvature: true,
            no_data_policy: NoDataPolicy::default(),
            tie_break: TieBreak::default(),
            tolerance_meters: DEFAULT_TOLERANCE_M,
            interpolation: Interpolation::default(),
        }
    }
}

impl LosConfig {
    /// Checks every parameter, failing before any work starts.
    pub fn validate(&self) -> Result<(), SightlineError> {
        if let Some(step) = self.sample_step_meters {
            if !(step.is_finite() && step > 0.0) {
                return Err(SightlineError::InvalidConfiguration(
                    "sample step must be positive",
                ));
            }
        }
        if !(self.earth_radius_meters.is_finite() && self.earth_radius_meters > 0.0) {
            return Err(SightlineError::InvalidConfiguration(
                "earth radius must be positive",
            ));
        }
        if !self.refraction_coefficient.is_finite() || self.refraction_coefficient > 1.0 {
            return Err(SightlineError::InvalidConfiguration(
                "refraction coefficient must not exceed 1",
            ));
        }
        if !(self.tolerance_meters.is_finite() && self.tolerance_meters >= 0.0) {
            return Err(SightlineError::InvalidConfiguration(
                "tolerance must be non-negative",
            ));
        }
        Ok(())
    }

    /// Returns the configured step, or `cell_size` when unset.
    pub fn step_m(&self, cell_size: C) -> C {
        self.sample_step_meters.unwrap_or(cell_size)
    }

    /// Returns a copy with the earth curvature correction removed.
    #[must_use]
    pub fn flat_earth(mut self) -> Self {
        self.earth_curvature = false;
        self
    }
}
