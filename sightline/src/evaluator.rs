//! Decides whether terrain obstructs a sampled sightline.
//!
//! Earth curvature and refraction are applied by raising each terrain
//! sample by `d (D - d) / (2 R_eff)` and comparing against the
//! straight, uncorrected sightline. A sample blocks when
//!
//! ```text
//! excess = terrain(d) + correction(d) - sightline(d)
//! ```
//!
//! is positive (beyond tolerance), or, under [`TieBreak::Inclusive`],
//! when it is within tolerance of zero.

use crate::{
    config::{LosConfig, NoDataPolicy, TieBreak},
    math::{curvature_correction, effective_radius},
    Sightline, SightlineSample,
};
use dem::{DemError, ElevationGrid, Interpolation, C};
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};

/// Why a sightline is obstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cause {
    /// Terrain rises above the sightline.
    Terrain,

    /// A sample fell on a cell without elevation data.
    NoData,

    /// A sample fell outside the grid.
    OutOfBounds,
}

impl From<DemError> for Cause {
    fn from(err: DemError) -> Self {
        if err.is_out_of_bounds() {
            Self::OutOfBounds
        } else {
            Self::NoData
        }
    }
}

/// The obstructing sample nearest the start of a sightline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstruction {
    /// Meters from the start of the sightline.
    pub distance_m: C,

    /// World position of the obstructing sample.
    pub position: Coord<C>,

    pub cause: Cause,

    /// Terrain elevation, when there is one.
    pub terrain_m: Option<C>,

    /// How far corrected terrain rises above the sightline.
    pub excess_m: Option<C>,
}

/// Outcome of evaluating one sightline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LosResult {
    pub visible: bool,

    /// Set iff `visible` is false.
    pub obstruction: Option<Obstruction>,

    /// Samples lacking elevation that were skipped under
    /// [`NoDataPolicy::TreatAsVisible`], up to the obstruction if any.
    pub indeterminate_samples: usize,
}

impl LosResult {
    fn clear(indeterminate_samples: usize) -> Self {
        Self {
            visible: true,
            obstruction: None,
            indeterminate_samples,
        }
    }

    fn blocked(obstruction: Obstruction, indeterminate_samples: usize) -> Self {
        Self {
            visible: false,
            obstruction: Some(obstruction),
            indeterminate_samples,
        }
    }
}

/// Classification of a single sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleClass {
    Clear { excess_m: C },
    Blocked { excess_m: C },
    Indeterminate(DemError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluator {
    /// `None` disables the curvature correction.
    effective_radius_m: Option<C>,
    tolerance_m: C,
    tie_break: TieBreak,
    no_data_policy: NoDataPolicy,
    interpolation: Interpolation,
}

impl Evaluator {
    /// Returns an evaluator for `config`, which should already be
    /// validated.
    pub fn new(config: &LosConfig) -> Self {
        let effective_radius_m = if config.earth_curvature {
            effective_radius(config.earth_radius_meters, config.refraction_coefficient)
        } else {
            None
        };
        Self {
            effective_radius_m,
            tolerance_m: config.tolerance_meters,
            tie_break: config.tie_break,
            no_data_policy: config.no_data_policy,
            interpolation: config.interpolation,
        }
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Apparent terrain rise `d` meters along a `total` meter path.
    pub fn correction(&self, d: C, total: C) -> C {
        self.effective_radius_m
            .map_or(0.0, |r_eff| curvature_correction(d, total, r_eff))
    }

    pub fn classify(&self, sample: &SightlineSample, total: C) -> SampleClass {
        match sample.terrain_m {
            Err(err) => SampleClass::Indeterminate(err),
            Ok(terrain_m) => {
                let excess_m =
                    terrain_m + self.correction(sample.distance_m, total) - sample.sightline_m;
                let blocks = match self.tie_break {
                    TieBreak::Strict => excess_m > self.tolerance_m,
                    TieBreak::Inclusive => excess_m >= -self.tolerance_m,
                };
                if blocks {
                    SampleClass::Blocked { excess_m }
                } else {
                    SampleClass::Clear { excess_m }
                }
            }
        }
    }

    /// Evaluates the samples of a `total` meter sightline, ordered
    /// from its start. The first and last samples are the endpoints
    /// and never block.
    ///
    /// Stops at the first blocking sample.
    pub fn evaluate<I>(&self, total: C, samples: I) -> LosResult
    where
        I: IntoIterator<Item = SightlineSample>,
        I::IntoIter: ExactSizeIterator,
    {
        let samples = samples.into_iter();
        let interior = samples.len().saturating_sub(2);
        let mut indeterminate_samples = 0;

        for sample in samples.skip(1).take(interior) {
            let obstruction = match self.classify(&sample, total) {
                SampleClass::Clear { .. } => continue,
                SampleClass::Blocked { excess_m } => Obstruction {
                    distance_m: sample.distance_m,
                    position: sample.position,
                    cause: Cause::Terrain,
                    terrain_m: sample.terrain_m.ok(),
                    excess_m: Some(excess_m),
                },
                SampleClass::Indeterminate(err) => match self.no_data_policy {
                    NoDataPolicy::TreatAsVisible => {
                        indeterminate_samples += 1;
                        continue;
                    }
                    NoDataPolicy::TreatAsBlocking => Obstruction {
                        distance_m: sample.distance_m,
                        position: sample.position,
                        cause: Cause::from(err),
                        terrain_m: None,
                        excess_m: None,
                    },
                },
            };
            return LosResult::blocked(obstruction, indeterminate_samples);
        }

        LosResult::clear(indeterminate_samples)
    }

    /// Samples `line` over `grid` and evaluates it.
    pub fn evaluate_sightline(&self, line: &Sightline, grid: &ElevationGrid) -> LosResult {
        self.evaluate(line.distance_m(), line.samples(grid, self.interpolation))
    }
}
