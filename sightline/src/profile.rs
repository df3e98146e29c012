use crate::{Evaluator, GeoPoint, LosConfig, Sightline, SightlineError, SightlineSample};
use dem::{ElevationGrid, Projection, C};
use log::debug;

/// A sampled sightline between two geographic points.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub observer: GeoPoint,

    pub target: GeoPoint,

    pub sightline: Sightline,

    /// Every sample from observer to target, both included.
    pub samples: Vec<SightlineSample>,

    /// Curvature correction at each sample, meters.
    pub curvature_m: Vec<C>,
}

impl Profile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder {
            observer: None,
            target: None,
            config: LosConfig::default(),
        }
    }

    /// Ground distance from observer to target, meters.
    pub fn distance_m(&self) -> C {
        self.sightline.distance_m()
    }

    /// Returns `(distance, terrain + correction)` for samples with
    /// elevation data.
    pub fn corrected_terrain(&self) -> impl Iterator<Item = (C, C)> + '_ {
        self.samples
            .iter()
            .zip(&self.curvature_m)
            .filter_map(|(sample, curve)| {
                sample
                    .terrain_m
                    .ok()
                    .map(|terrain| (sample.distance_m, terrain + curve))
            })
    }
}

pub struct ProfileBuilder {
    observer: Option<GeoPoint>,

    target: Option<GeoPoint>,

    config: LosConfig,
}

impl ProfileBuilder {
    #[must_use]
    pub fn observer(mut self, point: GeoPoint) -> Self {
        self.observer = Some(point);
        self
    }

    #[must_use]
    pub fn target(mut self, point: GeoPoint) -> Self {
        self.target = Some(point);
        self
    }

    #[must_use]
    pub fn config(mut self, config: LosConfig) -> Self {
        self.config = config;
        self
    }

    /// Samples terrain between observer and target.
    ///
    /// Fails if either endpoint lacks elevation data, since its eye
    /// height would be undefined.
    pub fn build<P: Projection>(
        &self,
        grid: &ElevationGrid,
        projection: P,
    ) -> Result<Profile, SightlineError> {
        let observer = self.observer.ok_or(SightlineError::Builder("observer"))?;
        let target = self.target.ok_or(SightlineError::Builder("target"))?;
        observer.validate()?;
        target.validate()?;
        self.config.validate()?;

        let interpolation = self.config.interpolation;
        let start = projection.to_world(observer.coord());
        let end = projection.to_world(target.coord());
        let start_eye_m = grid.elevation_at_world(start, interpolation)? + observer.height;
        let end_eye_m = grid.elevation_at_world(end, interpolation)? + target.height;

        let sightline = Sightline::new(
            start,
            start_eye_m,
            end,
            end_eye_m,
            self.config.step_m(grid.cell_size()),
        )?;

        let (samples, terrain_runtime) = {
            let now = std::time::Instant::now();
            let samples: Vec<SightlineSample> = sightline.samples(grid, interpolation).collect();
            (samples, now.elapsed())
        };

        let evaluator = Evaluator::new(&self.config);
        let curvature_m = samples
            .iter()
            .map(|sample| evaluator.correction(sample.distance_m, sightline.distance_m()))
            .collect();

        debug!(
            "profile; len: {}, distance: {:.1}, terrain_exec: {:?}",
            samples.len(),
            sightline.distance_m(),
            terrain_runtime
        );

        Ok(Profile {
            observer,
            target,
            sightline,
            samples,
            curvature_m,
        })
    }
}
