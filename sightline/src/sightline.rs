//! Straight sightlines between two points over a grid.

use crate::{math::linspace, SightlineError};
use dem::{DemError, ElevationGrid, Interpolation, C};
use geo::geometry::Coord;

/// A straight path between two eye positions.
///
/// Ground positions are interpolated linearly in the grid's world
/// system; distances are planar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sightline {
    start: Coord<C>,

    end: Coord<C>,

    /// Eye elevation above datum at `start` (terrain + height).
    start_eye_m: C,

    /// Eye elevation above datum at `end` (terrain + height).
    end_eye_m: C,

    /// Ground distance from `start` to `end`.
    distance_m: C,

    /// Number of steps between `start` and `end`.
    intervals: usize,
}

/// One step along a [`Sightline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightlineSample {
    /// Meters from the start of the sightline.
    pub distance_m: C,

    /// World position of this sample.
    pub position: Coord<C>,

    /// Terrain elevation, or why there isn't one.
    pub terrain_m: Result<C, DemError>,

    /// Uncorrected straight-line sightline elevation.
    pub sightline_m: C,
}

impl Sightline {
    /// Returns a sightline sampled no more than `max_step_m` apart.
    pub fn new(
        start: Coord<C>,
        start_eye_m: C,
        end: Coord<C>,
        end_eye_m: C,
        max_step_m: C,
    ) -> Result<Self, SightlineError> {
        if !(max_step_m.is_finite() && max_step_m > 0.0) {
            return Err(SightlineError::InvalidConfiguration(
                "sample step must be positive",
            ));
        }
        let distance_m = ElevationGrid::distance(start, end);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let intervals = (distance_m / max_step_m).ceil() as usize;
        Ok(Self {
            start,
            end,
            start_eye_m,
            end_eye_m,
            distance_m,
            intervals,
        })
    }

    pub fn start(&self) -> Coord<C> {
        self.start
    }

    pub fn end(&self) -> Coord<C> {
        self.end
    }

    pub fn start_eye_m(&self) -> C {
        self.start_eye_m
    }

    pub fn end_eye_m(&self) -> C {
        self.end_eye_m
    }

    pub fn distance_m(&self) -> C {
        self.distance_m
    }

    /// Number of samples, both endpoints included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.intervals + 1
    }

    /// Returns true if start and end coincide.
    pub fn is_degenerate(&self) -> bool {
        self.intervals == 0
    }

    /// Actual distance between consecutive samples.
    #[allow(clippy::cast_precision_loss)]
    pub fn step_m(&self) -> C {
        if self.is_degenerate() {
            0.0
        } else {
            self.distance_m / self.intervals as C
        }
    }

    /// Straight-line eye elevation `d` meters from the start.
    pub fn sightline_at(&self, d: C) -> C {
        if self.is_degenerate() {
            self.start_eye_m
        } else {
            self.start_eye_m + (self.end_eye_m - self.start_eye_m) * d / self.distance_m
        }
    }

    /// Returns `(distance, position)` for every sample, in increasing
    /// distance. The iterator is lazy and can be cloned to restart.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = (C, Coord<C>)> + Clone {
        let Self {
            start,
            end,
            distance_m,
            ..
        } = *self;
        let last = self.intervals;
        linspace(0.0, 1.0, self.len())
            .enumerate()
            .map(move |(idx, fraction)| match idx {
                0 => (0.0, start),
                idx if idx == last => (distance_m, end),
                _ => (
                    distance_m * fraction,
                    Coord {
                        x: start.x + (end.x - start.x) * fraction,
                        y: start.y + (end.y - start.y) * fraction,
                    },
                ),
            })
    }

    /// Looks up terrain for every sample, lazily.
    pub fn samples<'a>(
        &'a self,
        grid: &'a ElevationGrid,
        interpolation: Interpolation,
    ) -> impl ExactSizeIterator<Item = SightlineSample> + Clone + 'a {
        self.positions()
            .map(move |(distance_m, position)| SightlineSample {
                distance_m,
                position,
                terrain_m: grid.elevation_at_world(position, interpolation),
                sightline_m: self.sightline_at(distance_m),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, Sightline};
    use approx::assert_relative_eq;
    use dem::{ElevationGrid, Interpolation};

    #[test]
    fn test_sample_count() {
        let start = Coord { x: 0.0, y: 0.0 };
        // 100m at 30m steps, ceil(3.33) + 1.
        let line = Sightline::new(start, 0.0, Coord { x: 100.0, y: 0.0 }, 0.0, 30.0).unwrap();
        assert_eq!(line.len(), 5);
        assert_eq!(line.positions().len(), 5);
        assert_relative_eq!(line.step_m(), 25.0);
        // Exact multiple.
        let line = Sightline::new(start, 0.0, Coord { x: 90.0, y: 0.0 }, 0.0, 30.0).unwrap();
        assert_eq!(line.len(), 4);
    }

    #[test]
    fn test_positions_are_inclusive_and_increasing() {
        let start = Coord { x: 10.0, y: 20.0 };
        let end = Coord { x: 40.0, y: 60.0 };
        let line = Sightline::new(start, 5.0, end, 15.0, 10.0).unwrap();
        let positions: Vec<_> = line.positions().collect();
        assert_eq!(positions.len(), 6);
        assert_eq!(positions.first(), Some(&(0.0, start)));
        assert_eq!(positions.last(), Some(&(50.0, end)));
        assert!(positions.windows(2).all(|w| w[0].0 < w[1].0));
        assert_relative_eq!(positions[2].1.x, 22.0, epsilon = 1e-9);
        assert_relative_eq!(positions[2].1.y, 36.0, epsilon = 1e-9);
        assert_relative_eq!(line.sightline_at(25.0), 10.0);
    }

    #[test]
    fn test_restartable() {
        let line = Sightline::new(
            Coord { x: 0.0, y: 0.0 },
            0.0,
            Coord { x: 0.0, y: 95.0 },
            0.0,
            30.0,
        )
        .unwrap();
        let positions = line.positions();
        let first: Vec<_> = positions.clone().collect();
        let second: Vec<_> = positions.collect();
        assert_eq!(first, second);
        assert_eq!(first, line.positions().collect::<Vec<_>>());
    }

    #[test]
    fn test_degenerate() {
        let here = Coord { x: 3.0, y: 4.0 };
        let line = Sightline::new(here, 2.0, here, 2.0, 30.0).unwrap();
        assert!(line.is_degenerate());
        assert_eq!(line.positions().collect::<Vec<_>>(), vec![(0.0, here)]);
        assert_eq!(line.sightline_at(0.0), 2.0);
    }

    #[test]
    fn test_invalid_step() {
        let here = Coord { x: 0.0, y: 0.0 };
        assert!(Sightline::new(here, 0.0, here, 0.0, 0.0).is_err());
        assert!(Sightline::new(here, 0.0, here, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_samples_look_up_terrain() {
        let grid = ElevationGrid::constant(10, 10, 30.0, Coord { x: 0.0, y: 300.0 }, 12.0).unwrap();
        let line = Sightline::new(
            grid.cell_to_world(5, 0),
            13.7,
            grid.cell_to_world(5, 9),
            13.7,
            30.0,
        )
        .unwrap();
        let samples: Vec<_> = line.samples(&grid, Interpolation::Bilinear).collect();
        assert_eq!(samples.len(), 10);
        for sample in samples {
            assert_relative_eq!(sample.terrain_m.unwrap(), 12.0, epsilon = 1e-9);
            assert_relative_eq!(sample.sightline_m, 13.7);
        }
    }
}
