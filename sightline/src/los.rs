use crate::{Evaluator, GeoPoint, LosConfig, LosResult, Profile, SightlineError};
use dem::{ElevationGrid, Projection, C};
use geo::geometry::Coord;
use log::debug;

/// Line of sight between two geographic points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLos {
    pub result: LosResult,

    pub profile: Profile,

    /// Obstruction location as `x` = lon, `y` = lat.
    pub obstruction_geographic: Option<Coord<C>>,
}

impl PointLos {
    pub fn visible(&self) -> bool {
        self.result.visible
    }

    pub fn observer(&self) -> GeoPoint {
        self.profile.observer
    }

    pub fn target(&self) -> GeoPoint {
        self.profile.target
    }

    pub fn distance_m(&self) -> C {
        self.profile.distance_m()
    }

    /// Smallest margin between the sightline and corrected terrain
    /// over interior samples with data. Negative when terrain rises
    /// above the sightline. `None` for paths without such samples.
    pub fn clearance_m(&self) -> Option<C> {
        let Profile {
            samples,
            curvature_m,
            ..
        } = &self.profile;
        let interior = samples.len().saturating_sub(2);
        samples
            .iter()
            .zip(curvature_m)
            .skip(1)
            .take(interior)
            .filter_map(|(sample, curve)| {
                sample
                    .terrain_m
                    .ok()
                    .map(|terrain| sample.sightline_m - (terrain + curve))
            })
            .reduce(C::min)
    }
}

/// Determines whether `target` is visible from `observer` over
/// `grid`.
///
/// ```
/// use sightline::{dem::{ElevationGrid, Equirectangular}, geo::Coord, line_of_sight, GeoPoint, LosConfig};
///
/// let grid = ElevationGrid::constant(10, 10, 30.0, Coord { x: -150.0, y: 150.0 }, 0.0).unwrap();
/// let projection = Equirectangular::new(0.0, 0.0);
/// let here = GeoPoint::new(0.0, 0.0);
/// let los = line_of_sight(&grid, projection, here, here, &LosConfig::default()).unwrap();
/// assert!(los.visible());
/// assert_eq!(los.distance_m(), 0.0);
/// ```
pub fn line_of_sight<P: Projection>(
    grid: &ElevationGrid,
    projection: P,
    observer: GeoPoint,
    target: GeoPoint,
    config: &LosConfig,
) -> Result<PointLos, SightlineError> {
    let profile = Profile::builder()
        .observer(observer)
        .target(target)
        .config(*config)
        .build(grid, &projection)?;

    let result = Evaluator::new(config).evaluate(
        profile.distance_m(),
        profile.samples.iter().copied(),
    );
    let obstruction_geographic = result
        .obstruction
        .map(|obstruction| projection.to_geographic(obstruction.position));

    debug!(
        "los; visible: {}, distance: {:.1}, obstruction: {:?}",
        result.visible,
        profile.distance_m(),
        result.obstruction.map(|o| o.distance_m)
    );

    Ok(PointLos {
        result,
        profile,
        obstruction_geographic,
    })
}
