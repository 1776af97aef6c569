use std::f64::consts::PI;

use tracing::warn;

use crate::error::AppError;
use crate::geo::lerp;
use crate::models::coordinate::Coordinate;
use crate::models::route::Route;

pub const DEFAULT_WAYPOINTS: usize = 8;
pub const DEFAULT_JITTER_DEGREES: f64 = 0.0005;

/// Builds straight-line routes with a small deterministic lateral wobble.
#[derive(Debug, Clone)]
pub struct RouteSynthesizer {
    waypoint_count: usize,
    jitter_scale: f64,
}

impl Default for RouteSynthesizer {
    fn default() -> Self {
        Self {
            waypoint_count: DEFAULT_WAYPOINTS,
            jitter_scale: DEFAULT_JITTER_DEGREES,
        }
    }
}

impl RouteSynthesizer {
    pub fn new(waypoint_count: usize, jitter_scale: f64) -> Result<Self, AppError> {
        if waypoint_count < 1 {
            return Err(AppError::Config(
                "route waypoint count must be at least 1".to_string(),
            ));
        }

        if !jitter_scale.is_finite() {
            return Err(AppError::Config(format!(
                "route jitter {jitter_scale} is not finite"
            )));
        }

        Ok(Self {
            waypoint_count,
            jitter_scale,
        })
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoint_count
    }

    /// Returns `waypoint_count + 2` points, starting at `start` and ending at `end` exactly.
    ///
    /// Callers are expected to separate coincident endpoints beforehand (see
    /// `checkout::separate_destination`); this function never alters its inputs.
    pub fn synthesize(&self, start: &Coordinate, end: &Coordinate) -> Route {
        let n = self.waypoint_count;
        let mut points = Vec::with_capacity(n + 2);
        points.push(*start);

        for i in 1..=n {
            let fraction = i as f64 / (n + 1) as f64;
            let base = lerp(start, end, fraction);
            let jitter = self.jitter_scale * (i as f64 * PI).sin();

            points.push(Coordinate {
                lat: base.lat + jitter,
                lng: base.lng + jitter * 2.0,
            });
        }

        points.push(*end);
        Route::synthesized(points)
    }

    /// Prefers a collaborator-supplied path, falling back to synthesis when it is
    /// absent or does not connect `origin` to `destination`.
    pub fn plan(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        external: Option<Vec<Coordinate>>,
    ) -> Route {
        match external {
            Some(points) => match Route::external(points, origin, destination) {
                Ok(route) => route,
                Err(err) => {
                    warn!(error = %err, "external route rejected; synthesizing");
                    self.synthesize(origin, destination)
                }
            },
            None => self.synthesize(origin, destination),
        }
    }
}

/// One-off synthesis with an explicit waypoint count.
pub fn synthesize(
    start: &Coordinate,
    end: &Coordinate,
    waypoint_count: usize,
) -> Result<Route, AppError> {
    let synthesizer = RouteSynthesizer::new(waypoint_count, DEFAULT_JITTER_DEGREES)?;
    Ok(synthesizer.synthesize(start, end))
}

#[cfg(test)]
mod tests {
    use super::{synthesize, RouteSynthesizer};
    use crate::geo::distance_km;
    use crate::models::coordinate::Coordinate;
    use crate::models::route::RouteSource;

    fn delhi() -> Coordinate {
        Coordinate {
            lat: 28.6139,
            lng: 77.2090,
        }
    }

    fn north_west() -> Coordinate {
        Coordinate {
            lat: 28.70,
            lng: 77.10,
        }
    }

    #[test]
    fn route_has_waypoints_plus_endpoints() {
        let synthesizer = RouteSynthesizer::new(5, 0.0005).unwrap();
        let route = synthesizer.synthesize(&delhi(), &north_west());

        assert_eq!(route.len(), 7);
        assert_eq!(route.first(), delhi());
        assert_eq!(route.last(), north_west());
        assert_eq!(route.source(), RouteSource::Synthesized);
    }

    #[test]
    fn default_route_has_ten_points() {
        let route = RouteSynthesizer::default().synthesize(&delhi(), &north_west());
        assert_eq!(route.len(), 10);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let synthesizer = RouteSynthesizer::default();
        let first = synthesizer.synthesize(&delhi(), &north_west());
        let second = synthesizer.synthesize(&delhi(), &north_west());
        assert_eq!(first, second);
    }

    #[test]
    fn interior_points_advance_toward_destination() {
        let route = RouteSynthesizer::default().synthesize(&delhi(), &north_west());
        let distances: Vec<f64> = route
            .points()
            .iter()
            .map(|p| distance_km(p, &north_west()))
            .collect();

        assert!(distances.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn zero_waypoints_is_a_configuration_error() {
        assert!(RouteSynthesizer::new(0, 0.0005).is_err());
        assert!(synthesize(&delhi(), &north_west(), 0).is_err());
    }

    #[test]
    fn single_waypoint_sits_at_midpoint() {
        let route = synthesize(&delhi(), &north_west(), 1).unwrap();
        let mid = route.points()[1];

        assert_eq!(route.len(), 3);
        assert!((mid.lat - (28.6139 + 28.70) / 2.0).abs() < 1e-9);
        assert!((mid.lng - (77.2090 + 77.10) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn plan_prefers_valid_external_route() {
        let synthesizer = RouteSynthesizer::default();
        let mid = Coordinate {
            lat: 28.66,
            lng: 77.16,
        };
        let route = synthesizer.plan(&delhi(), &north_west(), Some(vec![delhi(), mid, north_west()]));

        assert_eq!(route.source(), RouteSource::External);
        assert_eq!(route.len(), 3);
    }

    #[test]
    fn plan_falls_back_when_external_route_is_broken() {
        let synthesizer = RouteSynthesizer::default();
        let route = synthesizer.plan(&delhi(), &north_west(), Some(vec![delhi()]));

        assert_eq!(route.source(), RouteSource::Synthesized);
        assert_eq!(route.len(), 10);
    }
}
