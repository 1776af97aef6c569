use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::geo::path_length_km;
use crate::models::order::OrderStatus;
use crate::models::route::{Route, RouteSource};

pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 50.0;
pub const DEFAULT_MIN_ROUTE_MINUTES: f64 = 15.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Eta {
    pub minutes: i64,
    pub label: String,
}

impl Eta {
    fn delivered() -> Self {
        Self {
            minutes: 0,
            label: "Delivered".to_string(),
        }
    }

    fn from_minutes(minutes: i64) -> Self {
        let minutes = minutes.max(0);
        let label = if minutes == 0 {
            "Arriving soon".to_string()
        } else {
            format!("{minutes} min")
        };
        Self { minutes, label }
    }
}

#[derive(Debug, Clone)]
pub struct EtaEstimator {
    average_speed_kmh: f64,
    minimum_route_minutes: f64,
}

impl Default for EtaEstimator {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            minimum_route_minutes: DEFAULT_MIN_ROUTE_MINUTES,
        }
    }
}

impl EtaEstimator {
    pub fn new(average_speed_kmh: f64, minimum_route_minutes: f64) -> Result<Self, AppError> {
        if !(average_speed_kmh.is_finite() && average_speed_kmh > 0.0) {
            return Err(AppError::Config(format!(
                "average speed must be positive, got {average_speed_kmh}"
            )));
        }

        if !(minimum_route_minutes.is_finite() && minimum_route_minutes >= 0.0) {
            return Err(AppError::Config(format!(
                "minimum route eta must be non-negative, got {minimum_route_minutes}"
            )));
        }

        Ok(Self {
            average_speed_kmh,
            minimum_route_minutes,
        })
    }

    /// Remaining time for display. Distance-based only for collaborator-supplied routes.
    pub fn remaining(
        &self,
        placed_at: DateTime<Utc>,
        estimated_completion: DateTime<Utc>,
        now: DateTime<Utc>,
        status: OrderStatus,
        route: Option<&Route>,
    ) -> Eta {
        if status == OrderStatus::Delivered {
            return Eta::delivered();
        }

        match route {
            Some(route) if route.source() == RouteSource::External => {
                self.remaining_by_distance(route, placed_at, now)
            }
            _ => Eta::from_minutes(round_minutes(estimated_completion - now)),
        }
    }

    fn remaining_by_distance(&self, route: &Route, placed_at: DateTime<Utc>, now: DateTime<Utc>) -> Eta {
        let travel_minutes = path_length_km(route.points()) / self.average_speed_kmh * 60.0;
        let total_minutes = travel_minutes.max(self.minimum_route_minutes);
        let elapsed_minutes = minutes_f64((now - placed_at).max(Duration::zero()));

        Eta::from_minutes((total_minutes - elapsed_minutes).max(0.0).round() as i64)
    }
}

fn minutes_f64(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}

fn round_minutes(duration: Duration) -> i64 {
    minutes_f64(duration).round() as i64
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::EtaEstimator;
    use crate::engine::route::RouteSynthesizer;
    use crate::models::coordinate::Coordinate;
    use crate::models::order::OrderStatus;
    use crate::models::route::Route;

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn origin() -> Coordinate {
        Coordinate {
            lat: 28.6139,
            lng: 77.2090,
        }
    }

    fn destination() -> Coordinate {
        Coordinate {
            lat: 28.70,
            lng: 77.10,
        }
    }

    #[test]
    fn delivered_is_zero_regardless_of_time() {
        let eta = EtaEstimator::default();
        for offset in [-10, 0, 5, 600] {
            let result = eta.remaining(
                t0(),
                t0() + Duration::minutes(12),
                t0() + Duration::minutes(offset),
                OrderStatus::Delivered,
                None,
            );
            assert_eq!(result.minutes, 0);
            assert_eq!(result.label, "Delivered");
        }
    }

    #[test]
    fn default_path_counts_down_to_arriving_soon() {
        let eta = EtaEstimator::default();
        let completion = t0() + Duration::minutes(12);

        let early = eta.remaining(t0(), completion, t0() + Duration::minutes(3), OrderStatus::OnTheWay, None);
        assert_eq!(early.minutes, 9);
        assert_eq!(early.label, "9 min");

        let late = eta.remaining(t0(), completion, t0() + Duration::minutes(15), OrderStatus::OnTheWay, None);
        assert_eq!(late.minutes, 0);
        assert_eq!(late.label, "Arriving soon");
    }

    #[test]
    fn synthesized_route_uses_window() {
        let eta = EtaEstimator::default();
        let route = RouteSynthesizer::default().synthesize(&origin(), &destination());
        let result = eta.remaining(
            t0(),
            t0() + Duration::minutes(40),
            t0() + Duration::minutes(10),
            OrderStatus::OnTheWay,
            Some(&route),
        );
        assert_eq!(result.minutes, 30);
    }

    #[test]
    fn short_external_route_applies_minimum_floor() {
        let eta = EtaEstimator::default();
        let near = Coordinate {
            lat: 28.6200,
            lng: 77.2090,
        };
        let route = Route::external(vec![origin(), near], &origin(), &near).unwrap();

        let result = eta.remaining(
            t0(),
            t0() + Duration::minutes(90),
            t0() + Duration::minutes(5),
            OrderStatus::OnTheWay,
            Some(&route),
        );
        assert_eq!(result.minutes, 10);
    }

    #[test]
    fn long_external_route_uses_distance() {
        let eta = EtaEstimator::default();
        let route = Route::external(vec![origin(), destination()], &origin(), &destination()).unwrap();

        // about 14.3 km at 50 km/h, so roughly 17 minutes of travel
        let result = eta.remaining(
            t0(),
            t0() + Duration::minutes(90),
            t0() + Duration::minutes(5),
            OrderStatus::OnTheWay,
            Some(&route),
        );
        assert_eq!(result.minutes, 12);
        assert_eq!(result.label, "12 min");
    }

    #[test]
    fn both_paths_are_non_increasing() {
        let eta = EtaEstimator::default();
        let completion = t0() + Duration::minutes(25);
        let external = Route::external(vec![origin(), destination()], &origin(), &destination()).unwrap();

        for route in [None, Some(&external)] {
            let mut previous = i64::MAX;
            for seconds in (0..1_800).step_by(13) {
                let now = t0() + Duration::seconds(seconds);
                let minutes = eta.remaining(t0(), completion, now, OrderStatus::OnTheWay, route).minutes;
                assert!(minutes <= previous);
                previous = minutes;
            }
        }
    }

    #[test]
    fn rejects_non_positive_speed() {
        assert!(EtaEstimator::new(0.0, 15.0).is_err());
        assert!(EtaEstimator::new(50.0, -1.0).is_err());
    }
}
