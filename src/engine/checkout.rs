use std::f64::consts::TAU;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::AppError;
use crate::geo::{coincident, distance_km, offset_point};
use crate::models::coordinate::Coordinate;
use crate::models::order::{
    Driver, Order, OrderItem, OrderStatus, PaymentMethod, MAX_EXPECTED_DURATION_SECONDS,
};

/// Lower bound for the distance a coincident destination is moved.
pub const MIN_PERTURB_KM: f64 = 0.5;

const DRIVER_ROSTER: [&str; 5] = [
    "Raj Kumar",
    "Amit Singh",
    "Vikram Patel",
    "Rajesh Sharma",
    "Suresh Verma",
];

/// Expected delivery time: fixed preparation plus clamped travel time.
#[derive(Debug, Clone)]
pub struct DurationPolicy {
    base_prep_minutes: f64,
    speed_kmh: f64,
    min_travel_minutes: f64,
    max_travel_minutes: f64,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            base_prep_minutes: 10.0,
            speed_kmh: 50.0,
            min_travel_minutes: 5.0,
            max_travel_minutes: 60.0,
        }
    }
}

impl DurationPolicy {
    pub fn new(
        base_prep_minutes: f64,
        speed_kmh: f64,
        min_travel_minutes: f64,
        max_travel_minutes: f64,
    ) -> Result<Self, AppError> {
        let all_finite = [base_prep_minutes, speed_kmh, min_travel_minutes, max_travel_minutes]
            .iter()
            .all(|value| value.is_finite());

        if !all_finite || base_prep_minutes < 0.0 || speed_kmh <= 0.0 {
            return Err(AppError::Config(
                "delivery duration settings must be finite with a positive speed".to_string(),
            ));
        }

        if min_travel_minutes <= 0.0 || min_travel_minutes > max_travel_minutes {
            return Err(AppError::Config(format!(
                "travel bounds must satisfy 0 < min <= max, got {min_travel_minutes}..{max_travel_minutes}"
            )));
        }

        let longest_seconds = (base_prep_minutes + max_travel_minutes).round() * 60.0;
        if longest_seconds > MAX_EXPECTED_DURATION_SECONDS as f64 {
            return Err(AppError::Config(format!(
                "prep plus max travel must stay within {} minutes",
                MAX_EXPECTED_DURATION_SECONDS / 60
            )));
        }

        Ok(Self {
            base_prep_minutes,
            speed_kmh,
            min_travel_minutes,
            max_travel_minutes,
        })
    }

    pub fn expected_seconds(&self, distance_km: f64) -> i64 {
        let travel = (distance_km / self.speed_kmh * 60.0)
            .clamp(self.min_travel_minutes, self.max_travel_minutes);
        let total_minutes = (self.base_prep_minutes + travel).round().max(1.0);
        total_minutes as i64 * 60
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub restaurant: String,
    pub origin: Coordinate,
    /// Result of the geolocation lookup; `None` when it failed or was denied.
    #[serde(default)]
    pub destination: Option<Coordinate>,
    /// Path from a routing service, when one answered.
    #[serde(default)]
    pub route: Option<Vec<Coordinate>>,
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl PlaceOrder {
    fn validate(&self) -> Result<(), AppError> {
        if self.restaurant.trim().is_empty() {
            return Err(AppError::BadRequest("restaurant cannot be empty".to_string()));
        }

        self.origin.validate()?;
        if let Some(destination) = &self.destination {
            destination.validate()?;
        }

        if self.items.is_empty() {
            return Err(AppError::BadRequest("order has no items".to_string()));
        }

        if self.items.iter().any(|item| item.quantity == 0) {
            return Err(AppError::BadRequest("item quantity must be > 0".to_string()));
        }

        if !(self.total.is_finite() && self.total >= 0.0) {
            return Err(AppError::BadRequest("total must be a non-negative amount".to_string()));
        }

        Ok(())
    }
}

pub fn resolve_destination(located: Option<Coordinate>, fallback: Coordinate) -> Coordinate {
    match located {
        Some(point) => point,
        None => {
            warn!(lat = fallback.lat, lng = fallback.lng, "geolocation unavailable; using default destination");
            fallback
        }
    }
}

/// Moves `destination` off `origin` when the two coincide, so the route has length.
pub fn separate_destination<R: Rng + ?Sized>(
    origin: &Coordinate,
    destination: Coordinate,
    radius_km: f64,
    rng: &mut R,
) -> Coordinate {
    if !coincident(origin, &destination) {
        return destination;
    }

    let bearing = rng.gen_range(0.0..TAU);
    let distance = rng.gen_range(MIN_PERTURB_KM..=radius_km.max(MIN_PERTURB_KM));
    let moved = offset_point(origin, bearing, distance);

    debug!(distance_km = distance, "destination coincides with origin; perturbed");
    moved
}

fn assign_driver<R: Rng + ?Sized>(rng: &mut R) -> Driver {
    let name = DRIVER_ROSTER
        .choose(rng)
        .copied()
        .unwrap_or(DRIVER_ROSTER[0])
        .to_string();
    let phone = format!("+91 {}", rng.gen_range(7_000_000_000u64..=9_999_999_999));

    Driver { name, phone }
}

pub fn place_order<R: Rng + ?Sized>(
    engine: &Engine,
    request: PlaceOrder,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Order, AppError> {
    request.validate()?;

    let origin = request.origin;
    let destination = resolve_destination(request.destination, engine.default_destination);
    let destination = separate_destination(&origin, destination, engine.perturb_radius_km, rng);

    let route = engine.synthesizer.plan(&origin, &destination, request.route);
    let expected_duration_seconds = engine
        .durations
        .expected_seconds(distance_km(&origin, &destination));

    let order = Order {
        id: Uuid::new_v4(),
        restaurant: request.restaurant,
        origin,
        destination,
        placed_at: now,
        expected_duration_seconds,
        status: OrderStatus::Ordered,
        route,
        driver: assign_driver(rng),
        items: request.items,
        total: request.total,
        payment_method: request.payment_method,
    };

    info!(
        order_id = %order.id,
        route_points = order.route.len(),
        expected_minutes = expected_duration_seconds / 60,
        "order placed"
    );

    Ok(order)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{place_order, separate_destination, DurationPolicy, PlaceOrder, MIN_PERTURB_KM};
    use crate::engine::Engine;
    use crate::geo::{coincident, distance_km};
    use crate::models::coordinate::Coordinate;
    use crate::models::order::{OrderItem, OrderStatus, PaymentMethod};
    use crate::models::route::RouteSource;

    fn delhi() -> Coordinate {
        Coordinate {
            lat: 28.6139,
            lng: 77.2090,
        }
    }

    fn request(destination: Option<Coordinate>) -> PlaceOrder {
        PlaceOrder {
            restaurant: "Shutup & Eat".to_string(),
            origin: delhi(),
            destination,
            route: None,
            items: vec![OrderItem {
                name: "Butter Chicken".to_string(),
                quantity: 1,
                price: 350.0,
            }],
            total: 380.99,
            payment_method: PaymentMethod::Upi,
        }
    }

    #[test]
    fn expected_duration_clamps_travel_time() {
        let policy = DurationPolicy::default();

        assert_eq!(policy.expected_seconds(0.0), 15 * 60);
        assert_eq!(policy.expected_seconds(14.31), 27 * 60);
        assert_eq!(policy.expected_seconds(1_000.0), 70 * 60);
    }

    #[test]
    fn invalid_travel_bounds_are_rejected() {
        assert!(DurationPolicy::new(10.0, 50.0, 30.0, 5.0).is_err());
        assert!(DurationPolicy::new(10.0, 0.0, 5.0, 60.0).is_err());
        assert!(DurationPolicy::new(10.0, 50.0, 5.0, 1_440.0).is_err());
        assert!(DurationPolicy::new(0.0, 50.0, 5.0, 1_440.0).is_ok());
    }

    #[test]
    fn coincident_destination_is_always_moved() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let moved = separate_destination(&delhi(), delhi(), 4.0, &mut rng);
            let distance = distance_km(&delhi(), &moved);

            assert!(!coincident(&delhi(), &moved));
            assert!(distance >= MIN_PERTURB_KM * 0.95 && distance <= 4.05, "moved {distance} km");
        }
    }

    #[test]
    fn perturbation_is_reproducible_with_seed() {
        let first = separate_destination(&delhi(), delhi(), 4.0, &mut StdRng::seed_from_u64(42));
        let second = separate_destination(&delhi(), delhi(), 4.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_destination_is_untouched() {
        let target = Coordinate {
            lat: 28.70,
            lng: 77.10,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(separate_destination(&delhi(), target, 4.0, &mut rng), target);
    }

    #[test]
    fn place_order_falls_back_to_default_destination() {
        let engine = Engine {
            default_destination: Coordinate {
                lat: 28.70,
                lng: 77.10,
            },
            ..Engine::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let order = place_order(&engine, request(None), now, &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(order.destination, engine.default_destination);
        assert_eq!(order.status, OrderStatus::Ordered);
        assert_eq!(order.placed_at, now);
        assert_eq!(order.route.first(), delhi());
        assert_eq!(order.route.last(), order.destination);
        assert_eq!(order.route.source(), RouteSource::Synthesized);
        assert_eq!(order.expected_duration_seconds, 27 * 60);
        assert!(!order.driver.name.is_empty());
        assert!(order.driver.phone.starts_with("+91 "));
    }

    #[test]
    fn place_order_uses_external_route() {
        let engine = Engine::default();
        let target = Coordinate {
            lat: 28.70,
            lng: 77.10,
        };
        let mut req = request(Some(target));
        req.route = Some(vec![delhi(), Coordinate { lat: 28.65, lng: 77.20 }, target]);

        let order = place_order(&engine, req, Utc::now(), &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(order.route.source(), RouteSource::External);
        assert_eq!(order.route.len(), 3);
    }

    #[test]
    fn place_order_rejects_empty_items() {
        let mut req = request(None);
        req.items.clear();

        let result = place_order(&Engine::default(), req, Utc::now(), &mut StdRng::seed_from_u64(3));
        assert!(result.is_err());
    }

    #[test]
    fn place_order_rejects_invalid_destination() {
        let req = request(Some(Coordinate { lat: 120.0, lng: 0.0 }));
        let result = place_order(&Engine::default(), req, Utc::now(), &mut StdRng::seed_from_u64(3));
        assert!(result.is_err());
    }
}
