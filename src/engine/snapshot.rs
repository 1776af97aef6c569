use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::eta::Eta;
use crate::engine::tracker::{current_position, progress};
use crate::engine::Engine;
use crate::models::coordinate::Coordinate;
use crate::models::order::{Order, OrderStatus};

/// Everything a tracking page renders for one order at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingSnapshot {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub progress: f64,
    pub position: Coordinate,
    pub eta: Eta,
    pub elapsed_minutes: i64,
    pub expected_window: String,
    pub at: DateTime<Utc>,
}

/// Broadcast to websocket subscribers whenever the ticker observes an order.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingUpdate {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub position: Coordinate,
    pub progress: f64,
    pub eta: Eta,
}

impl From<&TrackingSnapshot> for TrackingUpdate {
    fn from(snapshot: &TrackingSnapshot) -> Self {
        Self {
            order_id: snapshot.order_id,
            status: snapshot.status,
            position: snapshot.position,
            progress: snapshot.progress,
            eta: snapshot.eta.clone(),
        }
    }
}

pub fn expected_window(order: &Order) -> String {
    let total_minutes = (order.expected_duration_seconds as f64 / 60.0).round() as i64;
    if (10..=15).contains(&total_minutes) {
        "Expected delivery: 10-15 min".to_string()
    } else {
        format!("Expected delivery: {total_minutes} min")
    }
}

/// Pure view of `order` at `now`. The cached status only matters if it is
/// already ahead of what elapsed time implies.
pub fn snapshot(engine: &Engine, order: &Order, now: DateTime<Utc>) -> TrackingSnapshot {
    let completion = order.estimated_completion();
    let status = order.status.max(engine.thresholds.advance(order, now));

    let position = current_position(&order.route, order.placed_at, completion, now, status);
    let progress = match status {
        OrderStatus::Delivered => 1.0,
        _ => progress(order.placed_at, completion, now),
    };
    let eta = engine
        .eta
        .remaining(order.placed_at, completion, now, status, Some(&order.route));
    let elapsed_minutes = (now - order.placed_at).max(Duration::zero()).num_minutes();

    TrackingSnapshot {
        order_id: order.id,
        status,
        status_label: status.label(),
        progress,
        position,
        eta,
        elapsed_minutes,
        expected_window: expected_window(order),
        at: now,
    }
}
