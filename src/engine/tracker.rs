use chrono::{DateTime, Utc};

use crate::geo::lerp;
use crate::models::coordinate::Coordinate;
use crate::models::order::OrderStatus;
use crate::models::route::Route;

/// The marker stops short of the destination until the status flips to Delivered.
pub const POSITION_PROGRESS_CAP: f64 = 0.95;

/// Fraction of the delivery window elapsed at `now`, in [0, 1].
pub fn progress(
    placed_at: DateTime<Utc>,
    estimated_completion: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let window_ms = (estimated_completion - placed_at).num_milliseconds();
    if window_ms <= 0 {
        return 1.0;
    }

    let elapsed_ms = (now - placed_at).num_milliseconds();
    (elapsed_ms as f64 / window_ms as f64).clamp(0.0, 1.0)
}

/// Point at `progress` along the route, measured in segment index space.
pub fn position_along(route: &Route, progress: f64) -> Coordinate {
    let points = route.points();
    let last_index = points.len() - 1;
    let scaled = progress.clamp(0.0, 1.0) * last_index as f64;

    let idx = (scaled.floor() as usize).min(last_index);
    let next_idx = (idx + 1).min(last_index);
    let frac = scaled - idx as f64;

    lerp(&points[idx], &points[next_idx], frac)
}

pub fn current_position(
    route: &Route,
    placed_at: DateTime<Utc>,
    estimated_completion: DateTime<Utc>,
    now: DateTime<Utc>,
    status: OrderStatus,
) -> Coordinate {
    match status {
        OrderStatus::Ordered => route.first(),
        OrderStatus::Delivered => route.last(),
        OrderStatus::Preparing | OrderStatus::OnTheWay => {
            if estimated_completion <= placed_at {
                return route.last();
            }

            let capped = progress(placed_at, estimated_completion, now).min(POSITION_PROGRESS_CAP);
            position_along(route, capped)
        }
    }
}
