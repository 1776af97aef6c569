use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::snapshot::{snapshot, TrackingSnapshot, TrackingUpdate};
use crate::error::AppError;
use crate::models::order::Order;
use crate::state::AppState;

/// Computes the order's view at `now` and persists any forward status change.
pub fn observe_order(
    state: &AppState,
    order: &Order,
    now: DateTime<Utc>,
) -> Result<TrackingSnapshot, AppError> {
    let view = snapshot(&state.engine, order, now);

    if let Some(previous) = state.orders.commit_status(&order.id, view.status)? {
        state
            .metrics
            .status_transitions_total
            .with_label_values(&[view.status.as_str()])
            .inc();
        info!(
            order_id = %order.id,
            from = ?previous,
            to = ?view.status,
            "order status advanced"
        );
    }

    Ok(view)
}

pub fn refresh_order(state: &AppState, id: &Uuid, now: DateTime<Utc>) -> Result<Order, AppError> {
    let order = state.orders.get(id)?;
    observe_order(state, &order, now)?;
    state.orders.get(id)
}

/// One pass over every undelivered order. Returns how many were observed.
pub fn tick(state: &AppState, now: DateTime<Utc>) -> usize {
    let active = state.orders.active();

    for order in &active {
        match observe_order(state, order, now) {
            Ok(view) => {
                let _ = state.tracking_events_tx.send(TrackingUpdate::from(&view));
            }
            Err(err) => warn!(order_id = %order.id, error = %err, "failed to observe order"),
        }
    }

    state.metrics.active_orders.set(state.orders.active_count() as i64);
    active.len()
}

pub async fn run_status_ticker(state: Arc<AppState>, period: Duration) {
    info!(period_ms = period.as_millis() as u64, "status ticker started");

    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticks.tick().await;

        let start = Instant::now();
        let observed = tick(&state, Utc::now());
        state
            .metrics
            .tick_latency_seconds
            .observe(start.elapsed().as_secs_f64());

        debug!(observed, "status tick complete");
    }
}
