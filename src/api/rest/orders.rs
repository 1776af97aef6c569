use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::checkout::{place_order, PlaceOrder};
use crate::engine::snapshot::{snapshot, TrackingSnapshot};
use crate::engine::ticker::{observe_order, refresh_order};
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::route::Route;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/tracking", get(get_tracking))
        .route("/orders/:id/route", get(get_route))
}

#[derive(Deserialize)]
pub struct TrackingQuery {
    /// Evaluate at this instant instead of now. Nothing is persisted.
    pub at: Option<DateTime<Utc>>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlaceOrder>,
) -> Result<Json<Order>, AppError> {
    let order = place_order(&state.engine, payload, Utc::now(), &mut rand::thread_rng())?;

    state.orders.insert(order.clone());
    state.metrics.orders_placed_total.inc();
    state
        .metrics
        .active_orders
        .set(state.orders.active_count() as i64);

    Ok(Json(order))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.orders.list())
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = refresh_order(&state, &id, Utc::now())?;
    Ok(Json(order))
}

async fn get_tracking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<TrackingQuery>,
) -> Result<Json<TrackingSnapshot>, AppError> {
    let order = state.orders.get(&id)?;

    let view = match query.at {
        Some(at) => snapshot(&state.engine, &order, at),
        None => observe_order(&state, &order, Utc::now())?,
    };

    Ok(Json(view))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let order = state.orders.get(&id)?;
    Ok(Json(order.route))
}
