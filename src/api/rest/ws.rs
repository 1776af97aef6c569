use std::borrow::Cow;
use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use chrono::Utc;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::lifecycle::is_terminal;
use crate::engine::snapshot::{snapshot, TrackingUpdate};
use crate::error::AppError;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    state.orders.get(&id)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, id)))
}

fn encode(update: &TrackingUpdate) -> Option<Message> {
    match serde_json::to_string(update) {
        Ok(json) => Some(Message::Text(json)),
        Err(err) => {
            warn!(error = %err, "failed to serialize tracking update for ws");
            None
        }
    }
}

/// Sends the initial view, then this order's updates. Returns true once the
/// order has been delivered, false if the client went away first.
async fn forward_updates(
    sender: &mut SplitSink<WebSocket, Message>,
    initial: TrackingUpdate,
    updates: BroadcastStream<TrackingUpdate>,
    order_id: Uuid,
) -> bool {
    if let Some(message) = encode(&initial) {
        if sender.send(message).await.is_err() {
            return false;
        }
    }
    if is_terminal(initial.status) {
        return true;
    }

    // lagged receivers just skip what they missed
    let for_order = updates.filter_map(|result| async move {
        match result {
            Ok(update) if update.order_id == order_id => Some(update),
            _ => None,
        }
    });
    let mut updates = std::pin::pin!(for_order);

    while let Some(update) = updates.next().await {
        let Some(message) = encode(&update) else {
            continue;
        };
        if sender.send(message).await.is_err() {
            return false;
        }
        if is_terminal(update.status) {
            return true;
        }
    }

    false
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, order_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let updates = BroadcastStream::new(state.tracking_events_tx.subscribe());

    state.metrics.tracking_subscribers.inc();
    info!(order_id = %order_id, "tracking client connected");

    let initial = match state.orders.get(&order_id) {
        Ok(order) => TrackingUpdate::from(&snapshot(&state.engine, &order, Utc::now())),
        Err(err) => {
            warn!(order_id = %order_id, error = %err, "order vanished before ws upgrade");
            state.metrics.tracking_subscribers.dec();
            return;
        }
    };

    let mut send_task = tokio::spawn(async move {
        if forward_updates(&mut sender, initial, updates, order_id).await {
            let close = CloseFrame {
                code: close_code::NORMAL,
                reason: Cow::from("order delivered"),
            };
            let _ = sender.send(Message::Close(Some(close))).await;
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.metrics.tracking_subscribers.dec();
    info!(order_id = %order_id, "tracking client disconnected");
}
