use tokio::sync::broadcast;

use crate::engine::snapshot::TrackingUpdate;
use crate::engine::Engine;
use crate::observability::metrics::Metrics;
use crate::store::OrderStore;

pub struct AppState {
    pub engine: Engine,
    pub orders: OrderStore,
    pub tracking_events_tx: broadcast::Sender<TrackingUpdate>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(engine: Engine, event_buffer_size: usize) -> Self {
        let (tracking_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            engine,
            orders: OrderStore::new(),
            tracking_events_tx,
            metrics: Metrics::new(),
        }
    }
}
