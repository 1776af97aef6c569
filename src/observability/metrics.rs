use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_placed_total: IntCounter,
    pub status_transitions_total: IntCounterVec,
    pub active_orders: IntGauge,
    pub tick_latency_seconds: Histogram,
    pub tracking_subscribers: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_placed_total = IntCounter::new("orders_placed_total", "Total orders placed")
            .expect("valid orders_placed_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Committed order status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let active_orders = IntGauge::new("active_orders", "Orders not yet delivered")
            .expect("valid active_orders metric");

        let tick_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "tick_latency_seconds",
            "Time spent evaluating all active orders in one status tick",
        ))
        .expect("valid tick_latency_seconds metric");

        let tracking_subscribers = IntGauge::new(
            "tracking_subscribers",
            "Connected websocket tracking clients",
        )
        .expect("valid tracking_subscribers metric");

        registry
            .register(Box::new(orders_placed_total.clone()))
            .expect("register orders_placed_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(active_orders.clone()))
            .expect("register active_orders");
        registry
            .register(Box::new(tick_latency_seconds.clone()))
            .expect("register tick_latency_seconds");
        registry
            .register(Box::new(tracking_subscribers.clone()))
            .expect("register tracking_subscribers");

        Self {
            registry,
            orders_placed_total,
            status_transitions_total,
            active_orders,
            tick_latency_seconds,
            tracking_subscribers,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
