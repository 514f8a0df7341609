use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub location_updates_total: IntCounterVec,
    pub updates_in_queue: IntGauge,
    pub reconcile_latency_seconds: HistogramVec,
    pub map_sessions: IntGauge,
    pub skipped_overlays_total: IntCounter,
    pub roster_size: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let location_updates_total = IntCounterVec::new(
            Opts::new("location_updates_total", "Location updates by outcome"),
            &["outcome"],
        )
        .expect("valid location_updates_total metric");

        let updates_in_queue =
            IntGauge::new("updates_in_queue", "Current number of location updates in queue")
                .expect("valid updates_in_queue metric");

        let reconcile_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "reconcile_latency_seconds",
                "Latency of map reconcile passes in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]),
            &["trigger"],
        )
        .expect("valid reconcile_latency_seconds metric");

        let map_sessions = IntGauge::new("map_sessions", "Currently mounted live map sessions")
            .expect("valid map_sessions metric");

        let skipped_overlays_total = IntCounter::new(
            "skipped_overlays_total",
            "Markers and route points skipped because of invalid coordinates",
        )
        .expect("valid skipped_overlays_total metric");

        let roster_size = IntGauge::new("roster_size", "Collectors currently on the roster")
            .expect("valid roster_size metric");

        registry
            .register(Box::new(location_updates_total.clone()))
            .expect("register location_updates_total");
        registry
            .register(Box::new(updates_in_queue.clone()))
            .expect("register updates_in_queue");
        registry
            .register(Box::new(reconcile_latency_seconds.clone()))
            .expect("register reconcile_latency_seconds");
        registry
            .register(Box::new(map_sessions.clone()))
            .expect("register map_sessions");
        registry
            .register(Box::new(skipped_overlays_total.clone()))
            .expect("register skipped_overlays_total");
        registry
            .register(Box::new(roster_size.clone()))
            .expect("register roster_size");

        Self {
            registry,
            location_updates_total,
            updates_in_queue,
            reconcile_latency_seconds,
            map_sessions,
            skipped_overlays_total,
            roster_size,
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
