//! Prometheus metrics registry for the event aggregator.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it
//! to the event service and HTTP middleware.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry,
};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Total number of aggregation runs (success + failure).
    pub refreshes_total: Counter,
    /// Aggregation runs in which every source failed.
    pub refresh_failures_total: Counter,
    /// Individual source failures, labelled by source name.
    pub source_failures_total: CounterVec,
    /// Number of events in the current cache entry.
    pub events_cached: Gauge,
    /// Wall time of a full aggregation run in seconds.
    pub refresh_duration: Histogram,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let refreshes_total = Counter::with_opts(Opts::new(
            "krizevci_events_refreshes_total",
            "Total aggregation runs",
        ))?;

        let refresh_failures_total = Counter::with_opts(Opts::new(
            "krizevci_events_refresh_failures_total",
            "Aggregation runs in which every source failed",
        ))?;

        let source_failures_total = CounterVec::new(
            Opts::new(
                "krizevci_events_source_failures_total",
                "Failed source fetches by source",
            ),
            &["source"],
        )?;

        let events_cached = Gauge::with_opts(Opts::new(
            "krizevci_events_events_cached",
            "Events held in the current cache entry",
        ))?;

        let refresh_duration = Histogram::with_opts(
            HistogramOpts::new(
                "krizevci_events_refresh_duration_seconds",
                "Aggregation run duration in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "krizevci_events_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "krizevci_events_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(refreshes_total.clone()))?;
        registry.register(Box::new(refresh_failures_total.clone()))?;
        registry.register(Box::new(source_failures_total.clone()))?;
        registry.register(Box::new(events_cached.clone()))?;
        registry.register(Box::new(refresh_duration.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            refreshes_total,
            refresh_failures_total,
            source_failures_total,
            events_cached,
            refresh_duration,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
