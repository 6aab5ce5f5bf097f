//! Prometheus metrics for a sniping run.
//!
//! A run lives for seconds, so nothing scrapes these; the registry is
//! rendered once at the end of the run and written to the log.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A failure means a
//! duplicate metric name, which is a programming error caught at first use.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Buy attempts by terminal status.
/// Labels: status (OK/NOFILL/ERR/UNKNOWN/SKIPPED)
pub static ATTEMPTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sniper_attempts_total",
        "Buy attempts by terminal status",
        &["status"]
    )
    .unwrap()
});

/// REST round trip in milliseconds.
/// Labels: kind (buy/status/sell/warmup/time/depth)
pub static ORDER_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "sniper_order_latency_ms",
        "REST round trip latency in milliseconds",
        &["kind"],
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0]
    )
    .unwrap()
});

/// Last measured server-minus-local offset.
pub static CLOCK_OFFSET_MS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "sniper_clock_offset_ms",
        "Server minus local clock offset in milliseconds"
    )
    .unwrap()
});

/// How T0 was determined.
/// Labels: source (first_trade/announced/deadline_fallback/stream_failed)
pub static TRIGGER_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sniper_trigger_total",
        "Trigger instants by source",
        &["source"]
    )
    .unwrap()
});

/// Run outcomes.
/// Labels: outcome (no_buy/bought_and_listed/failed)
pub static RUN_OUTCOME_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sniper_run_outcome_total",
        "Run outcomes",
        &["outcome"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a finished (or skipped) buy attempt.
    pub fn attempt(status: &str) {
        ATTEMPTS_TOTAL.with_label_values(&[status]).inc();
    }

    /// Record a REST round trip.
    pub fn order_latency(kind: &str, latency_ms: f64) {
        ORDER_LATENCY_MS
            .with_label_values(&[kind])
            .observe(latency_ms);
    }

    /// Record the current clock offset.
    pub fn clock_offset(offset_ms: i64) {
        CLOCK_OFFSET_MS.set(offset_ms as f64);
    }

    /// Record how T0 was determined.
    pub fn trigger(source: &str) {
        TRIGGER_TOTAL.with_label_values(&[source]).inc();
    }

    /// Record the run outcome.
    pub fn run_outcome(outcome: &str) {
        RUN_OUTCOME_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Render the default registry in text exposition format.
    pub fn render() -> TelemetryResult<String> {
        let families = prometheus::gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
