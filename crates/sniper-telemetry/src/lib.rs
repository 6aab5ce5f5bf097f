//! Logging, metrics and the attempt log for a sniping run.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters and histograms for attempts, latency and outcome
//! - Attempt table and JSON run report for post-run analysis

pub mod attempt_log;
pub mod error;
pub mod logging;
pub mod metrics;

pub use attempt_log::{render_attempt_table, AttemptLogger, RunReport};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
