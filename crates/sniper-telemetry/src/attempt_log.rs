//! Attempt logger and run report.
//!
//! After fan-in, every attempt is emitted as one structured event and the
//! whole log is rendered as a fixed-width table. The optional JSON report
//! carries the same records for offline analysis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sniper_core::{ExecutionPlan, OrderAttempt, RunOutcome, SellReport, TriggerSource};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::TelemetryResult;
use crate::metrics::Metrics;

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Render attempts as `Nr | Sent | Recv | Lat(ms) | Status | Qty | Price | Msg`.
pub fn render_attempt_table(attempts: &[OrderAttempt]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<3} | {:<12} | {:<12} | {:>8} | {:<7} | {:>14} | {:>16} | Msg",
        "Nr", "Sent", "Recv", "Lat(ms)", "Status", "Qty", "Price"
    );
    let _ = writeln!(out, "{}", "-".repeat(96));
    for attempt in attempts {
        let _ = writeln!(
            out,
            "{:<3} | {:<12} | {:<12} | {:>8.2} | {:<7} | {:>14} | {:>16} | {}",
            attempt.index + 1,
            attempt.sent_at.format(TIME_FORMAT),
            attempt.received_at.format(TIME_FORMAT),
            attempt.latency_ms,
            attempt.status.label(),
            attempt.executed_qty.to_wire(),
            attempt.price.to_wire(),
            attempt.message,
        );
    }
    out
}

/// Emits the attempt log for one symbol.
#[derive(Debug, Clone)]
pub struct AttemptLogger {
    symbol: String,
}

impl AttemptLogger {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    /// One structured event per attempt, then the table.
    pub fn log_attempts(&self, attempts: &[OrderAttempt], skipped: usize) {
        for attempt in attempts {
            self.log_attempt(attempt);
        }
        for _ in 0..skipped {
            Metrics::attempt("SKIPPED");
        }
        info!(
            symbol = %self.symbol,
            sent = attempts.len(),
            skipped,
            "Attempt log\n{}",
            render_attempt_table(attempts)
        );
    }

    fn log_attempt(&self, attempt: &OrderAttempt) {
        Metrics::attempt(attempt.status.label());
        if attempt.status.is_ambiguous() {
            warn!(
                symbol = %self.symbol,
                nr = attempt.index + 1,
                offset_ms = attempt.offset_ms,
                order_id = ?attempt.order_id,
                message = %attempt.message,
                "Attempt could not be reconciled, fill state unknown"
            );
            return;
        }
        info!(
            symbol = %self.symbol,
            nr = attempt.index + 1,
            offset_ms = attempt.offset_ms,
            scheduled_at = %attempt.scheduled_at.format(TIME_FORMAT),
            sent_at = %attempt.sent_at.format(TIME_FORMAT),
            latency_ms = attempt.latency_ms,
            status = attempt.status.label(),
            order_id = ?attempt.order_id,
            executed_qty = %attempt.executed_qty,
            price = %attempt.price,
            message = %attempt.message,
            "Buy attempt"
        );
    }

    pub fn log_sell(&self, sell: &SellReport) {
        info!(
            symbol = %self.symbol,
            order_id = %sell.order_id,
            price = %sell.plan.price,
            quantity = %sell.plan.quantity,
            sent_at = %sell.sent_at.format(TIME_FORMAT),
            latency_ms = sell.latency_ms,
            "Take-profit sell placed"
        );
    }
}

/// Post-run JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub listing_id: Option<String>,
    pub symbol: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub clock_offset_ms: i64,
    pub plan: Option<ExecutionPlan>,
    pub trigger_source: Option<TriggerSource>,
    /// T0 as local wall-clock milliseconds.
    pub trigger_at_ms: Option<u64>,
    pub attempts: Vec<OrderAttempt>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn write_json(&self, path: impl AsRef<Path>) -> TelemetryResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Run report written");
        Ok(())
    }
}
