//! Executor tuning.

use rust_decimal::Decimal;
use std::time::Duration;

use crate::error::{ExecutorError, ExecutorResult};

/// Largest decimal scale the exchange accepts.
const MAX_DECIMALS: u32 = 18;

/// Timing and order parameters for one run.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Buy offsets relative to T0 in ms, strictly increasing.
    pub attempt_offsets_ms: Vec<i64>,
    /// Pure spin only inside this window before a fire instant.
    pub spin_window: Duration,
    /// Pause between placement ack and status query.
    pub fill_grace: Duration,
    /// How long past the announced time to wait for the first trade.
    pub trigger_timeout: Duration,
    /// Pause before the single clock-sync retry.
    pub sync_retry_backoff: Duration,
    pub recv_window_ms: u64,
    pub warmup_recv_window_ms: u64,
    pub warmup_quote_qty: Decimal,
    /// Warmup timestamp is this far in the past.
    pub warmup_stale_ms: u64,
    pub depth_limit: u32,
    pub price_decimals: u32,
    pub qty_decimals: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            attempt_offsets_ms: vec![-10, -5, 0],
            spin_window: Duration::from_micros(2000),
            fill_grace: Duration::from_millis(150),
            trigger_timeout: Duration::from_millis(3000),
            sync_retry_backoff: Duration::from_millis(500),
            recv_window_ms: 5000,
            warmup_recv_window_ms: 2000,
            warmup_quote_qty: Decimal::new(1, 6),
            warmup_stale_ms: 100_000,
            depth_limit: 5,
            price_decimals: 8,
            qty_decimals: 6,
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.attempt_offsets_ms.is_empty() {
            return Err(ExecutorError::Config(
                "attempt_offsets_ms must not be empty".to_string(),
            ));
        }
        if self
            .attempt_offsets_ms
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(ExecutorError::Config(format!(
                "attempt_offsets_ms must be strictly increasing, got {:?}",
                self.attempt_offsets_ms
            )));
        }
        if self.price_decimals > MAX_DECIMALS || self.qty_decimals > MAX_DECIMALS {
            return Err(ExecutorError::Config(format!(
                "decimals must be <= {MAX_DECIMALS}"
            )));
        }
        if self.recv_window_ms == 0 || self.warmup_recv_window_ms == 0 {
            return Err(ExecutorError::Config(
                "recv windows must be positive".to_string(),
            ));
        }
        if self.trigger_timeout.is_zero() {
            return Err(ExecutorError::Config(
                "trigger_timeout must be positive".to_string(),
            ));
        }
        if self.depth_limit == 0 {
            return Err(ExecutorError::Config(
                "depth_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
