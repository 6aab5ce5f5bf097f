//! Local and exchange clocks.
//!
//! # Offset Convention
//! `offset_ms = server_time - local_time_at_receipt`
//! - Positive: server clock is ahead of local
//! - Negative: server clock is behind local

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use sniper_core::ClockOffset;
use sniper_rest::RestResult;
use sniper_telemetry::Metrics;
use tracing::{info, warn};

use crate::error::{ExecutorError, ExecutorResult};
use crate::gateway::DynGateway;

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Local clock corrected to exchange time.
///
/// The offset is written by the synchronizer and read by every signed
/// request; it is never written during the firing window.
#[derive(Debug, Default)]
pub struct ServerClock<C: Clock = SystemClock> {
    offset_ms: AtomicI64,
    clock: C,
}

impl ServerClock<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> ServerClock<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            offset_ms: AtomicI64::new(0),
            clock,
        }
    }

    pub fn offset(&self) -> ClockOffset {
        ClockOffset(self.offset_ms.load(Ordering::Acquire))
    }

    pub fn apply(&self, offset: ClockOffset) {
        self.offset_ms.store(offset.as_millis(), Ordering::Release);
        Metrics::clock_offset(offset.as_millis());
    }

    pub fn local_now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Offset-corrected `timestamp` for signed requests.
    pub fn server_now_ms(&self) -> u64 {
        self.offset().to_server(self.clock.now_ms())
    }

    /// Local wall time of an exchange-clock instant.
    pub fn to_local_ms(&self, server_ms: u64) -> u64 {
        self.offset().to_local(server_ms)
    }

    /// Monotonic instant corresponding to a local wall-clock time.
    pub fn instant_at_local_ms(&self, local_ms: u64) -> Instant {
        let now_ms = self.clock.now_ms();
        let now = Instant::now();
        if local_ms >= now_ms {
            now + Duration::from_millis(local_ms - now_ms)
        } else {
            now.checked_sub(Duration::from_millis(now_ms - local_ms))
                .unwrap_or(now)
        }
    }
}

/// Measures the exchange clock offset over the shared gateway.
pub struct ClockSynchronizer {
    gateway: DynGateway,
    retry_backoff: Duration,
}

impl ClockSynchronizer {
    /// Offset change that warrants a warning on resync.
    const DRIFT_WARN_THRESHOLD_MS: i64 = 50;

    pub fn new(gateway: DynGateway, retry_backoff: Duration) -> Self {
        Self {
            gateway,
            retry_backoff,
        }
    }

    /// One time request; local time is read at receipt.
    pub async fn measure<C: Clock>(&self, clock: &ServerClock<C>) -> RestResult<ClockOffset> {
        let started = Instant::now();
        let server_ms = self.gateway.server_time().await?;
        let local_ms = clock.local_now_ms();
        Metrics::order_latency("time", started.elapsed().as_secs_f64() * 1000.0);
        Ok(ClockOffset::measure(server_ms, local_ms))
    }

    /// Initial sync: one retry after a backoff, then a setup failure.
    pub async fn sync<C: Clock>(&self, clock: &ServerClock<C>) -> ExecutorResult<ClockOffset> {
        let offset = match self.measure(clock).await {
            Ok(offset) => offset,
            Err(e) => {
                warn!(
                    error = %e,
                    backoff_ms = self.retry_backoff.as_millis() as u64,
                    "Clock sync failed, retrying once"
                );
                tokio::time::sleep(self.retry_backoff).await;
                self.measure(clock)
                    .await
                    .map_err(|e| ExecutorError::Setup(format!("clock sync failed: {e}")))?
            }
        };
        clock.apply(offset);
        info!(offset = %offset, "Clock synchronized");
        Ok(offset)
    }

    /// Refresh before the window. Failure keeps the previous offset.
    pub async fn resync<C: Clock>(&self, clock: &ServerClock<C>) -> ClockOffset {
        let previous = clock.offset();
        match self.measure(clock).await {
            Ok(offset) => {
                let drift = offset.as_millis() - previous.as_millis();
                if drift.abs() > Self::DRIFT_WARN_THRESHOLD_MS {
                    warn!(
                        previous = %previous,
                        offset = %offset,
                        drift_ms = drift,
                        "Clock drift since initial sync"
                    );
                } else {
                    info!(offset = %offset, drift_ms = drift, "Clock resynchronized");
                }
                clock.apply(offset);
                offset
            }
            Err(e) => {
                warn!(
                    error = %e,
                    offset = %previous,
                    "Clock resync failed, keeping previous offset"
                );
                previous
            }
        }
    }
}
