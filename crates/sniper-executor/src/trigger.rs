//! Trigger detector.
//!
//! Determines T0, the instant the buy attempts are centred on.
//! - Limit mode: local receipt time of the first trade on the public stream,
//!   bounded by `announced + timeout`
//! - Market mode: the announced listing time on the local clock

use std::time::{Duration, Instant};

use sniper_core::TriggerSource;
use sniper_telemetry::Metrics;
use sniper_ws::{TradeStream, WsResult};
use tracing::{info, warn};

use crate::clock::{Clock, ServerClock};

/// The detected (or fallback) T0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// Monotonic T0; fire instants are derived from it.
    pub at: Instant,
    /// T0 as local wall-clock milliseconds.
    pub local_ms: u64,
    pub source: TriggerSource,
}

impl Trigger {
    fn record(self) -> Self {
        Metrics::trigger(self.source.as_str());
        info!(source = self.source.as_str(), t0_local_ms = self.local_ms, "Trigger determined");
        self
    }
}

pub struct TriggerDetector {
    ws_url: String,
    timeout: Duration,
}

impl TriggerDetector {
    pub fn new(ws_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeout,
        }
    }

    /// T0 = the announced time, already translated to the local clock.
    pub fn announced<C: Clock>(clock: &ServerClock<C>, announced_local_ms: u64) -> Trigger {
        Self::fallback(clock, announced_local_ms, TriggerSource::Announced).record()
    }

    /// Wait for the first trade on `symbol`, racing a deadline of
    /// `announced + timeout`. Stream failures fall back immediately.
    pub async fn first_trade<C: Clock>(
        &self,
        clock: &ServerClock<C>,
        symbol: &str,
        announced_local_ms: u64,
    ) -> Trigger {
        let deadline_ms = announced_local_ms.saturating_add(self.timeout.as_millis() as u64);
        let deadline = tokio::time::Instant::from_std(clock.instant_at_local_ms(deadline_ms));

        let wait = self.wait_for_trade(clock, symbol);
        let trigger = match tokio::time::timeout_at(deadline, wait).await {
            Ok(Ok(trigger)) => trigger,
            Ok(Err(e)) => {
                warn!(%symbol, error = %e, "Trade stream failed, falling back to announced time");
                Self::fallback(clock, announced_local_ms, TriggerSource::StreamFailed)
            }
            Err(_) => {
                warn!(
                    %symbol,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "No trade before deadline, falling back to announced time"
                );
                Self::fallback(clock, announced_local_ms, TriggerSource::DeadlineFallback)
            }
        };
        trigger.record()
    }

    async fn wait_for_trade<C: Clock>(
        &self,
        clock: &ServerClock<C>,
        symbol: &str,
    ) -> WsResult<Trigger> {
        let mut stream = TradeStream::connect(&self.ws_url, symbol).await?;
        let trade = stream.next_trade().await?;
        let at = Instant::now();
        let local_ms = clock.local_now_ms();

        info!(
            %symbol,
            trade_time = ?trade.trade_time,
            price = ?trade.price,
            "First trade observed"
        );
        // Closing is off the critical path.
        tokio::spawn(stream.close());

        Ok(Trigger {
            at,
            local_ms,
            source: TriggerSource::FirstTrade,
        })
    }

    fn fallback<C: Clock>(
        clock: &ServerClock<C>,
        announced_local_ms: u64,
        source: TriggerSource,
    ) -> Trigger {
        Trigger {
            at: clock.instant_at_local_ms(announced_local_ms),
            local_ms: announced_local_ms,
            source,
        }
    }
}
