//! Connection warmer.
//!
//! Runs once, shortly before the window, over the same pooled client the
//! timed attempts use. The signed request carries a stale timestamp and a
//! dust notional; the exchange is expected to reject it.

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use sniper_rest::{NewOrder, RestResult};
use sniper_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::clock::{Clock, ServerClock};
use crate::gateway::DynGateway;

pub struct ConnectionWarmer {
    gateway: DynGateway,
    symbol: String,
    quote_qty: Decimal,
    recv_window_ms: u64,
    stale_ms: u64,
}

impl ConnectionWarmer {
    pub fn new(
        gateway: DynGateway,
        symbol: impl Into<String>,
        quote_qty: Decimal,
        recv_window_ms: u64,
        stale_ms: u64,
    ) -> Self {
        Self {
            gateway,
            symbol: symbol.into(),
            quote_qty,
            recv_window_ms,
            stale_ms,
        }
    }

    /// Warm the connection. Never fails the run.
    ///
    /// Returns true when the exchange answered the signed request at all,
    /// accepted or not, meaning the authenticated path is hot.
    pub async fn warm<C: Clock>(&self, clock: &Arc<ServerClock<C>>) -> bool {
        if let Err(e) = self.gateway.server_time().await {
            warn!(error = %e, "Warmup time request failed");
        }

        let order = NewOrder::market_buy(self.symbol.as_str(), self.quote_qty, self.recv_window_ms);
        let timestamp = clock.server_now_ms().saturating_sub(self.stale_ms);
        let started = Instant::now();
        let result = self.gateway.place_order(&order, timestamp).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        Metrics::order_latency("warmup", latency_ms);

        classify(result, latency_ms)
    }
}

fn classify<T>(result: RestResult<T>, latency_ms: f64) -> bool {
    match result {
        Ok(_) => {
            // Should not happen with a stale timestamp; nothing to undo at dust size.
            warn!(latency_ms, "Warmup order was accepted");
            true
        }
        Err(e) if e.is_transport() => {
            warn!(error = %e, latency_ms, "Warmup request did not reach the exchange");
            false
        }
        Err(e) => {
            debug!(error = %e, "Warmup rejection (expected)");
            info!(latency_ms, "Connection warmed");
            true
        }
    }
}
