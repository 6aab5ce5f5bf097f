//! Fill reconciliation.
//!
//! The placement ack does not reliably carry the executed quantity of an
//! IOC or market order. After a short grace period the order is read back
//! with a signed status query; that answer is authoritative.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use sniper_core::Size;
use sniper_rest::RestResult;
use sniper_telemetry::Metrics;
use tracing::debug;

use crate::clock::ServerClock;
use crate::gateway::DynGateway;

/// Authoritative execution of one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledFill {
    pub order_id: String,
    pub executed_qty: Size,
    pub cummulative_quote_qty: Decimal,
    /// Exchange order status, e.g. "FILLED" or "CANCELED".
    pub status: String,
}

impl ReconciledFill {
    /// Confirmed only for a strictly positive executed quantity.
    pub fn is_filled(&self) -> bool {
        self.executed_qty.is_positive()
    }
}

pub struct FillReconciler {
    gateway: DynGateway,
    clock: Arc<ServerClock>,
    grace: Duration,
    recv_window_ms: u64,
}

impl FillReconciler {
    pub fn new(
        gateway: DynGateway,
        clock: Arc<ServerClock>,
        grace: Duration,
        recv_window_ms: u64,
    ) -> Self {
        Self {
            gateway,
            clock,
            grace,
            recv_window_ms,
        }
    }

    /// Wait out the grace period, then read the order back.
    pub async fn reconcile(&self, symbol: &str, order_id: &str) -> RestResult<ReconciledFill> {
        tokio::time::sleep(self.grace).await;
        self.query(symbol, order_id).await
    }

    /// Read-only status query; repeatable with the same result.
    pub async fn query(&self, symbol: &str, order_id: &str) -> RestResult<ReconciledFill> {
        let started = Instant::now();
        let result = self
            .gateway
            .query_order(
                symbol,
                order_id,
                self.recv_window_ms,
                self.clock.server_now_ms(),
            )
            .await;
        Metrics::order_latency("status", started.elapsed().as_secs_f64() * 1000.0);

        let report = result?;
        debug!(
            %order_id,
            status = %report.status,
            executed_qty = %report.executed_qty,
            "Order status"
        );
        Ok(ReconciledFill {
            order_id: report.order_id,
            executed_qty: Size::new(report.executed_qty.max(Decimal::ZERO)),
            cummulative_quote_qty: report.cummulative_quote_qty,
            status: report.status,
        })
    }
}
