//! Order-book prober.

use std::time::Instant;

use rust_decimal::Decimal;
use sniper_core::ExecutionPlan;
use sniper_telemetry::Metrics;
use tracing::{info, warn};

use crate::error::{ExecutorError, ExecutorResult};
use crate::gateway::DynGateway;

pub struct OrderBookProber {
    gateway: DynGateway,
    depth_limit: u32,
    price_decimals: u32,
}

impl OrderBookProber {
    pub fn new(gateway: DynGateway, depth_limit: u32, price_decimals: u32) -> Self {
        Self {
            gateway,
            depth_limit,
            price_decimals,
        }
    }

    /// Choose the pricing branch from the current top of book.
    ///
    /// - Asks present: limit at `round(best_ask * (1 + markup/100), price_decimals)`
    /// - Empty book, or the exchange refuses depth with a code/msg body: market
    /// - Anything else (no answer, gateway error page, garbled body): setup failure
    pub async fn probe(&self, symbol: &str, markup_pct: Decimal) -> ExecutorResult<ExecutionPlan> {
        let started = Instant::now();
        let result = self.gateway.depth(symbol, self.depth_limit).await;
        Metrics::order_latency("depth", started.elapsed().as_secs_f64() * 1000.0);

        let plan = match result {
            Ok(depth) => match depth.best_ask() {
                Some(best_ask) => ExecutionPlan::Limit {
                    best_ask,
                    price: best_ask.apply_pct(markup_pct, self.price_decimals),
                },
                None => ExecutionPlan::Market,
            },
            Err(e) if e.is_rejection() => {
                warn!(%symbol, error = %e, "Depth refused, symbol not yet tradable");
                ExecutionPlan::Market
            }
            Err(e) => {
                return Err(ExecutorError::Setup(format!("order book probe failed: {e}")));
            }
        };

        info!(%symbol, plan = %plan, "Execution plan selected");
        Ok(plan)
    }
}
