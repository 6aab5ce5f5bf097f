//! Take-profit sell placement and run outcome.
//!
//! Runs once, after every buy attempt has been awaited and reconciled.
//! Limit and market fills converge on the same `(price, quantity)` shape
//! before the sell is computed.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use sniper_core::{ExecutionPlan, OrderAttempt, Price, RunOutcome, SellPlan, SellReport, Size};
use sniper_rest::NewOrder;
use sniper_telemetry::Metrics;
use tracing::{error, info, warn};

use crate::clock::ServerClock;
use crate::error::{ExecutorError, ExecutorResult};
use crate::gateway::DynGateway;

/// Aggregate of every confirmed fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuySummary {
    pub bought_qty: Size,
    pub bought_quote: Decimal,
    /// Limit price, or the unrounded realized average in market mode.
    pub buy_price: Price,
}

impl BuySummary {
    /// `None` when nothing was confirmed bought.
    pub fn from_attempts(plan: ExecutionPlan, attempts: &[OrderAttempt]) -> Option<Self> {
        let filled = attempts.iter().filter(|a| a.is_filled());
        let (qty, quote) = filled.fold((Decimal::ZERO, Decimal::ZERO), |(q, s), a| {
            (q + a.executed_qty.inner(), s + a.quote_spent)
        });
        if qty <= Decimal::ZERO {
            return None;
        }

        let (bought_quote, buy_price) = match plan {
            ExecutionPlan::Limit { price, .. } => (qty * price.inner(), price),
            ExecutionPlan::Market => (quote, Price::new(quote / qty)),
        };
        Some(Self {
            bought_qty: Size::new(qty),
            bought_quote,
            buy_price,
        })
    }
}

pub struct SellPlacer {
    gateway: DynGateway,
    clock: Arc<ServerClock>,
    symbol: String,
    recv_window_ms: u64,
    price_decimals: u32,
    qty_decimals: u32,
}

impl SellPlacer {
    pub fn new(
        gateway: DynGateway,
        clock: Arc<ServerClock>,
        symbol: impl Into<String>,
        recv_window_ms: u64,
        price_decimals: u32,
        qty_decimals: u32,
    ) -> Self {
        Self {
            gateway,
            clock,
            symbol: symbol.into(),
            recv_window_ms,
            price_decimals,
            qty_decimals,
        }
    }

    /// Submit the single GTC sell. `Ok(None)` when the bought quantity
    /// truncates to nothing sellable. No retry.
    pub async fn place(
        &self,
        summary: &BuySummary,
        profit_pct: Decimal,
    ) -> ExecutorResult<Option<SellReport>> {
        let Some(plan) = SellPlan::compute(
            summary.bought_qty,
            summary.buy_price,
            profit_pct,
            self.price_decimals,
            self.qty_decimals,
        ) else {
            return Ok(None);
        };
        if !plan.price.is_positive() {
            return Err(ExecutorError::Sell(format!(
                "sell price for buy price {} rounds to zero at {} decimals",
                summary.buy_price, self.price_decimals
            )));
        }

        let order = NewOrder::limit_sell_gtc(
            self.symbol.as_str(),
            plan.price,
            plan.quantity,
            self.recv_window_ms,
        );
        let sent_at = Utc::now();
        let started = Instant::now();
        let result = self
            .gateway
            .place_order(&order, self.clock.server_now_ms())
            .await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        Metrics::order_latency("sell", latency_ms);

        let ack = result.map_err(|e| ExecutorError::Sell(e.to_string()))?;
        Ok(Some(SellReport {
            plan,
            order_id: ack.order_id,
            sent_at,
            latency_ms,
        }))
    }

    /// Sell whatever was bought and classify the run.
    pub async fn settle(
        &self,
        plan: ExecutionPlan,
        attempts: &[OrderAttempt],
        profit_pct: Decimal,
    ) -> RunOutcome {
        let ambiguous = attempts.iter().filter(|a| a.status.is_ambiguous()).count();
        let summary = BuySummary::from_attempts(plan, attempts);

        let outcome = match summary {
            None if ambiguous > 0 => RunOutcome::Failed {
                reason: format!("{ambiguous} attempt(s) unreconciled, position unknown"),
            },
            None => RunOutcome::NoBuy,
            Some(summary) => {
                info!(
                    symbol = %self.symbol,
                    bought_qty = %summary.bought_qty,
                    bought_quote = %summary.bought_quote,
                    buy_price = %summary.buy_price,
                    "Buy confirmed"
                );
                match self.place(&summary, profit_pct).await {
                    Ok(Some(sell)) => {
                        if ambiguous > 0 {
                            warn!(ambiguous, "Sell placed but some attempts are unreconciled");
                        }
                        RunOutcome::BoughtAndListed {
                            bought_qty: summary.bought_qty,
                            bought_quote: summary.bought_quote,
                            sell,
                        }
                    }
                    Ok(None) => {
                        error!(
                            bought_qty = %summary.bought_qty,
                            "Bought quantity below sell precision, manual follow-up required"
                        );
                        RunOutcome::Failed {
                            reason: format!(
                                "bought {} but the sell quantity truncates to zero at {} decimals",
                                summary.bought_qty, self.qty_decimals
                            ),
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Take-profit sell failed, manual follow-up required");
                        RunOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        Metrics::run_outcome(outcome.label());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockGateway, MockPlacement};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sniper_core::{AttemptErrorKind, AttemptStatus};
    use sniper_rest::OrderKind;

    fn attempt(index: usize, status: AttemptStatus, qty: Decimal, quote: Decimal) -> OrderAttempt {
        let now = Utc::now();
        OrderAttempt {
            index,
            offset_ms: 0,
            scheduled_at: now,
            sent_at: now,
            received_at: now,
            latency_ms: 1.0,
            order_id: Some(index.to_string()),
            status,
            executed_qty: Size::new(qty),
            quote_spent: quote,
            price: Price::ZERO,
            message: String::new(),
        }
    }

    fn placer(gateway: Arc<MockGateway>) -> SellPlacer {
        SellPlacer::new(gateway, Arc::new(ServerClock::new()), "NEWUSDT", 5000, 8, 6)
    }

    fn limit_plan() -> ExecutionPlan {
        ExecutionPlan::Limit {
            best_ask: Price::new(dec!(100)),
            price: Price::new(dec!(120)),
        }
    }

    #[test]
    fn test_limit_and_market_converge_on_same_shape() {
        let fills = [attempt(0, AttemptStatus::Filled, dec!(0.416667), dec!(50.00004))];
        let limit = BuySummary::from_attempts(limit_plan(), &fills).unwrap();
        let market = BuySummary::from_attempts(ExecutionPlan::Market, &fills).unwrap();

        let a = SellPlan::compute(limit.bought_qty, limit.buy_price, dec!(200), 8, 6).unwrap();
        let b = SellPlan::compute(market.bought_qty, market.buy_price, dec!(200), 8, 6).unwrap();
        assert_eq!(a.price.inner(), dec!(360));
        assert_eq!(a, b);
    }

    #[test]
    fn test_market_summary_keeps_unrounded_price() {
        let fills = [
            attempt(0, AttemptStatus::Filled, dec!(300000000), dec!(30)),
            attempt(1, AttemptStatus::Filled, dec!(100000000), dec!(20)),
        ];
        let summary = BuySummary::from_attempts(ExecutionPlan::Market, &fills).unwrap();
        assert_eq!(summary.bought_qty.inner(), dec!(400000000));
        assert_eq!(summary.bought_quote, dec!(50));
        assert_eq!(summary.buy_price.inner(), dec!(0.000000125));
    }

    #[test]
    fn test_summary_ignores_unfilled() {
        let attempts = [
            attempt(0, AttemptStatus::NoFill, Decimal::ZERO, Decimal::ZERO),
            attempt(
                1,
                AttemptStatus::Error(AttemptErrorKind::Request),
                Decimal::ZERO,
                Decimal::ZERO,
            ),
        ];
        assert!(BuySummary::from_attempts(limit_plan(), &attempts).is_none());
    }

    #[tokio::test]
    async fn test_single_gtc_sell_placed() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_placement(MockPlacement::ack("sell-1"));
        let attempts = [attempt(0, AttemptStatus::Filled, dec!(0.416667), dec!(50.00004))];

        let outcome = placer(gateway.clone())
            .settle(limit_plan(), &attempts, dec!(200))
            .await;

        match outcome {
            RunOutcome::BoughtAndListed { bought_qty, sell, .. } => {
                assert_eq!(bought_qty.inner(), dec!(0.416667));
                assert_eq!(sell.order_id, "sell-1");
                assert_eq!(sell.plan.price.inner(), dec!(360));
            }
            other => panic!("expected BoughtAndListed, got {other:?}"),
        }
        let placed = gateway.placed();
        assert_eq!(placed.len(), 1);
        match placed[0].order.kind {
            OrderKind::Limit { quantity, time_in_force, .. } => {
                assert_eq!(quantity.inner(), dec!(0.416667));
                assert_eq!(time_in_force, sniper_core::TimeInForce::GoodTilCancelled);
            }
            OrderKind::QuoteMarket { .. } => panic!("sell must be a limit order"),
        }
    }

    #[tokio::test]
    async fn test_no_fill_places_nothing() {
        let gateway = Arc::new(MockGateway::new());
        let attempts = [attempt(0, AttemptStatus::NoFill, Decimal::ZERO, Decimal::ZERO)];
        let outcome = placer(gateway.clone())
            .settle(limit_plan(), &attempts, dec!(200))
            .await;
        assert_eq!(outcome, RunOutcome::NoBuy);
        assert!(gateway.placed().is_empty());
    }

    #[tokio::test]
    async fn test_unreconciled_only_is_failed() {
        let gateway = Arc::new(MockGateway::new());
        let attempts = [attempt(
            0,
            AttemptStatus::Error(AttemptErrorKind::Reconciliation),
            Decimal::ZERO,
            Decimal::ZERO,
        )];
        let outcome = placer(gateway.clone())
            .settle(limit_plan(), &attempts, dec!(200))
            .await;
        assert!(matches!(outcome, RunOutcome::Failed { .. }));
        assert!(gateway.placed().is_empty());
    }

    #[tokio::test]
    async fn test_sell_rejection_is_failed() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_placement(MockPlacement::Reject {
            code: 30005,
            msg: "Oversold".to_string(),
        });
        let attempts = [attempt(0, AttemptStatus::Filled, dec!(1), dec!(120))];
        let outcome = placer(gateway.clone())
            .settle(limit_plan(), &attempts, dec!(200))
            .await;
        match outcome {
            RunOutcome::Failed { reason } => assert!(reason.contains("Oversold")),
            other => panic!("expected Failed, got {other:?}"),
        }
        // No retry.
        assert_eq!(gateway.placed().len(), 1);
    }

    #[tokio::test]
    async fn test_low_priced_market_fill_sells_what_was_bought() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_placement(MockPlacement::ack("sell-1"));
        let attempts = [attempt(0, AttemptStatus::Filled, dec!(400000000), dec!(50))];

        let outcome = placer(gateway.clone())
            .settle(ExecutionPlan::Market, &attempts, dec!(200))
            .await;

        match outcome {
            RunOutcome::BoughtAndListed { bought_qty, sell, .. } => {
                assert_eq!(bought_qty.inner(), dec!(400000000));
                assert_eq!(sell.plan.quantity.inner(), dec!(400000000));
                assert_eq!(sell.plan.price.inner(), dec!(0.00000038));
            }
            other => panic!("expected BoughtAndListed, got {other:?}"),
        }
        match gateway.placed()[0].order.kind {
            OrderKind::Limit { quantity, .. } => {
                assert!(quantity.inner() <= dec!(400000000));
            }
            OrderKind::QuoteMarket { .. } => panic!("sell must be a limit order"),
        }
    }

    #[tokio::test]
    async fn test_sub_tick_market_fill_is_still_listed() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_placement(MockPlacement::ack("sell-1"));
        // Realized 0.0000000025; tripled 0.0000000075 rounds up to one tick.
        let attempts = [attempt(0, AttemptStatus::Filled, dec!(20000000000), dec!(50))];

        let outcome = placer(gateway.clone())
            .settle(ExecutionPlan::Market, &attempts, dec!(200))
            .await;

        match outcome {
            RunOutcome::BoughtAndListed { bought_qty, sell, .. } => {
                assert_eq!(bought_qty.inner(), dec!(20000000000));
                assert_eq!(sell.plan.quantity.inner(), dec!(20000000000));
                assert_eq!(sell.plan.price.inner(), dec!(0.00000001));
            }
            other => panic!("expected BoughtAndListed, got {other:?}"),
        }
        assert_eq!(gateway.placed().len(), 1);
    }

    #[tokio::test]
    async fn test_unpriceable_fill_is_failed_not_no_buy() {
        let gateway = Arc::new(MockGateway::new());
        // Realized 0.0000000005; tripled it still rounds to zero at 8dp.
        let attempts = [attempt(0, AttemptStatus::Filled, dec!(100000000000), dec!(50))];

        let outcome = placer(gateway.clone())
            .settle(ExecutionPlan::Market, &attempts, dec!(200))
            .await;

        match outcome {
            RunOutcome::Failed { reason } => assert!(reason.contains("rounds to zero")),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(gateway.placed().is_empty());
    }

    #[tokio::test]
    async fn test_dust_fill_is_failed_not_no_buy() {
        let gateway = Arc::new(MockGateway::new());
        let attempts = [attempt(0, AttemptStatus::Filled, dec!(0.0000004), dec!(0.00005))];

        let outcome = placer(gateway.clone())
            .settle(limit_plan(), &attempts, dec!(200))
            .await;

        assert!(matches!(outcome, RunOutcome::Failed { .. }));
        assert_eq!(outcome.exit_code(), 1);
        assert!(gateway.placed().is_empty());
    }
}
