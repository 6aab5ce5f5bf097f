//! Execution scheduler.
//!
//! Fans out one task per configured offset around T0. Each task waits for
//! its own fire instant, checks the fill latch, signs a fresh request and
//! sends it. Attempts already in flight when the latch is set run to
//! completion; attempts that have not yet passed the check never send.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sniper_core::{AttemptErrorKind, AttemptStatus, ExecutionPlan, OrderAttempt, Price, Size};
use sniper_rest::{NewOrder, OrderAck};
use sniper_telemetry::Metrics;
use tracing::{debug, error, info, warn};

use crate::clock::ServerClock;
use crate::config::ExecutorConfig;
use crate::gateway::DynGateway;
use crate::reconcile::{FillReconciler, ReconciledFill};
use crate::spin::{offset_instant, precise_wait_until};
use crate::state::ExecutionState;
use crate::trigger::Trigger;

/// Attempts that were sent, in schedule order, plus how many stood down.
#[derive(Debug, Clone, Default)]
pub struct ScheduleResult {
    pub attempts: Vec<OrderAttempt>,
    pub skipped: usize,
}

pub struct ExecutionScheduler {
    gateway: DynGateway,
    clock: Arc<ServerClock>,
    reconciler: FillReconciler,
    symbol: String,
    offsets_ms: Vec<i64>,
    spin_window: Duration,
    recv_window_ms: u64,
    qty_decimals: u32,
}

impl ExecutionScheduler {
    pub fn new(
        gateway: DynGateway,
        clock: Arc<ServerClock>,
        symbol: impl Into<String>,
        config: &ExecutorConfig,
    ) -> Self {
        let reconciler = FillReconciler::new(
            Arc::clone(&gateway),
            Arc::clone(&clock),
            config.fill_grace,
            config.recv_window_ms,
        );
        Self {
            gateway,
            clock,
            reconciler,
            symbol: symbol.into(),
            offsets_ms: config.attempt_offsets_ms.clone(),
            spin_window: config.spin_window,
            recv_window_ms: config.recv_window_ms,
            qty_decimals: config.qty_decimals,
        }
    }

    /// Fire every attempt around `trigger` and wait for all of them.
    pub async fn run(
        self: &Arc<Self>,
        state: Arc<ExecutionState>,
        trigger: Trigger,
    ) -> ScheduleResult {
        info!(
            symbol = %self.symbol,
            plan = %state.plan(),
            offsets_ms = ?self.offsets_ms,
            "Scheduling buy attempts"
        );

        let handles: Vec<_> = self
            .offsets_ms
            .iter()
            .enumerate()
            .map(|(index, &offset_ms)| {
                let this = Arc::clone(self);
                let state = Arc::clone(&state);
                tokio::spawn(async move { this.fire(index, offset_ms, &trigger, &state).await })
            })
            .collect();

        let mut result = ScheduleResult::default();
        for handle in handles {
            match handle.await {
                Ok(Some(attempt)) => result.attempts.push(attempt),
                Ok(None) => result.skipped += 1,
                Err(e) => {
                    error!(error = %e, "Attempt task failed");
                    result.skipped += 1;
                }
            }
        }
        // Completion order is not fire order.
        result.attempts.sort_by_key(|a| a.index);
        result
    }

    /// One attempt. `None` when it stood down before sending.
    async fn fire(
        &self,
        index: usize,
        offset_ms: i64,
        trigger: &Trigger,
        state: &ExecutionState,
    ) -> Option<OrderAttempt> {
        let fire_at = offset_instant(trigger.at, offset_ms);
        precise_wait_until(fire_at, self.spin_window).await;

        if state.latch().is_set() {
            debug!(nr = index + 1, offset_ms, "Fill already confirmed, not sending");
            return None;
        }
        let Some(order) = self.build_order(state) else {
            debug!(nr = index + 1, offset_ms, "Nothing left to buy, not sending");
            return None;
        };

        let scheduled_at = wall_time(trigger.local_ms as i64 + offset_ms);
        let timestamp = self.clock.server_now_ms();
        let sent_at = Utc::now();
        let started = Instant::now();
        let result = self.gateway.place_order(&order, timestamp).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let received_at = Utc::now();
        Metrics::order_latency("buy", latency_ms);

        let mut attempt = OrderAttempt {
            index,
            offset_ms,
            scheduled_at,
            sent_at,
            received_at,
            latency_ms,
            order_id: None,
            status: AttemptStatus::Error(AttemptErrorKind::Request),
            executed_qty: Size::ZERO,
            quote_spent: Decimal::ZERO,
            price: Price::ZERO,
            message: String::new(),
        };

        let ack = match result {
            Ok(ack) => ack,
            Err(e) if e.is_ambiguous() => {
                // May be live or already filled on the exchange.
                error!(nr = index + 1, error = %e, latency_ms, "Buy placement outcome unknown");
                attempt.status = AttemptStatus::Error(AttemptErrorKind::Unconfirmed);
                attempt.message = format!("placement outcome unknown: {e}");
                return Some(attempt);
            }
            Err(e) => {
                warn!(nr = index + 1, error = %e, latency_ms, "Buy attempt rejected");
                attempt.message = e.to_string();
                return Some(attempt);
            }
        };
        attempt.order_id = Some(ack.order_id.clone());
        debug!(nr = index + 1, order_id = %ack.order_id, latency_ms, "Buy attempt acknowledged");

        // The ack already proves a fill; stand the others down now.
        if ack.executed().is_positive() {
            state.latch().set(index);
        }

        let reconciled = self.reconciler.reconcile(&self.symbol, &ack.order_id).await;
        self.settle(&mut attempt, &order, &ack, reconciled, state);
        Some(attempt)
    }

    fn build_order(&self, state: &ExecutionState) -> Option<NewOrder> {
        let remaining = state.remaining_quote();
        if remaining <= Decimal::ZERO {
            return None;
        }
        match state.plan() {
            ExecutionPlan::Limit { price, .. } => {
                let quantity = Size::for_quote(remaining, price, self.qty_decimals);
                quantity.is_positive().then(|| {
                    NewOrder::limit_buy_ioc(
                        self.symbol.as_str(),
                        price,
                        quantity,
                        self.recv_window_ms,
                    )
                })
            }
            ExecutionPlan::Market => Some(NewOrder::market_buy(
                self.symbol.as_str(),
                remaining,
                self.recv_window_ms,
            )),
        }
    }

    /// Classify the attempt from the status query (or the ack, if the
    /// query failed) and record the spend. The latch is set last.
    fn settle(
        &self,
        attempt: &mut OrderAttempt,
        order: &NewOrder,
        ack: &OrderAck,
        reconciled: sniper_rest::RestResult<ReconciledFill>,
        state: &ExecutionState,
    ) {
        let ack_qty = ack.executed();
        let (executed_qty, reported_quote) = match reconciled {
            Ok(fill) => {
                attempt.message = fill.status.clone();
                // The ack quantity is a confirmed lower bound.
                if ack_qty.inner() > fill.executed_qty.inner() {
                    (ack_qty, ack.cummulative_quote_qty)
                } else {
                    (fill.executed_qty, fill.cummulative_quote_qty)
                }
            }
            Err(e) if ack_qty.is_positive() => {
                warn!(
                    nr = attempt.index + 1,
                    error = %e,
                    "Status query failed, using ack quantity"
                );
                attempt.message = format!("status query failed, ack quantity used: {e}");
                (ack_qty, ack.cummulative_quote_qty)
            }
            Err(e) => {
                warn!(
                    nr = attempt.index + 1,
                    error = %e,
                    "Status query failed, fill state unknown"
                );
                attempt.status = AttemptStatus::Error(AttemptErrorKind::Reconciliation);
                attempt.message = format!("status query failed: {e}");
                return;
            }
        };

        if !executed_qty.is_positive() {
            attempt.status = AttemptStatus::NoFill;
            if let ExecutionPlan::Limit { price, .. } = state.plan() {
                attempt.price = price;
            }
            return;
        }

        let (quote_spent, price) = match state.plan() {
            ExecutionPlan::Limit { price, .. } => (executed_qty.notional(price), price),
            ExecutionPlan::Market => {
                let requested = match order.kind {
                    sniper_rest::OrderKind::QuoteMarket { quote_qty } => quote_qty,
                    sniper_rest::OrderKind::Limit { .. } => Decimal::ZERO,
                };
                let spent = if reported_quote > Decimal::ZERO {
                    reported_quote
                } else {
                    requested
                };
                // Unrounded; only the take-profit price is rounded.
                (spent, Price::new(spent / executed_qty.inner()))
            }
        };

        attempt.status = AttemptStatus::Filled;
        attempt.executed_qty = executed_qty;
        attempt.quote_spent = quote_spent;
        attempt.price = price;

        let remaining = state.consume(quote_spent);
        info!(
            nr = attempt.index + 1,
            executed_qty = %executed_qty,
            quote_spent = %quote_spent,
            remaining_quote = %remaining,
            "Buy filled"
        );
        state.latch().set(attempt.index);
    }
}

fn wall_time(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}
