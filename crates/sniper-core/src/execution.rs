//! Execution-related types for a single sniping run.
//!
//! This module provides types for:
//! - The pricing branch chosen before the window (`ExecutionPlan`)
//! - Per-attempt records (`OrderAttempt`, `AttemptStatus`)
//! - The take-profit sell (`SellPlan`, `SellReport`)
//! - The run's final classification (`RunOutcome`)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Price, Size};

// ============================================================================
// Plan
// ============================================================================

/// Pricing branch selected by the order-book probe.
///
/// Every consumer must handle both variants: quantity math is only known
/// up-front in limit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ExecutionPlan {
    /// Book had asks: IOC limit buys at a marked-up price.
    Limit {
        /// Best ask observed at probe time.
        best_ask: Price,
        /// Limit price sent with every buy attempt.
        price: Price,
    },
    /// Book was empty: quote-denominated market buys.
    Market,
}

impl ExecutionPlan {
    pub fn is_market(&self) -> bool {
        matches!(self, Self::Market)
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit { best_ask, price } => write!(f, "limit(ask={best_ask}, px={price})"),
            Self::Market => f.write_str("market"),
        }
    }
}

/// How T0 was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// First trade observed on the public stream.
    FirstTrade,
    /// Announced listing time (market mode).
    Announced,
    /// Stream stayed silent past its budget.
    DeadlineFallback,
    /// Stream could not be opened or broke before a trade arrived.
    StreamFailed,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstTrade => "first_trade",
            Self::Announced => "announced",
            Self::DeadlineFallback => "deadline_fallback",
            Self::StreamFailed => "stream_failed",
        }
    }
}

// ============================================================================
// Attempts
// ============================================================================

/// Why an attempt ended in error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptErrorKind {
    /// Placement was rejected or never reached the exchange.
    Request,
    /// Placement was sent but no readable answer came back (timeout after
    /// sending, undecodable ack). The order may exist and may have filled.
    Unconfirmed,
    /// Placement was acknowledged but the status query failed.
    /// The order may have filled.
    Reconciliation,
}

/// Terminal state of one buy attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "kind", rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Executed quantity confirmed strictly positive.
    Filled,
    /// Valid order, nothing executed.
    NoFill,
    Error(AttemptErrorKind),
}

impl AttemptStatus {
    /// Short label for tables and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Filled => "OK",
            Self::NoFill => "NOFILL",
            Self::Error(AttemptErrorKind::Request) => "ERR",
            Self::Error(AttemptErrorKind::Unconfirmed | AttemptErrorKind::Reconciliation) => {
                "UNKNOWN"
            }
        }
    }

    /// True when the exchange may hold a fill we could not confirm.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Self::Error(AttemptErrorKind::Unconfirmed | AttemptErrorKind::Reconciliation)
        )
    }
}

/// One outbound buy placement.
///
/// Created at send time, finalized after reconciliation, immutable after
/// being appended to the attempt log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAttempt {
    /// Position in the offset schedule (0-based).
    pub index: usize,
    /// Offset from T0 this attempt was scheduled at.
    pub offset_ms: i64,
    /// Scheduled fire time (local wall clock).
    pub scheduled_at: DateTime<Utc>,
    /// Actual send time (local wall clock).
    pub sent_at: DateTime<Utc>,
    /// Placement response receive time (local wall clock).
    pub received_at: DateTime<Utc>,
    /// Placement round trip in milliseconds.
    pub latency_ms: f64,
    /// Exchange order id, when the placement was acknowledged.
    pub order_id: Option<String>,
    pub status: AttemptStatus,
    /// Base quantity executed (zero unless `Filled`).
    pub executed_qty: Size,
    /// Quote value acquired (zero unless `Filled`).
    pub quote_spent: Decimal,
    /// Acquisition price: the limit price, or the realized average in market mode.
    pub price: Price,
    /// Exchange message or local error text.
    pub message: String,
}

impl OrderAttempt {
    pub fn is_filled(&self) -> bool {
        self.status == AttemptStatus::Filled
    }
}

// ============================================================================
// Sell
// ============================================================================

/// Take-profit sell parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellPlan {
    pub price: Price,
    pub quantity: Size,
}

impl SellPlan {
    /// Compute the sell from what was bought.
    ///
    /// `sell_price = round(buy_price * (1 + profit_pct / 100), price_decimals)`
    /// `sell_qty = trunc(bought_qty, qty_decimals)`
    ///
    /// `buy_price` must be unrounded (the realized average in market mode);
    /// only the final sell price is rounded. The sell quantity is the
    /// bought quote divided by that price, which is the bought quantity
    /// itself, so it never exceeds what was bought.
    ///
    /// Returns `None` when nothing (or a rounding residue) was bought.
    /// The sell price may still round to zero for very cheap tokens.
    pub fn compute(
        bought_qty: Size,
        buy_price: Price,
        profit_pct: Decimal,
        price_decimals: u32,
        qty_decimals: u32,
    ) -> Option<Self> {
        if !bought_qty.is_positive() || !buy_price.is_positive() {
            return None;
        }
        let quantity = bought_qty.truncate_dp(qty_decimals);
        if !quantity.is_positive() {
            return None;
        }
        Some(Self {
            price: buy_price.apply_pct(profit_pct, price_decimals),
            quantity,
        })
    }
}

/// Result of the sell submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellReport {
    pub plan: SellPlan,
    pub order_id: String,
    pub sent_at: DateTime<Utc>,
    pub latency_ms: f64,
}

// ============================================================================
// Outcome
// ============================================================================

/// Final classification of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// No attempt filled; nothing to sell.
    NoBuy,
    /// Some quantity was bought and the take-profit sell is resting.
    BoughtAndListed {
        bought_qty: Size,
        bought_quote: Decimal,
        sell: SellReport,
    },
    /// Automated path ended with capital possibly deployed; needs a human.
    Failed { reason: String },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoBuy => "no_buy",
            Self::BoughtAndListed { .. } => "bought_and_listed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoBuy | Self::BoughtAndListed { .. } => 0,
            Self::Failed { .. } => 1,
        }
    }
}
