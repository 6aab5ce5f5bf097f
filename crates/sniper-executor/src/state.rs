//! Shared run-scoped execution state.
//!
//! The fill latch and the remaining-quote counter are the only mutable
//! state shared between concurrent buy attempts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use sniper_core::ExecutionPlan;
use tracing::info;

/// Single-fire success flag.
///
/// Once set it stays set for the rest of the run. Every attempt checks it
/// immediately before network I/O and skips when it is set.
#[derive(Debug, Default)]
pub struct FillLatch {
    latched: AtomicBool,
    /// Attempt index and instant of the first set.
    first: Mutex<Option<(usize, Instant)>>,
}

impl FillLatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.latched.load(Ordering::Acquire)
    }

    /// Set the latch. Returns true for the first caller only.
    ///
    /// Setting an already-set latch is a no-op and keeps the original
    /// attempt index and instant.
    pub fn set(&self, attempt_index: usize) -> bool {
        if self.latched.swap(true, Ordering::AcqRel) {
            return false;
        }
        *self.first.lock() = Some((attempt_index, Instant::now()));
        info!(attempt = attempt_index + 1, "Fill confirmed, remaining attempts stand down");
        true
    }

    /// Instant of the first set.
    pub fn set_at(&self) -> Option<Instant> {
        self.first.lock().map(|(_, at)| at)
    }

    /// Attempt that set the latch first.
    pub fn first_attempt(&self) -> Option<usize> {
        self.first.lock().map(|(index, _)| index)
    }
}

/// Plan, budget and latch for one run.
#[derive(Debug)]
pub struct ExecutionState {
    plan: ExecutionPlan,
    initial_quote: Decimal,
    remaining_quote: Mutex<Decimal>,
    latch: FillLatch,
}

impl ExecutionState {
    pub fn new(plan: ExecutionPlan, quote_amount: Decimal) -> Self {
        Self {
            plan,
            initial_quote: quote_amount,
            remaining_quote: Mutex::new(quote_amount),
            latch: FillLatch::new(),
        }
    }

    pub fn plan(&self) -> ExecutionPlan {
        self.plan
    }

    pub fn initial_quote(&self) -> Decimal {
        self.initial_quote
    }

    pub fn remaining_quote(&self) -> Decimal {
        *self.remaining_quote.lock()
    }

    /// Deduct a confirmed spend; never goes below zero.
    pub fn consume(&self, quote_spent: Decimal) -> Decimal {
        let mut remaining = self.remaining_quote.lock();
        *remaining = (*remaining - quote_spent).max(Decimal::ZERO);
        *remaining
    }

    pub fn latch(&self) -> &FillLatch {
        &self.latch
    }
}
