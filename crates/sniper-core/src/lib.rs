//! Core domain types for the listing sniper.
//!
//! This crate provides the values that flow through a single sniping run:
//! - `ListingSpec`: the immutable listing record handed to the run
//! - `Price`, `Size`: precision-safe numeric types
//! - `ClockOffset`: server-minus-local clock correction
//! - `ExecutionPlan`: limit vs market branch chosen by the order-book probe
//! - `OrderAttempt`, `AttemptStatus`, `RunOutcome`: the attempt log and result

pub mod clock;
pub mod decimal;
pub mod error;
pub mod execution;
pub mod listing;
pub mod order;

pub use clock::ClockOffset;
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use execution::{
    AttemptErrorKind, AttemptStatus, ExecutionPlan, OrderAttempt, RunOutcome, SellPlan,
    SellReport, TriggerSource,
};
pub use listing::{ApiSecret, ListingSpec};
pub use order::{OrderSide, OrderType, TimeInForce};
