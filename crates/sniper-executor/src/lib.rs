//! Timed buy execution for a new listing.
//!
//! Provides:
//! - Clock synchronization against the exchange (`ClockSynchronizer`, `ServerClock`)
//! - Connection warmup and order-book probing before the window
//! - Trigger detection (first trade, or the announced time with a deadline)
//! - The execution scheduler: offset attempts, spin-wait, single-fire latch
//! - Fill reconciliation and the take-profit sell
//!
//! All exchange I/O goes through `ExchangeGateway`, implemented by
//! `sniper_rest::RestClient` and by `MockGateway` for tests.

pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod probe;
pub mod reconcile;
pub mod scheduler;
pub mod sell;
pub mod spin;
pub mod state;
pub mod trigger;
pub mod warmup;

pub use clock::{Clock, ClockSynchronizer, ServerClock, SystemClock};
pub use config::ExecutorConfig;
pub use error::{ExecutorError, ExecutorResult};
pub use gateway::{
    mock_status_report, BoxFuture, DynGateway, ExchangeGateway, MockGateway, MockPlacement,
    MockStatus, PlacedOrder,
};
pub use probe::OrderBookProber;
pub use reconcile::{FillReconciler, ReconciledFill};
pub use scheduler::{ExecutionScheduler, ScheduleResult};
pub use sell::{BuySummary, SellPlacer};
pub use spin::{precise_wait_until, spin_until};
pub use state::{ExecutionState, FillLatch};
pub use trigger::{Trigger, TriggerDetector};
pub use warmup::ConnectionWarmer;
