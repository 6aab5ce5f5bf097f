//! Listing sniper.
//!
//! Runs one listing end to end:
//! - Clock sync, pre-window wait, warmup and order-book probe
//! - Trigger detection on the public trade stream (or the announced time)
//! - Timed buy attempts with fill reconciliation
//! - A single take-profit sell and the attempt log

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
