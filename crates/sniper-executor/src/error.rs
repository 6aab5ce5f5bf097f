//! Executor error types.
//!
//! Per-attempt failures never surface here; they are recorded on the
//! attempt itself. Only run-level failures propagate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Clock sync or probe could not complete; nothing was sent.
    #[error("Setup failed: {0}")]
    Setup(String),

    /// Take-profit sell was not accepted; bought quantity is unhedged.
    #[error("Sell failed: {0}")]
    Sell(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
