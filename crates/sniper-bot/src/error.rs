//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("REST client error: {0}")]
    Rest(#[from] sniper_rest::RestError),

    #[error("Executor error: {0}")]
    Executor(#[from] sniper_executor::ExecutorError),
}

pub type AppResult<T> = Result<T, AppError>;
