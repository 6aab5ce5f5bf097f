//! Error types for sniper-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid listing: {0}")]
    InvalidListing(String),

    #[error("Listing read failed: {0}")]
    ListingIo(#[from] std::io::Error),

    #[error("Listing parse failed: {0}")]
    ListingParse(#[from] serde_json::Error),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
