//! Listing record handed to a run.
//!
//! The record is produced by the external listing scheduler as a JSON file
//! and is read once at process start. It is never mutated afterwards.

use crate::error::{CoreError, Result};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

/// Exchange API secret.
///
/// Never log secret material: `Debug` and `Display` print a placeholder and
/// the buffer is zeroed on drop.
#[derive(Clone)]
pub struct ApiSecret(Zeroizing<String>);

impl ApiSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Raw secret bytes, for the request signer only.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for ApiSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl Serialize for ApiSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

/// One listing to snipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSpec {
    /// Record id assigned by the scheduler.
    #[serde(default)]
    pub id: Option<String>,
    /// Exchange name as entered by the user (informational).
    #[serde(default)]
    pub exchange: Option<String>,
    pub api_key: String,
    pub api_secret: ApiSecret,
    /// Trading pair, e.g. "NEWUSDT". Upper-cased on load.
    pub symbol: String,
    /// Quote currency to spend on the buy.
    pub quote_amount: Decimal,
    /// Announced listing instant, timezone-aware.
    pub listing_time: DateTime<FixedOffset>,
    /// Buy limit = best ask * (1 + markup / 100).
    #[serde(default = "default_price_markup_pct")]
    pub price_markup_pct: Decimal,
    /// Sell limit = buy price * (1 + profit / 100).
    #[serde(default = "default_profit_pct")]
    pub profit_pct: Decimal,
}

fn default_price_markup_pct() -> Decimal {
    Decimal::from(20)
}

fn default_profit_pct() -> Decimal {
    Decimal::from(200)
}

impl ListingSpec {
    /// Load and validate a listing record from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a listing record.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut spec: Self = serde_json::from_str(json)?;
        spec.symbol = spec.symbol.trim().to_uppercase();
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(CoreError::InvalidListing("symbol is empty".to_string()));
        }
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(CoreError::InvalidListing(
                "api credentials are missing".to_string(),
            ));
        }
        if self.quote_amount <= Decimal::ZERO {
            return Err(CoreError::InvalidListing(format!(
                "quote_amount must be positive, got {}",
                self.quote_amount
            )));
        }
        if self.price_markup_pct < Decimal::ZERO {
            return Err(CoreError::InvalidListing(format!(
                "price_markup_pct must not be negative, got {}",
                self.price_markup_pct
            )));
        }
        if self.profit_pct <= -Decimal::ONE_HUNDRED {
            return Err(CoreError::InvalidListing(format!(
                "profit_pct must be above -100, got {}",
                self.profit_pct
            )));
        }
        Ok(())
    }

    /// Announced listing instant in Unix milliseconds (exchange clock).
    pub fn listing_ms(&self) -> u64 {
        self.listing_time.timestamp_millis().max(0) as u64
    }
}
