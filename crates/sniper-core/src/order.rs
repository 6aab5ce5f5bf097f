//! Order-related enums.
//!
//! Provides order side, type and time-in-force with their exchange wire
//! spellings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Priced limit order.
    Limit,
    /// Quote-denominated market order.
    Market,
}

impl OrderType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Time-in-force for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled (take-profit sell).
    #[serde(rename = "GTC")]
    GoodTilCancelled,
    /// Immediate-or-cancel (timed buys).
    #[default]
    #[serde(rename = "IOC")]
    ImmediateOrCancel,
}

impl TimeInForce {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::GoodTilCancelled => "GTC",
            Self::ImmediateOrCancel => "IOC",
        }
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_spellings() {
        assert_eq!(OrderSide::Buy.to_string(), "BUY");
        assert_eq!(OrderType::Market.to_string(), "MARKET");
        assert_eq!(TimeInForce::GoodTilCancelled.to_string(), "GTC");
        assert_eq!(TimeInForce::default(), TimeInForce::ImmediateOrCancel);
    }

    #[test]
    fn test_serde_matches_wire() {
        let json = serde_json::to_string(&TimeInForce::ImmediateOrCancel).unwrap();
        assert_eq!(json, "\"IOC\"");
        let side: OrderSide = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(side, OrderSide::Sell);
    }
}
