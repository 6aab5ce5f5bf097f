//! Wire types for the MEXC spot v3 REST responses used by a run.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sniper_core::{Price, Size};
use std::str::FromStr;

/// `GET /api/v3/time`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ServerTime {
    #[serde(rename = "serverTime")]
    pub server_time: u64,
}

/// `GET /api/v3/depth`
///
/// Levels are `[price, quantity]` string pairs, best first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepthSnapshot {
    #[serde(default)]
    pub bids: Vec<(Price, Size)>,
    #[serde(default)]
    pub asks: Vec<(Price, Size)>,
}

impl DepthSnapshot {
    /// First ask level with a positive price.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks
            .first()
            .map(|(price, _)| *price)
            .filter(Price::is_positive)
    }
}

/// Placement acknowledgement from `POST /api/v3/order`.
///
/// Only `orderId` is guaranteed; execution fields are frequently absent or
/// stale at ack time.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "orderId", deserialize_with = "de_order_id")]
    pub order_id: String,
    #[serde(rename = "executedQty", default, deserialize_with = "de_lenient_decimal")]
    pub executed_qty: Decimal,
    #[serde(
        rename = "cummulativeQuoteQty",
        default,
        deserialize_with = "de_lenient_decimal"
    )]
    pub cummulative_quote_qty: Decimal,
}

impl OrderAck {
    pub fn executed(&self) -> Size {
        Size::new(self.executed_qty)
    }
}

/// Authoritative order state from `GET /api/v3/order`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusReport {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "orderId", deserialize_with = "de_order_id")]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "de_lenient_decimal")]
    pub price: Decimal,
    #[serde(rename = "origQty", default, deserialize_with = "de_lenient_decimal")]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty", default, deserialize_with = "de_lenient_decimal")]
    pub executed_qty: Decimal,
    #[serde(
        rename = "cummulativeQuoteQty",
        default,
        deserialize_with = "de_lenient_decimal"
    )]
    pub cummulative_quote_qty: Decimal,
}

/// Error body returned with a rejected request.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

fn de_order_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "orderId must be a string or number, got {other}"
        ))),
    }
}

/// Decimal from a string or number; `null` and `""` read as zero.
fn de_lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Decimal::ZERO),
        Value::String(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        Value::String(s) => Decimal::from_str(s.trim()).map_err(serde::de::Error::custom),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected decimal, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_depth_best_ask() {
        let depth: DepthSnapshot = serde_json::from_str(
            r#"{"lastUpdateId":1,"bids":[["99.5","3"]],"asks":[["100.0","1.5"],["101","2"]]}"#,
        )
        .unwrap();
        assert_eq!(depth.best_ask(), Some(Price::new(dec!(100))));
    }

    #[test]
    fn test_depth_empty_book() {
        let depth: DepthSnapshot =
            serde_json::from_str(r#"{"lastUpdateId":1,"bids":[],"asks":[]}"#).unwrap();
        assert_eq!(depth.best_ask(), None);
    }

    #[test]
    fn test_ack_numeric_order_id_and_missing_fill() {
        let ack: OrderAck =
            serde_json::from_str(r#"{"symbol":"NEWUSDT","orderId":123456789}"#).unwrap();
        assert_eq!(ack.order_id, "123456789");
        assert!(ack.executed().is_zero());
    }

    #[test]
    fn test_ack_string_order_id_with_fill() {
        let ack: OrderAck = serde_json::from_str(
            r#"{"symbol":"NEWUSDT","orderId":"C02__4471","executedQty":"0.4","price":"120"}"#,
        )
        .unwrap();
        assert_eq!(ack.order_id, "C02__4471");
        assert_eq!(ack.executed_qty, dec!(0.4));
    }

    #[test]
    fn test_status_report() {
        let report: OrderStatusReport = serde_json::from_str(
            r#"{"symbol":"NEWUSDT","orderId":"C02__4471","price":"","origQty":"0.416667",
                "executedQty":"0.416667","cummulativeQuoteQty":"49.5","status":"FILLED"}"#,
        )
        .unwrap();
        assert_eq!(report.status, "FILLED");
        assert_eq!(report.price, Decimal::ZERO);
        assert_eq!(report.cummulative_quote_qty, dec!(49.5));
        assert_eq!(report.executed_qty, dec!(0.416667));
    }

    #[test]
    fn test_error_body() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"code":30004,"msg":"Insufficient position"}"#).unwrap();
        assert_eq!(body.code, 30004);
    }
}
