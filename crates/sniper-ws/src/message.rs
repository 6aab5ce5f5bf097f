//! Stream message types.
//!
//! Outbound control messages are `{"method": .., "params": [..], "id": ..}`.
//! Inbound frames are either control acknowledgements or channel events;
//! trade events are recognised by `"e": "trade"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WsError, WsResult};

/// Subscribe control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    pub method: &'static str,
    pub params: Vec<String>,
    pub id: u64,
}

impl SubscribeRequest {
    /// Trade channel for `symbol` (lower-cased on the wire).
    pub fn trades(symbol: &str) -> Self {
        Self {
            method: "SUBSCRIBE",
            params: vec![trade_channel(symbol)],
            id: 1,
        }
    }
}

/// `<symbol lowercase>@trade`
pub fn trade_channel(symbol: &str) -> String {
    format!("{}@trade", symbol.to_lowercase())
}

/// Keepalive control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PingRequest {
    pub method: &'static str,
}

impl Default for PingRequest {
    fn default() -> Self {
        Self { method: "PING" }
    }
}

/// One public trade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeEvent {
    /// Symbol as reported by the stream, when present.
    #[serde(rename = "s", default)]
    pub symbol: Option<String>,
    #[serde(rename = "p", default)]
    pub price: Option<String>,
    #[serde(rename = "q", default)]
    pub quantity: Option<String>,
    /// Exchange trade time (ms).
    #[serde(rename = "T", default)]
    pub trade_time: Option<u64>,
}

impl TradeEvent {
    /// True unless the event names a different symbol.
    pub fn is_for(&self, symbol: &str) -> bool {
        self.symbol
            .as_deref()
            .map_or(true, |s| s.eq_ignore_ascii_case(symbol))
    }
}

/// Classified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    Trade(TradeEvent),
    /// Control acknowledgement (`{"id":1,"code":0,"msg":"..."}`).
    Ack { id: Option<u64>, code: i64, msg: String },
    Pong,
    Other,
}

impl StreamMessage {
    pub fn parse(text: &str) -> WsResult<Self> {
        let value: Value = serde_json::from_str(text)?;

        if value.get("e").and_then(Value::as_str) == Some("trade") {
            let trade = serde_json::from_value(value)
                .map_err(|e| WsError::ParseError(format!("trade event: {e}")))?;
            return Ok(Self::Trade(trade));
        }

        if value.get("msg").and_then(Value::as_str) == Some("PONG") {
            return Ok(Self::Pong);
        }

        if let Some(code) = value.get("code").and_then(Value::as_i64) {
            return Ok(Self::Ack {
                id: value.get("id").and_then(Value::as_u64),
                code,
                msg: value
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        Ok(Self::Other)
    }
}
