//! Canonical request parameters per endpoint.
//!
//! The signature covers the exact query string, so each builder pushes its
//! fields in one fixed order:
//! - limit order: `symbol, side, type, price, quantity, timeInForce, recvWindow, timestamp`
//! - quote market order: `symbol, side, type, quoteOrderQty, recvWindow, timestamp`
//! - order status: `symbol, orderId, recvWindow, timestamp`

use rust_decimal::Decimal;
use sniper_core::{OrderSide, OrderType, Price, Size, TimeInForce};

/// Ordered `key=value` pairs.
///
/// Values are expected to be URL-safe ASCII (symbols, enum spellings,
/// decimals, numeric ids) and are emitted without percent-encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &'static str, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key, value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(k, _)| *k)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `k1=v1&k2=v2...` in insertion order.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.pairs.len() * 24);
        for (i, (k, v)) in self.pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(k);
            out.push('=');
            out.push_str(v);
        }
        out
    }
}

/// Pricing part of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// Priced limit order.
    Limit {
        price: Price,
        quantity: Size,
        time_in_force: TimeInForce,
    },
    /// Market order sized in quote currency.
    QuoteMarket { quote_qty: Decimal },
}

/// A new order, minus the timestamp which is stamped at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub recv_window_ms: u64,
}

impl NewOrder {
    /// IOC limit buy used by the timed attempts.
    pub fn limit_buy_ioc(
        symbol: impl Into<String>,
        price: Price,
        quantity: Size,
        recv_window_ms: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Buy,
            kind: OrderKind::Limit {
                price,
                quantity,
                time_in_force: TimeInForce::ImmediateOrCancel,
            },
            recv_window_ms,
        }
    }

    /// Quote-denominated market buy (empty book, and the warmup request).
    pub fn market_buy(symbol: impl Into<String>, quote_qty: Decimal, recv_window_ms: u64) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Buy,
            kind: OrderKind::QuoteMarket { quote_qty },
            recv_window_ms,
        }
    }

    /// GTC take-profit sell.
    pub fn limit_sell_gtc(
        symbol: impl Into<String>,
        price: Price,
        quantity: Size,
        recv_window_ms: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Sell,
            kind: OrderKind::Limit {
                price,
                quantity,
                time_in_force: TimeInForce::GoodTilCancelled,
            },
            recv_window_ms,
        }
    }

    pub fn order_type(&self) -> OrderType {
        match self.kind {
            OrderKind::Limit { .. } => OrderType::Limit,
            OrderKind::QuoteMarket { .. } => OrderType::Market,
        }
    }

    /// Canonical parameters for `POST /api/v3/order`.
    pub fn to_params(&self, timestamp_ms: u64) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push("symbol", self.symbol.as_str())
            .push("side", self.side.as_wire())
            .push("type", self.order_type().as_wire());
        match self.kind {
            OrderKind::Limit {
                price,
                quantity,
                time_in_force,
            } => {
                params
                    .push("price", price.to_wire())
                    .push("quantity", quantity.to_wire())
                    .push("timeInForce", time_in_force.as_wire());
            }
            OrderKind::QuoteMarket { quote_qty } => {
                params.push("quoteOrderQty", quote_qty.normalize().to_string());
            }
        }
        params
            .push("recvWindow", self.recv_window_ms.to_string())
            .push("timestamp", timestamp_ms.to_string());
        params
    }
}

/// Canonical parameters for `GET /api/v3/order`.
pub fn order_status_params(
    symbol: &str,
    order_id: &str,
    recv_window_ms: u64,
    timestamp_ms: u64,
) -> QueryParams {
    let mut params = QueryParams::new();
    params
        .push("symbol", symbol)
        .push("orderId", order_id)
        .push("recvWindow", recv_window_ms.to_string())
        .push("timestamp", timestamp_ms.to_string());
    params
}
