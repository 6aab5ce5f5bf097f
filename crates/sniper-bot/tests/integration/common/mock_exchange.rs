//! Mock spot REST exchange for integration tests.
//!
//! Serves the four endpoints a run touches and behaves like the real venue
//! where the bot depends on it:
//! - Rejects requests with a bad `X-MEXC-APIKEY` header or HMAC signature
//! - Rejects timestamps outside `recvWindow` of its own clock
//! - Fills buys according to a FIFO script, in arrival order
//! - Records every signed order request

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const API_KEY: &str = "mx0vgl-test-key";
pub const API_SECRET: &str = "0f1e2d3c-test-secret";

/// How the next accepted buy executes.
#[derive(Debug, Clone)]
pub enum BuyFill {
    /// Fill the requested limit quantity in full at the limit price.
    Requested,
    /// Market fill with the given executed quantity and quote spent.
    Market { qty: &'static str, quote: &'static str },
    /// IOC expired with nothing executed.
    Nothing,
}

/// One signed order request as received.
#[derive(Debug, Clone)]
pub struct RecordedOrder {
    /// Query string without the signature.
    pub payload: String,
    pub params: Vec<(String, String)>,
    /// Exchange answered with an error.
    pub rejected: bool,
}

impl RecordedOrder {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.params.iter().map(|(k, _)| k.as_str()).collect()
    }
}

struct ExchangeState {
    server_offset_ms: i64,
    asks: Mutex<Vec<[String; 2]>>,
    fills: Mutex<VecDeque<BuyFill>>,
    statuses: Mutex<HashMap<String, Value>>,
    orders: Mutex<Vec<RecordedOrder>>,
    status_queries: AtomicUsize,
    bad_signatures: AtomicUsize,
    next_id: AtomicU64,
}

impl ExchangeState {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis() + self.server_offset_ms
    }

    /// Check key, signature and time window. Returns the parsed params.
    fn authenticate(
        &self,
        headers: &HeaderMap,
        query: Option<String>,
    ) -> Result<(String, Vec<(String, String)>), (StatusCode, Json<Value>)> {
        let query = query.unwrap_or_default();
        let key_ok = headers
            .get("X-MEXC-APIKEY")
            .and_then(|v| v.to_str().ok())
            == Some(API_KEY);
        let Some((payload, signature)) = query.rsplit_once("&signature=") else {
            self.bad_signatures.fetch_add(1, Ordering::SeqCst);
            return Err(reject(700002, "Signature for this request is not valid."));
        };
        if !key_ok || signature != sign(payload) {
            self.bad_signatures.fetch_add(1, Ordering::SeqCst);
            return Err(reject(700002, "Signature for this request is not valid."));
        }

        let params = parse_params(payload);
        let field = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.parse::<i64>().ok())
        };
        let (Some(timestamp), Some(recv_window)) = (field("timestamp"), field("recvWindow")) else {
            return Err(reject(700001, "Missing timestamp or recvWindow"));
        };
        let now = self.now_ms();
        if timestamp + recv_window < now || timestamp > now + 1_000 {
            return Err(reject(
                700003,
                "Timestamp for this request is outside of the recvWindow.",
            ));
        }
        Ok((payload.to_string(), params))
    }

    fn record(&self, payload: &str, params: Vec<(String, String)>, rejected: bool) {
        self.orders.lock().push(RecordedOrder {
            payload: payload.to_string(),
            params,
            rejected,
        });
    }
}

fn sign(payload: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(API_SECRET.as_bytes()).unwrap();
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn parse_params(payload: &str) -> Vec<(String, String)> {
    payload
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn reject(code: i64, msg: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"code": code, "msg": msg})))
}

async fn server_time(State(state): State<Arc<ExchangeState>>) -> Json<Value> {
    Json(json!({"serverTime": state.now_ms()}))
}

async fn depth(State(state): State<Arc<ExchangeState>>) -> Json<Value> {
    let asks = state.asks.lock().clone();
    Json(json!({"lastUpdateId": 1, "bids": [], "asks": asks}))
}

async fn place_order(
    State(state): State<Arc<ExchangeState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<Value>) {
    let raw = query.clone().unwrap_or_default();
    let (payload, params) = match state.authenticate(&headers, query) {
        Ok(ok) => ok,
        Err(rejection) => {
            let payload = raw.split("&signature=").next().unwrap_or_default();
            state.record(payload, parse_params(payload), true);
            return rejection;
        }
    };
    let get = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };
    let symbol = get("symbol");
    let side = get("side");
    state.record(&payload, params.clone(), false);

    if side == "SELL" {
        return (
            StatusCode::OK,
            Json(json!({
                "symbol": symbol,
                "orderId": "C02__sell-1",
                "side": "SELL",
                "type": "LIMIT",
                "price": get("price"),
                "origQty": get("quantity"),
                "transactTime": state.now_ms(),
            })),
        );
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let fill = state.fills.lock().pop_front().unwrap_or(BuyFill::Nothing);
    let (executed, quote) = match fill {
        BuyFill::Requested => {
            let qty = Decimal::from_str(&get("quantity")).unwrap_or_default();
            let price = Decimal::from_str(&get("price")).unwrap_or_default();
            (qty, qty * price)
        }
        BuyFill::Market { qty, quote } => (
            Decimal::from_str(qty).unwrap_or_default(),
            Decimal::from_str(quote).unwrap_or_default(),
        ),
        BuyFill::Nothing => (Decimal::ZERO, Decimal::ZERO),
    };
    let status = if executed > Decimal::ZERO {
        "FILLED"
    } else {
        "CANCELED"
    };
    state.statuses.lock().insert(
        id.to_string(),
        json!({
            "symbol": symbol,
            "orderId": id.to_string(),
            "status": status,
            "price": get("price"),
            "origQty": get("quantity"),
            "executedQty": executed.normalize().to_string(),
            "cummulativeQuoteQty": quote.normalize().to_string(),
        }),
    );

    // Ack carries no execution details, like an IOC ack usually does.
    (
        StatusCode::OK,
        Json(json!({
            "symbol": symbol,
            "orderId": id,
            "side": "BUY",
            "type": get("type"),
            "transactTime": state.now_ms(),
        })),
    )
}

async fn query_order(
    State(state): State<Arc<ExchangeState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<Value>) {
    state.status_queries.fetch_add(1, Ordering::SeqCst);
    let (_, params) = match state.authenticate(&headers, query) {
        Ok(ok) => ok,
        Err(rejection) => return rejection,
    };
    let order_id = params
        .iter()
        .find(|(k, _)| k == "orderId")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    match state.statuses.lock().get(&order_id) {
        Some(status) => (StatusCode::OK, Json(status.clone())),
        None => reject(-2013, "Order does not exist."),
    }
}

/// A mock exchange listening on an ephemeral local port.
pub struct MockExchange {
    addr: SocketAddr,
    state: Arc<ExchangeState>,
    shutdown_tx: oneshot::Sender<()>,
}

impl MockExchange {
    /// Start with the exchange clock `server_offset_ms` ahead of local.
    pub async fn start(server_offset_ms: i64) -> Self {
        let state = Arc::new(ExchangeState {
            server_offset_ms,
            asks: Mutex::new(Vec::new()),
            fills: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(HashMap::new()),
            orders: Mutex::new(Vec::new()),
            status_queries: AtomicUsize::new(0),
            bad_signatures: AtomicUsize::new(0),
            next_id: AtomicU64::new(7_001),
        });
        let router = Router::new()
            .route("/api/v3/time", get(server_time))
            .route("/api/v3/depth", get(depth))
            .route("/api/v3/order", post(place_order).get(query_order))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace the ask side of the book.
    pub fn set_asks(&self, asks: &[(&str, &str)]) {
        *self.state.asks.lock() = asks
            .iter()
            .map(|(p, q)| [p.to_string(), q.to_string()])
            .collect();
    }

    /// Script the next accepted buy.
    pub fn push_fill(&self, fill: BuyFill) {
        self.state.fills.lock().push_back(fill);
    }

    /// Every signed order placement, accepted or rejected.
    pub fn orders(&self) -> Vec<RecordedOrder> {
        self.state.orders.lock().clone()
    }

    /// Accepted buy placements.
    pub fn buys(&self) -> Vec<RecordedOrder> {
        self.orders()
            .into_iter()
            .filter(|o| !o.rejected && o.param("side") == Some("BUY"))
            .collect()
    }

    /// Accepted sell placements.
    pub fn sells(&self) -> Vec<RecordedOrder> {
        self.orders()
            .into_iter()
            .filter(|o| !o.rejected && o.param("side") == Some("SELL"))
            .collect()
    }

    pub fn status_queries(&self) -> usize {
        self.state.status_queries.load(Ordering::SeqCst)
    }

    pub fn bad_signatures(&self) -> usize {
        self.state.bad_signatures.load(Ordering::SeqCst)
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_keeps_order() {
        let params = parse_params("symbol=NEWUSDT&side=BUY&type=LIMIT");
        let keys: Vec<_> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["symbol", "side", "type"]);
    }
}
