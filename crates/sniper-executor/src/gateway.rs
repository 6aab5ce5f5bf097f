//! Exchange gateway trait.
//!
//! Abstracts the REST calls a run makes so the timing core can be driven
//! by the real `RestClient` or by `MockGateway` in tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sniper_rest::{
    DepthSnapshot, NewOrder, OrderAck, OrderStatusReport, RestClient, RestError, RestResult,
};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// REST operations used by a run.
pub trait ExchangeGateway: Send + Sync {
    /// Exchange server time (ms).
    fn server_time(&self) -> BoxFuture<'_, RestResult<u64>>;

    /// Top-of-book snapshot.
    fn depth<'a>(
        &'a self,
        symbol: &'a str,
        limit: u32,
    ) -> BoxFuture<'a, RestResult<DepthSnapshot>>;

    /// Signed order placement; `timestamp_ms` is on the exchange clock.
    fn place_order<'a>(
        &'a self,
        order: &'a NewOrder,
        timestamp_ms: u64,
    ) -> BoxFuture<'a, RestResult<OrderAck>>;

    /// Signed order status query.
    fn query_order<'a>(
        &'a self,
        symbol: &'a str,
        order_id: &'a str,
        recv_window_ms: u64,
        timestamp_ms: u64,
    ) -> BoxFuture<'a, RestResult<OrderStatusReport>>;
}

/// Arc wrapper for gateway trait objects.
pub type DynGateway = Arc<dyn ExchangeGateway>;

impl ExchangeGateway for RestClient {
    fn server_time(&self) -> BoxFuture<'_, RestResult<u64>> {
        Box::pin(RestClient::server_time(self))
    }

    fn depth<'a>(
        &'a self,
        symbol: &'a str,
        limit: u32,
    ) -> BoxFuture<'a, RestResult<DepthSnapshot>> {
        Box::pin(RestClient::depth(self, symbol, limit))
    }

    fn place_order<'a>(
        &'a self,
        order: &'a NewOrder,
        timestamp_ms: u64,
    ) -> BoxFuture<'a, RestResult<OrderAck>> {
        Box::pin(RestClient::place_order(self, order, timestamp_ms))
    }

    fn query_order<'a>(
        &'a self,
        symbol: &'a str,
        order_id: &'a str,
        recv_window_ms: u64,
        timestamp_ms: u64,
    ) -> BoxFuture<'a, RestResult<OrderStatusReport>> {
        Box::pin(RestClient::query_order(
            self,
            symbol,
            order_id,
            recv_window_ms,
            timestamp_ms,
        ))
    }
}

// ============================================================================
// MockGateway
// ============================================================================

/// Scripted placement response.
#[derive(Debug, Clone)]
pub enum MockPlacement {
    Ack(OrderAck),
    Reject { code: i64, msg: String },
    Transport(String),
    /// Sent, but the deadline passed before the ack arrived.
    Timeout(String),
    /// HTTP 2xx with a body that does not parse.
    Undecodable(String),
}

impl MockPlacement {
    /// Ack with the given id and nothing executed yet.
    pub fn ack(order_id: &str) -> Self {
        Self::Ack(OrderAck {
            symbol: String::new(),
            order_id: order_id.to_string(),
            executed_qty: rust_decimal::Decimal::ZERO,
            cummulative_quote_qty: rust_decimal::Decimal::ZERO,
        })
    }

    fn into_result(self) -> RestResult<OrderAck> {
        match self {
            Self::Ack(ack) => Ok(ack),
            Self::Reject { code, msg } => Err(RestError::Api {
                status: 400,
                code,
                msg,
            }),
            Self::Transport(msg) => Err(RestError::Transport(msg)),
            Self::Timeout(msg) => Err(RestError::Timeout(msg)),
            Self::Undecodable(msg) => Err(RestError::Decode(msg)),
        }
    }
}

/// Scripted status-query response.
#[derive(Debug, Clone)]
pub enum MockStatus {
    Report(OrderStatusReport),
    Transport(String),
}

/// Recorded placement.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: NewOrder,
    pub timestamp_ms: u64,
    /// Local instant the call was made.
    pub at: Instant,
}

/// Mock gateway for testing.
///
/// Placements consume a FIFO script; status queries are answered per
/// order id and may be repeated. Unscripted calls fail.
#[derive(Debug)]
pub struct MockGateway {
    /// Offset added to local time to produce server time.
    server_offset_ms: Mutex<i64>,
    time_failures: AtomicUsize,
    depth: Mutex<Option<RestResult<DepthSnapshot>>>,
    placements: Mutex<VecDeque<MockPlacement>>,
    statuses: Mutex<HashMap<String, MockStatus>>,
    place_delay: Mutex<Duration>,
    placed: Mutex<Vec<PlacedOrder>>,
    queried: Mutex<Vec<String>>,
    time_calls: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            server_offset_ms: Mutex::new(0),
            time_failures: AtomicUsize::new(0),
            depth: Mutex::new(None),
            placements: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(HashMap::new()),
            place_delay: Mutex::new(Duration::ZERO),
            placed: Mutex::new(Vec::new()),
            queried: Mutex::new(Vec::new()),
            time_calls: AtomicUsize::new(0),
        }
    }

    /// Server clock = local clock + `offset_ms`.
    pub fn set_server_offset(&self, offset_ms: i64) {
        *self.server_offset_ms.lock() = offset_ms;
    }

    /// Fail the next `count` time requests with a transport error.
    pub fn fail_time_requests(&self, count: usize) {
        self.time_failures.store(count, Ordering::SeqCst);
    }

    pub fn set_depth(&self, result: RestResult<DepthSnapshot>) {
        *self.depth.lock() = Some(result);
    }

    pub fn push_placement(&self, placement: MockPlacement) {
        self.placements.lock().push_back(placement);
    }

    pub fn set_status(&self, order_id: &str, status: MockStatus) {
        self.statuses.lock().insert(order_id.to_string(), status);
    }

    /// Simulated placement round trip.
    pub fn set_place_delay(&self, delay: Duration) {
        *self.place_delay.lock() = delay;
    }

    pub fn placed(&self) -> Vec<PlacedOrder> {
        self.placed.lock().clone()
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().clone()
    }

    pub fn time_calls(&self) -> usize {
        self.time_calls.load(Ordering::SeqCst)
    }
}

fn local_now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl ExchangeGateway for MockGateway {
    fn server_time(&self) -> BoxFuture<'_, RestResult<u64>> {
        Box::pin(async move {
            self.time_calls.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .time_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(RestError::Transport("connection refused".to_string()));
            }
            let offset = *self.server_offset_ms.lock();
            Ok((local_now_ms() as i64 + offset).max(0) as u64)
        })
    }

    fn depth<'a>(
        &'a self,
        _symbol: &'a str,
        _limit: u32,
    ) -> BoxFuture<'a, RestResult<DepthSnapshot>> {
        Box::pin(async move {
            let scripted = self.depth.lock().clone();
            scripted.unwrap_or_else(|| Ok(DepthSnapshot::default()))
        })
    }

    fn place_order<'a>(
        &'a self,
        order: &'a NewOrder,
        timestamp_ms: u64,
    ) -> BoxFuture<'a, RestResult<OrderAck>> {
        Box::pin(async move {
            self.placed.lock().push(PlacedOrder {
                order: order.clone(),
                timestamp_ms,
                at: Instant::now(),
            });
            let delay = *self.place_delay.lock();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let next = self.placements.lock().pop_front();
            next.unwrap_or_else(|| MockPlacement::Reject {
                code: -1,
                msg: "unscripted placement".to_string(),
            })
            .into_result()
        })
    }

    fn query_order<'a>(
        &'a self,
        _symbol: &'a str,
        order_id: &'a str,
        _recv_window_ms: u64,
        _timestamp_ms: u64,
    ) -> BoxFuture<'a, RestResult<OrderStatusReport>> {
        Box::pin(async move {
            self.queried.lock().push(order_id.to_string());
            let status = self.statuses.lock().get(order_id).cloned();
            match status {
                Some(MockStatus::Report(report)) => Ok(report),
                Some(MockStatus::Transport(msg)) => Err(RestError::Transport(msg)),
                None => Err(RestError::Api {
                    status: 400,
                    code: -2013,
                    msg: "Order does not exist.".to_string(),
                }),
            }
        })
    }
}

/// Status report with the given execution, for tests.
pub fn mock_status_report(
    order_id: &str,
    executed_qty: rust_decimal::Decimal,
    cummulative_quote_qty: rust_decimal::Decimal,
) -> OrderStatusReport {
    let status = if executed_qty.is_zero() {
        "CANCELED"
    } else {
        "FILLED"
    };
    OrderStatusReport {
        symbol: String::new(),
        order_id: order_id.to_string(),
        status: status.to_string(),
        price: rust_decimal::Decimal::ZERO,
        orig_qty: executed_qty,
        executed_qty,
        cummulative_quote_qty,
    }
}
