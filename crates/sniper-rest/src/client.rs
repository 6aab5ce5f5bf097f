//! HTTP client for the exchange REST API.
//!
//! One `RestClient` (and its connection pool) is shared by every call in a
//! run: clock sync, warmup, probe, timed attempts, reconciliation and sell.
//! Warmup and clock sync exist to leave this pool holding a hot connection.

use crate::error::{RestError, RestResult};
use crate::params::{order_status_params, NewOrder, QueryParams};
use crate::signer::RequestSigner;
use crate::types::{ApiErrorBody, DepthSnapshot, OrderAck, OrderStatusReport, ServerTime};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use sniper_core::ApiSecret;
use std::time::Duration;
use tracing::{debug, trace};

/// Header carrying the API key on signed requests.
pub const API_KEY_HEADER: &str = "X-MEXC-APIKEY";

const TIME_PATH: &str = "/api/v3/time";
const DEPTH_PATH: &str = "/api/v3/depth";
const ORDER_PATH: &str = "/api/v3/order";

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Base URL, e.g. "https://api.mexc.com".
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mexc.com".to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(3),
            pool_max_idle_per_host: 8,
        }
    }
}

/// Signed REST client for one account.
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
    signer: RequestSigner,
}

impl RestClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config` - Endpoint and pool settings
    /// * `api_key` - Sent in the `X-MEXC-APIKEY` header
    /// * `secret` - HMAC key; only the signer keeps derived state
    pub fn new(
        config: RestClientConfig,
        api_key: impl Into<String>,
        secret: &ApiSecret,
    ) -> RestResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(None)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RestError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            signer: RequestSigner::new(secret)?,
        })
    }

    /// Exchange server time in Unix milliseconds.
    pub async fn server_time(&self) -> RestResult<u64> {
        let url = format!("{}{TIME_PATH}", self.base_url);
        let response = self.client.get(&url).send().await?;
        let time: ServerTime = decode(response).await?;
        Ok(time.server_time)
    }

    /// Top-of-book snapshot.
    pub async fn depth(&self, symbol: &str, limit: u32) -> RestResult<DepthSnapshot> {
        let url = format!(
            "{}{DEPTH_PATH}?symbol={symbol}&limit={limit}",
            self.base_url
        );
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// Place an order, stamped with `timestamp_ms` (exchange clock).
    pub async fn place_order(&self, order: &NewOrder, timestamp_ms: u64) -> RestResult<OrderAck> {
        let params = order.to_params(timestamp_ms);
        let response = self.send_signed(Method::POST, ORDER_PATH, &params).await?;
        decode(response).await
    }

    /// Query one order's authoritative state.
    pub async fn query_order(
        &self,
        symbol: &str,
        order_id: &str,
        recv_window_ms: u64,
        timestamp_ms: u64,
    ) -> RestResult<OrderStatusReport> {
        let params = order_status_params(symbol, order_id, recv_window_ms, timestamp_ms);
        let response = self.send_signed(Method::GET, ORDER_PATH, &params).await?;
        decode(response).await
    }

    async fn send_signed(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
    ) -> RestResult<Response> {
        let signed = self.signer.sign_params(params);
        // Sent verbatim so the exchange hashes exactly what was signed.
        let url = format!("{}{path}?{}", self.base_url, signed.to_query_string());
        trace!(%method, path, query = %signed.query, "Sending signed request");

        let response = self
            .client
            .request(method, &url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Ok(response)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Decode a success body, or map the exchange's error body.
async fn decode<T: DeserializeOwned>(response: Response) -> RestResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        match serde_json::from_str::<T>(&body) {
            Ok(value) => return Ok(value),
            Err(e) => {
                // Some rejections arrive as HTTP 200 with a code/msg body.
                if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&body) {
                    return Err(RestError::Api {
                        status: status.as_u16(),
                        code: err.code,
                        msg: err.msg,
                    });
                }
                debug!(error = %e, "Failed to decode response body");
                return Err(RestError::Decode(format!("{e}: {}", truncate(&body))));
            }
        }
    }

    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(err) => Err(RestError::Api {
            status: status.as_u16(),
            code: err.code,
            msg: err.msg,
        }),
        Err(_) => Err(RestError::Http {
            status: status.as_u16(),
            body: truncate(&body),
        }),
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
