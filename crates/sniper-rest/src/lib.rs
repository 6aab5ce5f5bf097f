//! Signed REST order entry for the listing sniper.
//!
//! Provides:
//! - `RequestSigner`: HMAC-SHA256 over the exact query string, in canonical order
//! - `QueryParams` / `NewOrder`: per-endpoint canonical parameter builders
//! - `RestClient`: one pooled HTTP client reused for every call in a run
//! - Wire types for time, depth, order ack and order status responses

pub mod client;
pub mod error;
pub mod params;
pub mod signer;
pub mod types;

pub use client::{RestClient, RestClientConfig, API_KEY_HEADER};
pub use error::{RestError, RestResult};
pub use params::{order_status_params, NewOrder, OrderKind, QueryParams};
pub use signer::{RequestSigner, SignedQuery};
pub use types::{ApiErrorBody, DepthSnapshot, OrderAck, OrderStatusReport, ServerTime};
