//! Public trade stream client.
//!
//! Opens one WebSocket connection, subscribes to `<symbol>@trade` and yields
//! trade events. Used by the trigger detector to observe the first trade of
//! a new listing.

pub mod connection;
pub mod error;
pub mod message;

pub use connection::{TradeStream, KEEPALIVE_INTERVAL};
pub use error::{WsError, WsResult};
pub use message::{PingRequest, StreamMessage, SubscribeRequest, TradeEvent};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
