//! Single-subscription trade stream.
//!
//! No reconnection: a run only needs the stream for a few seconds around
//! the listing instant, and any failure is handled by the caller falling
//! back to the announced time.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{interval_at, Instant, Interval};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{WsError, WsResult};
use crate::message::{PingRequest, StreamMessage, SubscribeRequest, TradeEvent};

/// Keepalive period; the server drops idle connections after about a minute.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(20);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Subscribed trade stream for one symbol.
pub struct TradeStream {
    symbol: String,
    write: SplitSink<Socket, Message>,
    read: SplitStream<Socket>,
    keepalive: Interval,
}

impl TradeStream {
    /// Connect and subscribe to `symbol`'s trade channel.
    pub async fn connect(url: &str, symbol: &str) -> WsResult<Self> {
        info!(%url, %symbol, "Connecting to trade stream");

        // TCP_NODELAY on: the first trade frame must not sit in Nagle's buffer.
        let (ws_stream, _response) = connect_async_tls_with_config(url, None, true, None)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let (mut write, read) = ws_stream.split();

        let subscribe = serde_json::to_string(&SubscribeRequest::trades(symbol))?;
        write.send(Message::Text(subscribe)).await?;
        debug!(%symbol, "Trade subscription sent");

        Ok(Self {
            symbol: symbol.to_string(),
            write,
            read,
            keepalive: interval_at(Instant::now() + KEEPALIVE_INTERVAL, KEEPALIVE_INTERVAL),
        })
    }

    /// Wait for the next trade on the subscribed symbol.
    ///
    /// Control frames are handled inline. Cancel-safe: dropping the future
    /// loses no trade that was not yet returned.
    pub async fn next_trade(&mut self) -> WsResult<TradeEvent> {
        loop {
            tokio::select! {
                msg = self.read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(trade) = self.handle_text(&text)? {
                                return Ok(trade);
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            self.write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "Trade stream closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            return Err(WsError::ConnectionClosed {
                                code: 1006,
                                reason: "stream ended".to_string(),
                            });
                        }
                    }
                }
                _ = self.keepalive.tick() => {
                    let ping = serde_json::to_string(&PingRequest::default())?;
                    self.write.send(Message::Text(ping)).await?;
                }
            }
        }
    }

    fn handle_text(&self, text: &str) -> WsResult<Option<TradeEvent>> {
        match StreamMessage::parse(text) {
            Ok(StreamMessage::Trade(trade)) if trade.is_for(&self.symbol) => Ok(Some(trade)),
            Ok(StreamMessage::Trade(trade)) => {
                debug!(symbol = ?trade.symbol, "Ignoring trade for another symbol");
                Ok(None)
            }
            Ok(StreamMessage::Ack { code, msg, .. }) => {
                if code != 0 || msg.starts_with("Not Subscribed") {
                    return Err(WsError::SubscriptionRejected(msg));
                }
                debug!(%msg, "Subscription acknowledged");
                Ok(None)
            }
            Ok(StreamMessage::Pong | StreamMessage::Other) => Ok(None),
            Err(e) => {
                debug!(error = %e, "Skipping unparseable frame");
                Ok(None)
            }
        }
    }

    /// Send a close frame; errors are ignored.
    pub async fn close(mut self) {
        if let Err(e) = self.write.send(Message::Close(None)).await {
            debug!(?e, "Failed to send Close frame");
        }
    }
}
