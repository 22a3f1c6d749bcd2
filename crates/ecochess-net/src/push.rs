//! Push channel: a WebSocket subscription to one game's state stream.
//!
//! Each [`PushChannel`] is a single connection attempt tagged with an epoch.
//! A background task connects, forwards decoded messages as
//! [`TransportEvent`]s, sends a keep-alive probe on a fixed interval, and
//! reports the closure. Reconnecting is not this module's job; the
//! [`TransportManager`](crate::TransportManager) opens a fresh channel with a
//! new epoch instead. An intentional [`close`](PushChannel::close) emits no
//! closure event.

use std::time::Duration;

use ecochess_model::GameId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::api::Endpoint;
use crate::messages::{KEEPALIVE_PROBE, decode_push};
use crate::transport::TransportEvent;

/// Errors building the push URL.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("invalid api base url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unsupported url scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    #[error("api base url cannot carry a path")]
    NotABase,
}

/// Derive the push URL for `game` from the HTTP base URL.
///
/// `http` maps to `ws` and `https` to `wss`. The path is
/// `/ws/game/{game_id}` below any base path, with the API key and username
/// in the query.
pub fn push_url(endpoint: &Endpoint, game: &GameId) -> Result<Url, PushError> {
    let mut url = Url::parse(&endpoint.api_base)?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(PushError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|()| PushError::UnsupportedScheme(scheme.to_string()))?;

    {
        let mut segments = url.path_segments_mut().map_err(|()| PushError::NotABase)?;
        segments.pop_if_empty().extend(["ws", "game", game.as_str()]);
    }

    url.query_pairs_mut()
        .clear()
        .append_pair("key", &endpoint.api_key)
        .append_pair("username", &endpoint.username);
    Ok(url)
}

/// Handle to one push connection attempt.
///
/// Dropping the handle closes the connection.
pub struct PushChannel {
    /// Sending `true` makes the connection task exit quietly.
    shutdown_tx: watch::Sender<bool>,
}

impl PushChannel {
    /// Start connecting to `url`. Must be called inside a tokio runtime.
    ///
    /// Events carry `epoch` so the receiver can discard anything from a
    /// superseded connection.
    pub fn open(
        url: Url,
        epoch: u64,
        keepalive: Duration,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(Self::run(url, epoch, keepalive, events, shutdown_rx));
        Self { shutdown_tx }
    }

    /// Close the connection without emitting a closure event.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    async fn run(
        url: Url,
        epoch: u64,
        keepalive: Duration,
        events: mpsc::UnboundedSender<TransportEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        if *shutdown_rx.borrow() {
            return;
        }

        tracing::debug!(epoch, host = url.host_str(), "opening push channel");
        let ws = tokio::select! {
            result = tokio_tungstenite::connect_async(url.as_str()) => match result {
                Ok((ws, _response)) => ws,
                Err(e) => {
                    tracing::info!(epoch, "push connect failed: {e}");
                    let _ = events.send(TransportEvent::PushClosed { epoch });
                    return;
                }
            },
            _ = shutdown_rx.changed() => return,
        };

        if events.send(TransportEvent::PushOpened { epoch }).is_err() {
            return;
        }

        let (mut write, mut read) = ws.split();
        let start = tokio::time::Instant::now() + keepalive;
        let mut keepalive_timer = tokio::time::interval_at(start, keepalive);

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => match decode_push(text.as_str()) {
                        Ok(Some(message)) => {
                            let event = TransportEvent::PushMessage { epoch, message };
                            if events.send(event).is_err() {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => tracing::debug!(epoch, "dropping push frame: {e}"),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!(epoch, ?frame, "push channel closed by server");
                        break;
                    }
                    // Control frames are answered by the protocol layer.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::info!(epoch, "push channel error: {e}");
                        break;
                    }
                    None => break,
                },
                _ = keepalive_timer.tick() => {
                    if let Err(e) = write.send(Message::text(KEEPALIVE_PROBE)).await {
                        tracing::info!(epoch, "keep-alive send failed: {e}");
                        break;
                    }
                }
                _ = shutdown_rx.changed() => {
                    let _ = write.send(Message::Close(None)).await;
                    return;
                }
            }
        }

        let _ = events.send(TransportEvent::PushClosed { epoch });
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.close();
    }
}
