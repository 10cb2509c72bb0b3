//! Push channel: live alerts over Socket.IO.
//!
//! [`PushChannel::subscribe`] spawns a transport task and returns a
//! [`PushSubscription`]. The subscription is the mount/unmount pair of the
//! live view: dropping it aborts the task and closes the socket.
//!
//! Events are forwarded in the order the socket delivers them. When the
//! socket drops, the task reconnects after the configured delay unless
//! reconnection is disabled.

pub mod frame;

use std::time::Duration;

use disasterwatch_core::config::{BackendConfig, PushConfig};
use disasterwatch_types::RawEvent;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ClientError;
use frame::{EnginePacket, SocketPacket};

/// Buffered notifications between the transport task and the consumer.
const CHANNEL_CAPACITY: usize = 256;

/// What the transport task reports.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// The namespace was joined; alerts will follow.
    Connected,
    /// One alert record, undecoded beyond its wire shape.
    Alert(RawEvent),
    /// The socket closed or failed.
    Disconnected {
        /// Why, for display.
        reason: String,
    },
}

/// Derive the WebSocket URL of the Socket.IO endpoint from the backend URL:
/// `http` becomes `ws`, `https` becomes `wss`.
pub fn socket_url(backend: &str, path: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: backend.to_owned(),
        reason,
    };
    let mut url = Url::parse(backend).map_err(|e| invalid(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid(String::from("cannot switch to a websocket scheme")))?;

    let prefix = url.path().trim_end_matches('/').to_owned();
    let path = path.trim_matches('/');
    url.set_path(&format!("{prefix}/{path}/"));
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

/// Connection parameters of the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushChannel {
    url: Url,
    event: String,
    reconnect_delay: Option<Duration>,
}

impl PushChannel {
    /// Channel on an explicit socket URL.
    pub fn new(url: Url, event: impl Into<String>, reconnect_delay: Option<Duration>) -> Self {
        Self {
            url,
            event: event.into(),
            reconnect_delay,
        }
    }

    /// Channel derived from the `backend` and `push` config sections.
    pub fn from_config(backend: &BackendConfig, push: &PushConfig) -> Result<Self, ClientError> {
        let url = socket_url(&backend.url, &push.path)?;
        Ok(Self::new(url, push.event.clone(), push.reconnect_delay()))
    }

    /// The socket URL.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Start the transport task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn subscribe(self) -> PushSubscription {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(self.run(tx));
        PushSubscription { rx, task }
    }

    async fn run(self, tx: mpsc::Sender<PushEvent>) {
        loop {
            let reason = match self.connect_once(&tx).await {
                Ok(()) => String::from("closed by server"),
                Err(e) => {
                    warn!(url = %self.url, error = %e, "push channel error");
                    e.to_string()
                }
            };
            if tx.is_closed() || tx.send(PushEvent::Disconnected { reason }).await.is_err() {
                return;
            }
            let Some(delay) = self.reconnect_delay else {
                info!(url = %self.url, "push channel closed, reconnection disabled");
                return;
            };
            debug!(delay = ?delay, "reconnecting push channel");
            tokio::time::sleep(delay).await;
        }
    }

    /// One socket lifetime: handshake, then forward events until it ends.
    async fn connect_once(&self, tx: &mpsc::Sender<PushEvent>) -> Result<(), ClientError> {
        let (mut ws, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| ClientError::WebSocket(e.to_string()))?;
        debug!(url = %self.url, "websocket open");

        while let Some(message) = ws.next().await {
            let text = match message.map_err(|e| ClientError::WebSocket(e.to_string()))? {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let packet = match frame::decode(&text) {
                Ok(packet) => packet,
                Err(e) => {
                    debug!(error = %e, "ignoring undecodable frame");
                    continue;
                }
            };
            match packet {
                EnginePacket::Open(handshake) => {
                    debug!(sid = %handshake.sid, ping_interval = handshake.ping_interval, "engine.io open");
                    ws.send(Message::Text(frame::CONNECT.to_owned()))
                        .await
                        .map_err(|e| ClientError::WebSocket(e.to_string()))?;
                }
                EnginePacket::Ping(payload) => {
                    ws.send(Message::Text(frame::pong(&payload)))
                        .await
                        .map_err(|e| ClientError::WebSocket(e.to_string()))?;
                }
                EnginePacket::Message(SocketPacket::Connect) => {
                    info!(url = %self.url, "connected to socket server");
                    if tx.send(PushEvent::Connected).await.is_err() {
                        return Ok(());
                    }
                }
                EnginePacket::Message(SocketPacket::Event { name, data }) if name == self.event => {
                    match serde_json::from_value::<RawEvent>(data) {
                        Ok(raw) => {
                            if tx.send(PushEvent::Alert(raw)).await.is_err() {
                                return Ok(());
                            }
                        }
                        Err(e) => warn!(error = %e, "dropping undecodable pushed alert"),
                    }
                }
                EnginePacket::Message(SocketPacket::Event { name, .. }) => {
                    debug!(event = %name, "ignoring unrelated event");
                }
                EnginePacket::Message(SocketPacket::ConnectError(reason)) => {
                    warn!(url = %self.url, %reason, "connect_error");
                    return Err(ClientError::WebSocket(format!("connect_error: {reason}")));
                }
                EnginePacket::Message(SocketPacket::Disconnect) | EnginePacket::Close => break,
                EnginePacket::Pong(_)
                | EnginePacket::Upgrade
                | EnginePacket::Noop
                | EnginePacket::Message(SocketPacket::Ack) => {}
            }
        }
        Ok(())
    }
}

/// Live handle on the push channel. Dropping it stops the transport.
#[derive(Debug)]
pub struct PushSubscription {
    rx: mpsc::Receiver<PushEvent>,
    task: JoinHandle<()>,
}

impl PushSubscription {
    /// Next notification, in delivery order. `None` once the transport has
    /// stopped for good.
    pub async fn next(&mut self) -> Option<PushEvent> {
        self.rx.recv().await
    }

    /// Whether the transport task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
