//! Socket loop shared by every WebSocket transport.

use super::relay::Relay;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::net::SocketAddr;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// An inbound frame, reduced to what the relay cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Close,
    /// Binary, ping and pong frames.
    Other,
}

impl From<Message> for Inbound {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(text) => Inbound::Text(text.as_str().to_owned()),
            Message::Close(_) => Inbound::Close,
            _ => Inbound::Other,
        }
    }
}

impl Relay {
    /// Serve one client until either side closes.
    ///
    /// Pending snapshots are flushed before the next inbound frame is read.
    pub async fn serve_socket<R, W, E>(&self, addr: SocketAddr, mut read: R, mut write: W)
    where
        R: Stream<Item = Result<Inbound, E>> + Unpin,
        E: Display,
        W: Sink<String> + Unpin,
        W::Error: Display,
    {
        let (connection, mut outbox) = self.connect().await;
        debug!("Connection {} assigned to {}", connection, addr);

        loop {
            tokio::select! {
                biased;
                frame = outbox.recv() => {
                    let Some(frame) = frame else { break };
                    if let Err(e) = write.send(frame.to_string()).await {
                        warn!("Failed to send snapshot to {}: {}", addr, e);
                        break;
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Inbound::Text(text))) => self.handle_text(connection, &text).await,
                        Some(Ok(Inbound::Close)) => {
                            info!("Client {} disconnected", addr);
                            break;
                        }
                        Some(Ok(Inbound::Other)) => {}
                        Some(Err(e)) => {
                            error!("WebSocket error from {}: {}", addr, e);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        self.disconnect(connection).await;
    }
}
