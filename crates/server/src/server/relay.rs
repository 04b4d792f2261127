//! Shared relay handle used by every connection task.

use super::limits::{ConnectionLimits, ConnectionPermit};
use crate::config::Config;
use crate::router::EventRouter;
use protocol::ConnectionId;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};

/// Live counts for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub rooms: usize,
    pub players: usize,
    pub connections: usize,
}

/// Cloneable handle to the event router.
///
/// Each event is applied under the write lock, so no other event for the same
/// room interleaves with it.
#[derive(Debug, Clone)]
pub struct Relay {
    router: Arc<RwLock<EventRouter>>,
    limits: ConnectionLimits,
    outbox_capacity: usize,
}

impl Relay {
    pub fn new(config: &Config) -> Self {
        Self {
            router: Arc::new(RwLock::new(EventRouter::new(config))),
            limits: ConnectionLimits::from_config(&config.server),
            outbox_capacity: config.server.outbox_capacity.max(1),
        }
    }

    /// Admit a connection from `ip` if the connection limits allow it.
    pub fn admit(&self, ip: IpAddr) -> Option<ConnectionPermit> {
        self.limits.try_acquire(ip)
    }

    /// Register a connection and return the receiving end of its outbox.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(self.outbox_capacity);
        let id = self.router.write().await.connect(tx);
        (id, rx)
    }

    /// Handle one inbound text frame.
    pub async fn handle_text(&self, connection: ConnectionId, text: &str) {
        self.router
            .write()
            .await
            .handle_text(connection, text, Instant::now());
    }

    pub async fn disconnect(&self, connection: ConnectionId) {
        self.router.write().await.disconnect(connection);
    }

    pub async fn stats(&self) -> RelayStats {
        let router = self.router.read().await;
        RelayStats {
            rooms: router.registry().room_count(),
            players: router.registry().player_count(),
            connections: router.connection_count(),
        }
    }
}
