//! Per-connection event routing.
//!
//! Every connection has a session record. A session starts unjoined; only a
//! `joinRoom` event moves it into a room, and every other event is dropped
//! until then. Dropped events are never reported back to the client.

use crate::config::Config;
use crate::registry::{Departure, RoomRegistry};
use crate::snapshot::build_snapshot;
use protocol::packets::{ClientEvent, ServerMessage};
use protocol::ConnectionId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info};

/// Outgoing text frames for one connection.
///
/// Bounded: every frame is a full snapshot, so a reader that falls behind
/// loses intermediate frames rather than queueing them.
pub type Outbox = mpsc::Sender<Arc<str>>;

/// Where a connection stands. Disconnected sessions are removed outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unjoined,
    Joined { room: String },
}

/// A connected client session.
#[derive(Debug)]
pub struct Session {
    /// Unique connection ID.
    pub id: ConnectionId,
    pub state: SessionState,
    outbox: Outbox,
}

/// Dispatches client events to the registry and fans out snapshots.
#[derive(Debug)]
pub struct EventRouter {
    registry: RoomRegistry,
    sessions: HashMap<ConnectionId, Session>,
    next_connection_id: ConnectionId,
    highlight_leader: bool,
}

impl EventRouter {
    pub fn new(config: &Config) -> Self {
        Self::with_registry(RoomRegistry::new(config), config.snapshot.highlight_leader)
    }

    pub fn with_registry(registry: RoomRegistry, highlight_leader: bool) -> Self {
        Self {
            registry,
            sessions: HashMap::new(),
            next_connection_id: 1,
            highlight_leader,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn session(&self, id: ConnectionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    /// Register a new connection that receives frames through `outbox`.
    pub fn connect(&mut self, outbox: Outbox) -> ConnectionId {
        let mut id = self.next_connection_id;
        while self.sessions.contains_key(&id) {
            id = next_id(id);
        }
        self.next_connection_id = next_id(id);
        self.sessions.insert(
            id,
            Session {
                id,
                state: SessionState::Unjoined,
                outbox,
            },
        );
        debug!("Connection {} registered", id);
        id
    }

    /// Decode and dispatch one text frame.
    pub fn handle_text(&mut self, connection: ConnectionId, text: &str, now: Instant) {
        match ClientEvent::parse(text) {
            Ok(event) => self.handle_event(connection, event, now),
            Err(e) => debug!("Dropping frame from connection {}: {}", connection, e),
        }
    }

    /// Apply one event from `connection`.
    pub fn handle_event(&mut self, connection: ConnectionId, event: ClientEvent, now: Instant) {
        if !self.sessions.contains_key(&connection) {
            debug!("Event from unknown connection {}", connection);
            return;
        }

        if let ClientEvent::JoinRoom { room, name } = event {
            self.join(connection, room.as_deref(), name.as_deref(), now);
            return;
        }

        let Some(room) = self.joined_room(connection) else {
            debug!("Connection {} sent {:?} before joining", connection, event);
            return;
        };

        let changed = match event {
            ClientEvent::Update { snake, score } => {
                self.registry.update(&room, connection, snake, score, now)
            }
            ClientEvent::Move { dir } => {
                // Direction rides along with the next update's broadcast.
                self.registry.set_direction(&room, connection, dir);
                false
            }
            ClientEvent::EatFood(cell) => self.registry.eat_food(&room, connection, cell),
            ClientEvent::Restart => self.registry.restart(&room, connection),
            ClientEvent::JoinRoom { .. } => false,
        };

        if changed {
            self.broadcast(&room);
        }
    }

    /// Drop the session of `connection`, leaving its room if any.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        let Some(session) = self.sessions.remove(&connection) else {
            return;
        };
        debug!("Connection {} unregistered", connection);
        if let SessionState::Joined { room } = session.state {
            self.leave_room(connection, &room);
        }
    }

    fn join(&mut self, connection: ConnectionId, room: Option<&str>, name: Option<&str>, now: Instant) {
        let target = self.registry.normalize_room_id(room);
        if let Some(previous) = self.joined_room(connection) {
            if previous != target {
                info!(
                    "Connection {} switching from room '{}' to '{}'",
                    connection, previous, target
                );
                self.leave_room(connection, &previous);
            }
        }

        let room_id = self.registry.join(connection, room, name, now);
        if let Some(session) = self.sessions.get_mut(&connection) {
            session.state = SessionState::Joined {
                room: room_id.clone(),
            };
        }
        self.broadcast(&room_id);
    }

    fn leave_room(&mut self, connection: ConnectionId, room: &str) {
        if self.registry.leave(connection, room) == Departure::RoomRemains {
            self.broadcast(room);
        }
    }

    fn joined_room(&self, connection: ConnectionId) -> Option<String> {
        match &self.sessions.get(&connection)?.state {
            SessionState::Joined { room } => Some(room.clone()),
            SessionState::Unjoined => None,
        }
    }

    /// Send the current snapshot of `room_id` to all of its members.
    fn broadcast(&self, room_id: &str) {
        let Some(room) = self.registry.room(room_id) else {
            return;
        };
        let message = ServerMessage::GameState(build_snapshot(room, self.highlight_leader));
        let frame: Arc<str> = match message.encode() {
            Ok(text) => text.into(),
            Err(e) => {
                error!("Failed to encode snapshot for room '{}': {}", room_id, e);
                return;
            }
        };

        for member in room.members() {
            if let Some(session) = self.sessions.get(&member) {
                match session.outbox.try_send(Arc::clone(&frame)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        debug!("Outbox of connection {} is full, dropping snapshot", member)
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!("Outbox of connection {} is closed", member)
                    }
                }
            }
        }
    }
}

/// Ids are never 0, and wrap back to 1.
fn next_id(id: ConnectionId) -> ConnectionId {
    id.wrapping_add(1).max(1)
}
