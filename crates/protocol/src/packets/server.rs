//! Server -> Client message building.

use crate::{Cell, Color, ConnectionId, Direction, ProtocolError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Public state of one player as sent to the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: ConnectionId,
    pub name: String,
    pub color: Color,
    pub snake: Vec<Cell>,
    pub score: u64,
    pub dir: Direction,
}

/// Full room state broadcast after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub players: BTreeMap<ConnectionId, PlayerState>,
    pub foods: Vec<Cell>,
    /// Current leader, only present when highlighting is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<ConnectionId>,
}

/// Server -> client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    GameState(GameSnapshot),
}

impl ServerMessage {
    /// Encode the message as a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a server frame (used by tools and tests acting as a client).
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}
