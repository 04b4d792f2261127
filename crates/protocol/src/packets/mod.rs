//! Message definitions for the relay protocol.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.
//! This module contains both client->server and server->client messages.

mod client;
mod server;

pub use client::*;
pub use server::*;

/// Event names sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEventName {
    /// Join (or re-join) a named room.
    JoinRoom,
    /// Trajectory and score report.
    Update,
    /// Facing direction change.
    Move,
    /// Claim a food cell.
    EatFood,
    /// Reset own snake to the center.
    Restart,
}

impl ClientEventName {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "joinRoom" => Some(Self::JoinRoom),
            "update" => Some(Self::Update),
            "move" => Some(Self::Move),
            "eatFood" => Some(Self::EatFood),
            "restart" => Some(Self::Restart),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::JoinRoom => "joinRoom",
            Self::Update => "update",
            Self::Move => "move",
            Self::EatFood => "eatFood",
            Self::Restart => "restart",
        }
    }
}
