//! Shared protocol crate for snake-relay.
//!
//! This crate contains:
//! - Message definitions and the JSON envelope codec
//! - Shared types (Cell, Direction, Color)

mod error;
pub mod packets;

pub use error::ProtocolError;
pub use packets::{GameSnapshot, PlayerState};

use serde::{Deserialize, Serialize};

/// Server-assigned connection identifier, stable for the connection lifetime.
pub type ConnectionId = u32;

/// A grid cell in integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Facing direction of a snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    /// Parse a direction name as sent by clients.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// RGB color used to draw a snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Derive a stable color from a display name.
    ///
    /// Channels stay in `50..=255` so snakes remain visible on a dark board.
    pub fn from_name(name: &str) -> Self {
        // FNV-1a
        let mut hash: u32 = 0x811c_9dc5;
        for byte in name.bytes() {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(0x0100_0193);
        }
        let channel = |shift: u32| 50 + ((hash >> shift) & 0xff) as u8 % 206;
        Self::new(channel(0), channel(8), channel(16))
    }
}
