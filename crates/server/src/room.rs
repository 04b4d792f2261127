//! Room and player state.

use protocol::{Cell, Color, ConnectionId, Direction, PlayerState};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// A player inside a room, owned by exactly one connection.
///
/// `snake` and `score` are whatever the owning connection last reported;
/// the server does not simulate movement.
#[derive(Debug, Clone)]
pub struct Player {
    /// Owning connection.
    pub id: ConnectionId,
    /// Display name (already truncated).
    pub name: String,
    /// Color derived from the name.
    pub color: Color,
    /// Snake body, head first.
    pub snake: Vec<Cell>,
    pub score: u64,
    pub dir: Direction,
    /// Time of the last accepted update.
    pub last_move: Option<Instant>,
    /// Time the player joined the room.
    pub joined_at: Instant,
}

impl Player {
    /// Create a player spawned at `spawn`.
    pub fn new(id: ConnectionId, name: String, spawn: Cell, now: Instant) -> Self {
        Self {
            id,
            color: Color::from_name(&name),
            name,
            snake: vec![spawn],
            score: 0,
            dir: Direction::default(),
            last_move: None,
            joined_at: now,
        }
    }

    /// Back to a one-cell snake at `spawn` with no score.
    pub fn reset(&mut self, spawn: Cell) {
        self.snake = vec![spawn];
        self.score = 0;
        self.dir = Direction::default();
    }

    /// Rate limit for updates: accepts at most one per `window`.
    ///
    /// Records `now` as the last move when accepted.
    pub fn try_accept_update(&mut self, now: Instant, window: Duration) -> bool {
        if let Some(last) = self.last_move {
            if now.saturating_duration_since(last) < window {
                return false;
            }
        }
        self.last_move = Some(now);
        true
    }

    /// Public wire state.
    pub fn state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            name: self.name.clone(),
            color: self.color,
            snake: self.snake.clone(),
            score: self.score,
            dir: self.dir,
        }
    }
}

/// A named room with its players and food.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub players: HashMap<ConnectionId, Player>,
    /// Food cells, pairwise distinct.
    pub foods: Vec<Cell>,
}

impl Room {
    pub fn new(id: String) -> Self {
        Self {
            id,
            players: HashMap::new(),
            foods: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Every cell covered by any snake in the room.
    pub fn snake_cells(&self) -> HashSet<Cell> {
        self.players
            .values()
            .flat_map(|player| player.snake.iter().copied())
            .collect()
    }

    /// Connections currently in the room.
    pub fn members(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.players.keys().copied()
    }
}
