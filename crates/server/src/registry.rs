//! Room registry.
//!
//! Owns every live room. Rooms are created on the first join and removed as
//! soon as their last player leaves, so an empty room never exists here.

use crate::config::{Config, RoomConfig};
use crate::food::FoodPlacer;
use crate::grid::Grid;
use crate::room::{Player, Room};
use protocol::{Cell, ConnectionId, Direction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What happened to a room when a connection left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The connection had no player in that room.
    NotPresent,
    /// The player was removed and others remain.
    RoomRemains,
    /// The player was the last one; the room is gone.
    RoomClosed,
}

/// Mapping from room id to room state.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    grid: Grid,
    placer: FoodPlacer,
    limits: RoomConfig,
    move_debounce: Duration,
    rng: StdRng,
}

impl RoomRegistry {
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(rand::rng().random()))
    }

    /// Registry with a caller-provided random source.
    pub fn with_rng(config: &Config, rng: StdRng) -> Self {
        let grid = Grid::new(config.grid.size);
        Self {
            rooms: HashMap::new(),
            grid,
            placer: FoodPlacer::new(grid, &config.food),
            limits: config.room.clone(),
            move_debounce: config.player.move_debounce(),
            rng,
        }
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn player_count(&self) -> usize {
        self.rooms.values().map(|room| room.players.len()).sum()
    }

    /// Room id as it will be stored: trimmed, truncated, defaulted.
    pub fn normalize_room_id(&self, room: Option<&str>) -> String {
        normalize(room, self.limits.max_room_len, &self.limits.default_room)
    }

    /// Put `connection` into a room with a fresh player at the center.
    ///
    /// Re-joining the same room replaces the previous player. Returns the
    /// normalized room id.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        room: Option<&str>,
        name: Option<&str>,
        now: Instant,
    ) -> String {
        let room_id = self.normalize_room_id(room);
        let name = normalize(name, self.limits.max_name_len, &self.limits.default_name);
        let spawn = self.grid.center();

        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Room '{}' created", room_id);
            Room::new(room_id.clone())
        });

        if room.players.remove(&connection).is_some() {
            debug!("Connection {} re-joined room '{}'", connection, room_id);
        }
        info!("Connection {} joined room '{}' as '{}'", connection, room_id, name);
        room.players
            .insert(connection, Player::new(connection, name, spawn, now));

        if room.foods.len() < self.placer.count() {
            room.foods = self.placer.init_foods(&mut self.rng, &room.snake_cells());
        }

        room_id
    }

    /// Remove the player of `connection` from `room_id`.
    pub fn leave(&mut self, connection: ConnectionId, room_id: &str) -> Departure {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return Departure::NotPresent;
        };
        if room.players.remove(&connection).is_none() {
            return Departure::NotPresent;
        }
        info!("Connection {} left room '{}'", connection, room_id);

        if room.is_empty() {
            self.rooms.remove(room_id);
            info!("Room '{}' closed", room_id);
            Departure::RoomClosed
        } else {
            Departure::RoomRemains
        }
    }

    /// Apply a client report, subject to the per-player rate limit.
    ///
    /// Fields that failed to parse (`None`) keep their previous value.
    /// Returns whether the update was accepted.
    pub fn update(
        &mut self,
        room_id: &str,
        connection: ConnectionId,
        snake: Option<Vec<Cell>>,
        score: Option<u64>,
        now: Instant,
    ) -> bool {
        let window = self.move_debounce;
        let Some(player) = self.player_mut(room_id, connection) else {
            return false;
        };
        if !player.try_accept_update(now, window) {
            debug!("Update from connection {} rate limited", connection);
            return false;
        }
        if let Some(snake) = snake {
            player.snake = snake;
        }
        if let Some(score) = score {
            player.score = score;
        }
        true
    }

    /// Change facing direction only.
    pub fn set_direction(&mut self, room_id: &str, connection: ConnectionId, dir: Direction) -> bool {
        match self.player_mut(room_id, connection) {
            Some(player) => {
                player.dir = dir;
                true
            }
            None => false,
        }
    }

    /// Consume the food at `cell` and replenish.
    ///
    /// A claim on a cell that is no longer food still triggers replenishment.
    /// Returns false only when the connection has no player in the room.
    pub fn eat_food(&mut self, room_id: &str, connection: ConnectionId, cell: Cell) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        if !room.players.contains_key(&connection) {
            return false;
        }
        let snake_cells = room.snake_cells();
        let eaten = self
            .placer
            .replenish(&mut self.rng, &mut room.foods, cell, &snake_cells);
        if !eaten {
            debug!(
                "Connection {} claimed ({}, {}) which is not food",
                connection, cell.x, cell.y
            );
        }
        true
    }

    /// Reset the player of `connection` to a fresh snake.
    pub fn restart(&mut self, room_id: &str, connection: ConnectionId) -> bool {
        let spawn = self.grid.center();
        match self.player_mut(room_id, connection) {
            Some(player) => {
                player.reset(spawn);
                true
            }
            None => false,
        }
    }

    fn player_mut(&mut self, room_id: &str, connection: ConnectionId) -> Option<&mut Player> {
        self.rooms
            .get_mut(room_id)
            .and_then(|room| room.players.get_mut(&connection))
    }
}

/// Trim and truncate to `max` characters, falling back to `default` when empty.
fn normalize(value: Option<&str>, max: usize, default: &str) -> String {
    let value = value.map(str::trim).filter(|value| !value.is_empty()).unwrap_or(default);
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.grid.size = 10;
        config.food.count = 3;
        config
    }

    fn registry() -> RoomRegistry {
        RoomRegistry::with_rng(&small_config(), StdRng::seed_from_u64(42))
    }

    fn assert_healthy(room: &Room) {
        let unique: HashSet<Cell> = room.foods.iter().copied().collect();
        assert_eq!(unique.len(), room.foods.len());
        assert!(room.foods.len() <= 3);
    }

    #[test]
    fn test_join_creates_room() {
        let mut registry = registry();
        let room_id = registry.join(1, Some("r1"), Some("ann"), Instant::now());
        assert_eq!(room_id, "r1");

        let room = registry.room("r1").unwrap();
        let player = &room.players[&1];
        assert_eq!(player.snake, vec![Cell::new(5, 5)]);
        assert_eq!(player.name, "ann");
        assert_eq!(room.foods.len(), 3);
        assert!(!room.foods.contains(&Cell::new(5, 5)));
        assert_healthy(room);
    }

    #[test]
    fn test_join_defaults_and_truncation() {
        let mut registry = registry();
        let now = Instant::now();
        assert_eq!(registry.join(1, None, None, now), "default room");
        assert_eq!(registry.room("default room").unwrap().players[&1].name, "anon player");

        assert_eq!(registry.join(2, Some("   "), Some(""), now), "default room");

        let long_room = "x".repeat(100);
        let long_name = "é".repeat(30);
        let room_id = registry.join(3, Some(&long_room), Some(&long_name), now);
        assert_eq!(room_id.chars().count(), 40);
        assert_eq!(registry.room(&room_id).unwrap().players[&3].name.chars().count(), 24);
    }

    #[test]
    fn test_rejoin_is_idempotent() {
        let mut registry = registry();
        let now = Instant::now();
        registry.join(1, Some("r1"), Some("ann"), now);
        registry.update("r1", 1, Some(vec![Cell::new(1, 1)]), Some(7), now);
        registry.join(1, Some("r1"), Some("ann2"), now);

        let room = registry.room("r1").unwrap();
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[&1].score, 0);
        assert_eq!(room.players[&1].name, "ann2");
    }

    #[test]
    fn test_one_entry_per_connection() {
        let mut registry = registry();
        let now = Instant::now();
        for id in 1..=5 {
            registry.join(id, Some("r1"), None, now);
        }
        registry.join(3, Some("r1"), None, now);
        registry.leave(2, "r1");

        let keys: HashSet<ConnectionId> = registry.room("r1").unwrap().members().collect();
        let expected: HashSet<ConnectionId> = [1, 3, 4, 5].into_iter().collect();
        assert_eq!(keys, expected);
        assert_eq!(registry.player_count(), 4);
    }

    #[test]
    fn test_leave_last_player_closes_room() {
        let mut registry = registry();
        let now = Instant::now();
        registry.join(1, Some("r1"), None, now);
        registry.join(2, Some("r1"), None, now);
        registry.update("r1", 2, Some(vec![Cell::new(0, 1)]), Some(4), now);

        assert_eq!(registry.leave(1, "r1"), Departure::RoomRemains);
        let remaining = &registry.room("r1").unwrap().players[&2];
        assert_eq!(remaining.snake, vec![Cell::new(0, 1)]);
        assert_eq!(remaining.score, 4);

        assert_eq!(registry.leave(2, "r1"), Departure::RoomClosed);
        assert!(registry.room("r1").is_none());
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.leave(2, "r1"), Departure::NotPresent);
    }

    #[test]
    fn test_update_rate_limited() {
        let mut registry = registry();
        let t0 = Instant::now();
        registry.join(1, Some("r1"), None, t0);

        assert!(registry.update("r1", 1, Some(vec![Cell::new(1, 1)]), Some(1), t0));
        assert!(!registry.update(
            "r1",
            1,
            Some(vec![Cell::new(2, 2)]),
            Some(2),
            t0 + Duration::from_millis(30)
        ));
        assert_eq!(registry.room("r1").unwrap().players[&1].score, 1);

        assert!(registry.update(
            "r1",
            1,
            Some(vec![Cell::new(3, 3)]),
            Some(3),
            t0 + Duration::from_millis(61)
        ));
        let player = &registry.room("r1").unwrap().players[&1];
        assert_eq!(player.snake, vec![Cell::new(3, 3)]);
        assert_eq!(player.score, 3);
    }

    #[test]
    fn test_update_keeps_malformed_fields() {
        let mut registry = registry();
        let t0 = Instant::now();
        registry.join(1, Some("r1"), None, t0);
        registry.update("r1", 1, Some(vec![Cell::new(4, 4), Cell::new(4, 5)]), Some(6), t0);

        assert!(registry.update("r1", 1, None, None, t0 + Duration::from_millis(100)));
        let player = &registry.room("r1").unwrap().players[&1];
        assert_eq!(player.snake, vec![Cell::new(4, 4), Cell::new(4, 5)]);
        assert_eq!(player.score, 6);
    }

    #[test]
    fn test_eat_food_replenishes() {
        let mut registry = registry();
        let now = Instant::now();
        registry.join(1, Some("r1"), None, now);
        let before = registry.room("r1").unwrap().foods.clone();
        let eaten = before[0];

        assert!(registry.eat_food("r1", 1, eaten));

        let room = registry.room("r1").unwrap();
        assert_eq!(room.foods.len(), 3);
        assert!(!room.foods.contains(&eaten));
        assert!(room.foods.contains(&before[1]));
        assert!(room.foods.contains(&before[2]));
        let snakes = room.snake_cells();
        assert!(room.foods.iter().all(|food| !snakes.contains(food)));
        assert_healthy(room);
    }

    #[test]
    fn test_double_claim_is_harmless() {
        let mut registry = registry();
        let now = Instant::now();
        registry.join(1, Some("r1"), None, now);
        registry.join(2, Some("r1"), None, now);
        let eaten = registry.room("r1").unwrap().foods[1];

        assert!(registry.eat_food("r1", 1, eaten));
        let after_first = registry.room("r1").unwrap().foods.clone();
        assert!(registry.eat_food("r1", 2, eaten));

        let room = registry.room("r1").unwrap();
        assert_eq!(room.foods, after_first);
        assert_healthy(room);
    }

    #[test]
    fn test_requires_player_in_room() {
        let mut registry = registry();
        let now = Instant::now();
        registry.join(1, Some("r1"), None, now);

        assert!(!registry.update("r1", 9, None, Some(5), now));
        assert!(!registry.update("nope", 1, None, Some(5), now));
        assert!(!registry.eat_food("r1", 9, Cell::new(0, 0)));
        assert!(!registry.restart("nope", 1));
        assert!(!registry.set_direction("r1", 9, Direction::Up));
    }

    #[test]
    fn test_restart_resets_player() {
        let mut registry = registry();
        let now = Instant::now();
        registry.join(1, Some("r1"), None, now);
        registry.update("r1", 1, Some(vec![Cell::new(0, 0), Cell::new(0, 1)]), Some(12), now);
        registry.set_direction("r1", 1, Direction::Down);

        assert!(registry.restart("r1", 1));

        let player = &registry.room("r1").unwrap().players[&1];
        assert_eq!(player.snake, vec![Cell::new(5, 5)]);
        assert_eq!(player.score, 0);
        assert_eq!(player.dir, Direction::Right);
    }

    #[test]
    fn test_join_tops_up_foods() {
        let mut registry = registry();
        let now = Instant::now();
        registry.join(1, Some("r1"), None, now);
        registry.rooms.get_mut("r1").unwrap().foods.truncate(1);

        registry.join(2, Some("r1"), None, now);

        assert_eq!(registry.room("r1").unwrap().foods.len(), 3);
    }
}
