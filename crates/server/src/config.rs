//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Largest accepted grid side; keeps the cell area well inside `i32`.
const MAX_GRID_SIZE: i32 = 10_000;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid size must be between 1 and 10000, got {0}")]
    GridSize(i32),

    #[error("food count must be at least 1")]
    NoFood,

    #[error("{0} must be at least 1")]
    Zero(&'static str),

    #[error("food count {count} does not fit a grid of {area} cells")]
    TooMuchFood { count: usize, area: usize },
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub room: RoomConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    ///
    /// The `PORT` environment variable overrides `server.port`.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        let mut config: Self = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };

        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value {:?}", port),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make food placement impossible.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.grid.size;
        if !(1..=MAX_GRID_SIZE).contains(&size) {
            return Err(ConfigError::GridSize(size));
        }
        if self.food.count == 0 {
            return Err(ConfigError::NoFood);
        }
        let positive = [
            ("food.fill_attempts", self.food.fill_attempts),
            ("room.max_room_len", self.room.max_room_len),
            ("room.max_name_len", self.room.max_name_len),
            ("server.outbox_capacity", self.server.outbox_capacity),
        ];
        if let Some((field, _)) = positive.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero(field));
        }
        let area = (size as usize) * (size as usize);
        if self.food.count >= area {
            return Err(ConfigError::TooMuchFood {
                count: self.food.count,
                area,
            });
        }
        Ok(())
    }
}

/// Server networking settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
    /// Snapshots queued per connection before new ones are dropped.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
            outbox_capacity: default_outbox_capacity(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    1000
}
fn default_ip_limit() -> usize {
    50
}
fn default_outbox_capacity() -> usize {
    32
}

/// Board geometry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GridConfig {
    /// Width and height in cells.
    #[serde(default = "default_grid_size")]
    pub size: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
        }
    }
}

fn default_grid_size() -> i32 {
    40
}

/// Food placement configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Target number of food items per room.
    #[serde(default = "default_food_count")]
    pub count: usize,
    /// Lower bound on samples per single placement (raised to the grid area).
    #[serde(default = "default_min_pick_attempts")]
    pub min_pick_attempts: usize,
    /// Placement attempts per fill pass.
    #[serde(default = "default_fill_attempts")]
    pub fill_attempts: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            count: default_food_count(),
            min_pick_attempts: default_min_pick_attempts(),
            fill_attempts: default_fill_attempts(),
        }
    }
}

fn default_food_count() -> usize {
    7
}
fn default_min_pick_attempts() -> usize {
    200
}
fn default_fill_attempts() -> usize {
    500
}

/// Room and display name limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomConfig {
    #[serde(default = "default_max_room_len")]
    pub max_room_len: usize,
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
    #[serde(default = "default_room")]
    pub default_room: String,
    #[serde(default = "default_name")]
    pub default_name: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_room_len: default_max_room_len(),
            max_name_len: default_max_name_len(),
            default_room: default_room(),
            default_name: default_name(),
        }
    }
}

fn default_max_room_len() -> usize {
    40
}
fn default_max_name_len() -> usize {
    24
}
fn default_room() -> String {
    "default room".to_string()
}
fn default_name() -> String {
    "anon player".to_string()
}

/// Player update settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Minimum spacing between accepted updates from one connection.
    #[serde(default = "default_move_debounce_ms")]
    pub move_debounce_ms: u64,
}

impl PlayerConfig {
    pub fn move_debounce(&self) -> Duration {
        Duration::from_millis(self.move_debounce_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_debounce_ms: default_move_debounce_ms(),
        }
    }
}

fn default_move_debounce_ms() -> u64 {
    60
}

/// Snapshot options.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// Flag the top scorer in every snapshot.
    #[serde(default)]
    pub highlight_leader: bool,
}
