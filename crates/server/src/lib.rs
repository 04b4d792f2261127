//! Snake relay server library.
//!
//! Rooms of players whose clients simulate their own snakes; the server keeps
//! the shared food set and relays full room snapshots.

pub mod config;
pub mod food;
pub mod grid;
pub mod registry;
pub mod room;
pub mod router;
pub mod server;
pub mod snapshot;

pub use config::Config;
pub use server::{run, ConnectionLimits, ConnectionPermit, Inbound, Relay, RelayStats};
