//! Room snapshots sent to clients after every change.

use crate::room::Room;
use protocol::{ConnectionId, GameSnapshot};

/// Build the full state of `room`.
///
/// With `highlight` set, the current leader is flagged in the snapshot. The
/// leader is recomputed on every call.
pub fn build_snapshot(room: &Room, highlight: bool) -> GameSnapshot {
    GameSnapshot {
        players: room
            .players
            .iter()
            .map(|(&id, player)| (id, player.state()))
            .collect(),
        foods: room.foods.clone(),
        highlight: if highlight { leader(room) } else { None },
    }
}

/// Highest score wins; ties go to the earliest join, then the lowest id.
pub fn leader(room: &Room) -> Option<ConnectionId> {
    room.players
        .values()
        .min_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.joined_at.cmp(&b.joined_at))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|player| player.id)
}
