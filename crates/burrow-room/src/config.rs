//! Room configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a room instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Maximum members allowed in the room. 0 means unlimited.
    pub max_users: usize,
}

impl RoomConfig {
    /// Returns `true` if a room holding `count` members can take one more.
    pub fn has_room_for(&self, count: usize) -> bool {
        self.max_users == 0 || count < self.max_users
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { max_users: 0 }
    }
}
