//! Error types for the room layer.

use burrow_executor::ExecutorError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room '{0}' not found")]
    NotFound(String),

    /// A room with this name already exists.
    #[error("room '{0}' already exists")]
    AlreadyExists(String),

    /// The room is full, no more member slots available.
    #[error("room '{0}' is full")]
    RoomFull(String),

    /// The user is already a member of this room.
    #[error("user '{user}' already in room '{room}'")]
    AlreadyInRoom {
        /// The user's name.
        user: String,
        /// The room's name.
        room: String,
    },

    /// The user is not a member of this room.
    #[error("user '{user}' not in room '{room}'")]
    NotInRoom {
        /// The user's name.
        user: String,
        /// The room's name.
        room: String,
    },

    /// Malformed input, such as an empty room name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The room's (or the directory's) executor is full or shut down.
    #[error("room unavailable: {0}")]
    Unavailable(#[from] ExecutorError),
}
