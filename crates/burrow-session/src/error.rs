//! Error types for the session layer.

use burrow_executor::ExecutorError;

/// Errors that can occur during session management.
///
/// None of these are retried automatically; whether to retry a failed
/// login, for example, is the caller's decision.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Malformed input, rejected before reaching the registry.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The name already has a live session.
    #[error("user '{0}' is already logged in")]
    AlreadyLoggedIn(String),

    /// No live session exists for this name, or the caller's copy belongs
    /// to a session that has since ended.
    #[error("user '{0}' is not logged in")]
    NotLoggedIn(String),

    /// The user is already in the room they asked to join.
    #[error("user '{user}' is already in room '{room}'")]
    AlreadyInRoom {
        /// The user's name.
        user: String,
        /// The room they are already in.
        room: String,
    },

    /// The user asked to leave but is not in any room.
    #[error("user '{0}' is not in a room")]
    NotInRoom(String),

    /// The room directory has no room with this name.
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    /// The room layer refused the operation. The original error is kept
    /// as-is and can be downcast by the caller.
    #[error("room operation failed: {0}")]
    Room(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The registry's executor is saturated, stopped, or the action panicked.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl SessionError {
    /// Wraps an error surfaced by a room collaborator.
    pub fn room(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Room(Box::new(err))
    }
}
