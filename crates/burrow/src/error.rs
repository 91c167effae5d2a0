//! Unified error type for Burrow.

use burrow_executor::ExecutorError;
use burrow_room::RoomError;
use burrow_session::SessionError;

use crate::SettingsError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BurrowError {
    /// An executor rejected or lost an action.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// A session operation failed (login, join, leave, kick).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation failed (full, not found, destroyed).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Settings were invalid or edited after start.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
