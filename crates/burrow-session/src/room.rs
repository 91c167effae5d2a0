//! The seam between sessions and rooms.
//!
//! The session layer doesn't own membership lists or broadcast. It only
//! needs to add a user to a room, remove them, and find a room by name.
//! The room layer implements these two traits; tests implement them with
//! mocks that record every call.

use std::future::Future;

/// A single room, as seen from the session layer.
///
/// # Trait bounds
///
/// `Send + Sync` because the workflows hold a `&Room` across awaits in
/// tasks that Tokio may move between threads.
pub trait Room<T>: Send + Sync {
    /// Error surfaced by the room. Passed through to the caller unchanged
    /// inside [`SessionError::Room`](crate::SessionError::Room).
    type Error: std::error::Error + Send + Sync + 'static;

    /// The room's unique name.
    fn name(&self) -> &str;

    /// Adds a member, storing the transport handle used to reach them.
    fn add_user(
        &self,
        name: &str,
        transport: T,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Removes a member.
    fn remove_user(&self, name: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Finds rooms by name.
pub trait RoomDirectory<T>: Send + Sync {
    /// The room type this directory hands out.
    type Room: Room<T>;

    /// Error surfaced by the lookup itself (not "room missing").
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up a room.
    ///
    /// # Returns
    /// - `Ok(Some(room))`: found
    /// - `Ok(None)`: no room with this name
    /// - `Err(_)`: the directory could not answer
    fn lookup(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Self::Room>, Self::Error>> + Send;
}
