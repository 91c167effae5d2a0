//! Room transitions and logout: the workflows that span two subsystems.
//!
//! Joining a room touches both the user registry and the room itself. The
//! two are serialized independently, so a join is never atomic across
//! them. The ordering below keeps the registry from claiming a room
//! membership the room never accepted:
//!
//! ```text
//! join:   [leave old room] → room.add_user → registry.change_room(room)
//!                                               └─ fails? → room.remove_user
//! leave:  directory.lookup → room.remove_user → registry.change_room("")
//! logout: registry.logout_session → [lookup → remove_user, errors ignored]
//! kick:   registry.kick            → [lookup → remove_user, errors ignored]
//! ```
//!
//! Logout and kick take the session out of the registry first, in one
//! action, and then evict using the record that action removed. A stale
//! copy therefore never pulls a newer same-name session out of its room,
//! and the room named by the live record is the one that gets cleaned up.
//!
//! None of this runs inside the registry executor: rooms may take their
//! time, and an action must never wait on anything external.

use crate::{
    LoginOutcome, Room, RoomDirectory, SessionError, TransportHandle, User, UserRegistry,
    UserStatus,
};

/// Session operations for the transport and room layers.
///
/// Wraps a [`UserRegistry`] together with the [`RoomDirectory`] used to
/// resolve a user's current room by name.
pub struct UserService<T, D> {
    registry: UserRegistry<T>,
    rooms: D,
}

impl<T, D: Clone> Clone for UserService<T, D> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            rooms: self.rooms.clone(),
        }
    }
}

impl<T, D> UserService<T, D>
where
    T: TransportHandle,
    D: RoomDirectory<T>,
{
    pub fn new(registry: UserRegistry<T>, rooms: D) -> Self {
        Self { registry, rooms }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &UserRegistry<T> {
        &self.registry
    }

    /// The room directory used for lookups.
    pub fn rooms(&self) -> &D {
        &self.rooms
    }

    /// Logs a user in.
    ///
    /// If duplicate kicking is enabled and the name was already logged in,
    /// the replaced session is removed from its room (best-effort) before
    /// this returns.
    ///
    /// # Errors
    /// Same as [`UserRegistry::login`].
    pub async fn login(
        &self,
        name: &str,
        database_id: i64,
        is_guest: bool,
        transport: T,
    ) -> Result<User<T>, SessionError> {
        let LoginOutcome { user, replaced } = self
            .registry
            .login(name, database_id, is_guest, transport)
            .await?;

        if let Some(old) = replaced {
            tracing::info!(user = %old.name(), serial = old.serial(), "duplicate login, previous session kicked");
            self.evict_from_room(&old).await;
        }
        Ok(user)
    }

    /// Returns a fresh copy of the user's session.
    pub async fn get(&self, name: &str) -> Result<User<T>, SessionError> {
        self.registry.get(name).await
    }

    /// Moves the user into `room`, leaving their current room first.
    ///
    /// The room accepts the user before the registry records the move. If
    /// the registry then refuses (the user was logged out meanwhile), the
    /// room membership is rolled back.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyInRoom`]: already in `room`; the room is
    ///   not contacted
    /// - any error from leaving the current room; the join is abandoned
    /// - [`SessionError::Room`]: `room` refused the user
    /// - [`SessionError::NotLoggedIn`]: the session ended mid-join
    pub async fn join<R: Room<T>>(&self, user: &mut User<T>, room: &R) -> Result<(), SessionError> {
        if user.room_name() == room.name() {
            return Err(SessionError::AlreadyInRoom {
                user: user.name().to_string(),
                room: room.name().to_string(),
            });
        }

        if user.is_in_room() {
            self.leave(user).await?;
        }

        room.add_user(user.name(), user.transport().clone())
            .await
            .map_err(SessionError::room)?;

        if let Err(e) = self.registry.change_room(user, room.name()).await {
            if let Err(rollback) = room.remove_user(user.name()).await {
                tracing::warn!(
                    user = %user.name(),
                    room = %room.name(),
                    error = %rollback,
                    "failed to roll back room membership"
                );
            }
            return Err(e);
        }

        tracing::info!(user = %user.name(), room = %room.name(), "user joined room");
        Ok(())
    }

    /// Takes the user out of their current room.
    ///
    /// On any failure the user's room is left unchanged.
    ///
    /// # Errors
    /// - [`SessionError::NotInRoom`]: no current room; nothing is contacted
    /// - [`SessionError::RoomNotFound`]: the room no longer exists
    /// - [`SessionError::Room`]: the room or directory refused
    pub async fn leave(&self, user: &mut User<T>) -> Result<(), SessionError> {
        if !user.is_in_room() {
            return Err(SessionError::NotInRoom(user.name().to_string()));
        }

        let room = self.lookup(user.room_name()).await?;
        room.remove_user(user.name())
            .await
            .map_err(SessionError::room)?;

        let left = room.name().to_string();
        self.registry.change_room(user, "").await?;

        tracing::info!(user = %user.name(), room = %left, "user left room");
        Ok(())
    }

    /// Logs the user out. Never fails.
    ///
    /// Only this exact session is removed: if the name has since been
    /// logged in again, the newer session and its room membership stay.
    /// Room removal for the ended session is attempted and its errors are
    /// only logged.
    pub async fn log_out(&self, user: &User<T>) {
        match self.registry.logout_session(user).await {
            Ok(Some(live)) => self.evict_from_room(&live).await,
            Ok(None) => {
                tracing::debug!(user = %user.name(), serial = user.serial(), "session already ended");
            }
            Err(e) => {
                tracing::warn!(user = %user.name(), error = %e, "registry logout failed");
            }
        }
    }

    /// Kicks the named user: removes their live session, then takes them
    /// out of its room.
    ///
    /// # Errors
    /// - [`SessionError::InvalidArgument`]: empty name
    /// - [`SessionError::NotLoggedIn`]: no live session
    pub async fn kick(&self, name: &str) -> Result<(), SessionError> {
        let kicked = self.registry.kick(name).await?;
        self.evict_from_room(&kicked).await;
        Ok(())
    }

    /// Stores a new status for the user.
    pub async fn set_status(
        &self,
        user: &mut User<T>,
        status: UserStatus,
    ) -> Result<(), SessionError> {
        self.registry.set_status(user, status).await
    }

    async fn lookup(&self, name: &str) -> Result<D::Room, SessionError> {
        self.rooms
            .lookup(name)
            .await
            .map_err(SessionError::room)?
            .ok_or_else(|| SessionError::RoomNotFound(name.to_string()))
    }

    /// Best-effort removal from the user's current room.
    async fn evict_from_room(&self, user: &User<T>) {
        if !user.is_in_room() {
            return;
        }
        let outcome = match self.lookup(user.room_name()).await {
            Ok(room) => room.remove_user(user.name()).await.map_err(SessionError::room),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::warn!(
                user = %user.name(),
                room = %user.room_name(),
                error = %e,
                "could not remove user from room, continuing"
            );
        }
    }
}
