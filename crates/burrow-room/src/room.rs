//! A single room: its members and the handle used to reach them.
//!
//! The member map is owned by the room's executor worker. Handles only
//! submit actions, so two joins racing for the last slot are decided by
//! queue order, never by a lock.

use std::collections::HashMap;
use std::sync::Arc;

use burrow_executor::{ActionExecutor, ExecutorConfig};
use burrow_session::{Room, TransportHandle};

use crate::{RoomConfig, RoomError};

/// State owned by a room's worker.
struct Members<T> {
    room: Arc<str>,
    config: RoomConfig,
    users: HashMap<String, T>,
    /// Set by the action that starts shutdown. Membership is frozen from
    /// then on, so the member list that action returns is final.
    closed: bool,
}

impl<T> Members<T> {
    fn add(&mut self, name: String, transport: T) -> Result<usize, RoomError> {
        if self.closed {
            return Err(RoomError::NotFound(self.room.to_string()));
        }
        if self.users.contains_key(&name) {
            return Err(RoomError::AlreadyInRoom {
                user: name,
                room: self.room.to_string(),
            });
        }
        if !self.config.has_room_for(self.users.len()) {
            return Err(RoomError::RoomFull(self.room.to_string()));
        }
        self.users.insert(name, transport);
        Ok(self.users.len())
    }

    fn remove(&mut self, name: &str) -> Result<usize, RoomError> {
        if self.closed {
            return Err(RoomError::NotFound(self.room.to_string()));
        }
        if self.users.remove(name).is_none() {
            return Err(RoomError::NotInRoom {
                user: name.to_string(),
                room: self.room.to_string(),
            });
        }
        Ok(self.users.len())
    }

    fn close(&mut self) -> Vec<String> {
        self.closed = true;
        self.users.keys().cloned().collect()
    }
}

/// Handle to a running room.
///
/// Cheap to clone: a name plus an executor handle. The
/// [`RoomRegistry`](crate::RoomRegistry) holds one of these per room.
pub struct RoomHandle<T> {
    name: Arc<str>,
    config: RoomConfig,
    executor: ActionExecutor<Members<T>>,
}

impl<T> Clone for RoomHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            config: self.config.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<T> std::fmt::Debug for RoomHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

impl<T: TransportHandle> RoomHandle<T> {
    /// Spawns the room's executor. Must be called within a Tokio runtime.
    pub(crate) fn spawn(name: &str, config: RoomConfig, queue_capacity: usize) -> Self {
        let name: Arc<str> = Arc::from(name);
        let members = Members {
            room: Arc::clone(&name),
            config: config.clone(),
            users: HashMap::new(),
            closed: false,
        };
        let executor = ActionExecutor::spawn(
            members,
            ExecutorConfig::named(format!("room:{name}")).with_capacity(queue_capacity),
        );
        Self {
            name,
            config,
            executor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Adds a member.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`]: already a member
    /// - [`RoomError::RoomFull`]: `max_users` reached
    /// - [`RoomError::NotFound`]: the room is being destroyed
    /// - [`RoomError::Unavailable`]: the room was destroyed
    pub async fn add_user(&self, name: &str, transport: T) -> Result<(), RoomError> {
        let key = name.to_string();
        let count = self
            .executor
            .submit(move |members| members.add(key, transport))
            .await??;
        tracing::debug!(room = %self.name, user = %name, members = count, "member added");
        Ok(())
    }

    /// Removes a member.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`]: not a member
    /// - [`RoomError::NotFound`]: the room is being destroyed
    /// - [`RoomError::Unavailable`]: the room was destroyed
    pub async fn remove_user(&self, name: &str) -> Result<(), RoomError> {
        let key = name.to_string();
        let count = self
            .executor
            .submit(move |members| members.remove(&key))
            .await??;
        tracing::debug!(room = %self.name, user = %name, members = count, "member removed");
        Ok(())
    }

    /// Names of the current members, in no particular order.
    pub async fn users(&self) -> Result<Vec<String>, RoomError> {
        Ok(self
            .executor
            .submit(|members| members.users.keys().cloned().collect())
            .await?)
    }

    pub async fn user_count(&self) -> Result<usize, RoomError> {
        Ok(self.executor.submit(|members| members.users.len()).await?)
    }

    pub async fn contains(&self, name: &str) -> Result<bool, RoomError> {
        let key = name.to_string();
        Ok(self
            .executor
            .submit(move |members| members.users.contains_key(&key))
            .await?)
    }

    /// The transport handle a member joined with, if they are a member.
    pub async fn transport_of(&self, name: &str) -> Result<Option<T>, RoomError> {
        let key = name.to_string();
        Ok(self
            .executor
            .submit(move |members| members.users.get(&key).cloned())
            .await?)
    }

    /// Stops the room's executor. Returns the names of members it held.
    ///
    /// The list is taken in the same action that freezes membership, so
    /// no add or remove can land between the two.
    pub(crate) async fn shutdown(&self) -> Vec<String> {
        let members = self
            .executor
            .submit(|members| members.close())
            .await
            .unwrap_or_default();
        if let Err(e) = self.executor.shutdown().await {
            tracing::debug!(room = %self.name, error = %e, "room already stopped");
        }
        members
    }
}

impl<T: TransportHandle> Room<T> for RoomHandle<T> {
    type Error = RoomError;

    fn name(&self) -> &str {
        &self.name
    }

    async fn add_user(&self, name: &str, transport: T) -> Result<(), RoomError> {
        RoomHandle::add_user(self, name, transport).await
    }

    async fn remove_user(&self, name: &str) -> Result<(), RoomError> {
        RoomHandle::remove_user(self, name).await
    }
}
