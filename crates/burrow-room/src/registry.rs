//! Room directory: creates, tracks and destroys rooms by name.

use std::collections::HashMap;

use burrow_executor::{ActionExecutor, DEFAULT_QUEUE_CAPACITY, ExecutorConfig};
use burrow_session::{RoomDirectory, TransportHandle};

use crate::{RoomConfig, RoomError, RoomHandle};

/// Manages all active rooms.
///
/// This is the entry point for room operations from higher layers. The
/// name → handle map is owned by its own executor, so creating a room and
/// looking one up never race.
pub struct RoomRegistry<T> {
    executor: ActionExecutor<HashMap<String, RoomHandle<T>>>,
    queue_capacity: usize,
}

impl<T> Clone for RoomRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            queue_capacity: self.queue_capacity,
        }
    }
}

impl<T: TransportHandle> RoomRegistry<T> {
    /// Creates an empty directory with the default queue capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates an empty directory. `queue_capacity` applies to the
    /// directory and to every room it creates.
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self {
            executor: ActionExecutor::spawn(
                HashMap::new(),
                ExecutorConfig::named("rooms").with_capacity(queue_capacity),
            ),
            queue_capacity,
        }
    }

    /// Creates a room and returns a handle to it.
    ///
    /// # Errors
    /// - [`RoomError::InvalidArgument`]: empty name
    /// - [`RoomError::AlreadyExists`]: the name is taken
    pub async fn create(&self, name: &str, config: RoomConfig) -> Result<RoomHandle<T>, RoomError> {
        if name.is_empty() {
            return Err(RoomError::InvalidArgument("room requires a name".into()));
        }
        let key = name.to_string();
        let capacity = self.queue_capacity;
        let handle = self
            .executor
            .submit(move |rooms| {
                if rooms.contains_key(&key) {
                    return Err(RoomError::AlreadyExists(key));
                }
                let handle = RoomHandle::spawn(&key, config, capacity);
                rooms.insert(key, handle.clone());
                Ok(handle)
            })
            .await??;

        tracing::info!(room = %name, max_users = handle.config().max_users, "room created");
        Ok(handle)
    }

    /// Returns the handle for a room.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if there is no such room.
    pub async fn get(&self, name: &str) -> Result<RoomHandle<T>, RoomError> {
        self.find(name)
            .await?
            .ok_or_else(|| RoomError::NotFound(name.to_string()))
    }

    /// Removes a room from the directory and shuts it down.
    ///
    /// Returns the names of the members it still held. Their sessions
    /// keep pointing at the room until they leave or log out; a leave
    /// then reports the room as not found.
    pub async fn destroy(&self, name: &str) -> Result<Vec<String>, RoomError> {
        let key = name.to_string();
        let handle = self
            .executor
            .submit(move |rooms| rooms.remove(&key))
            .await?
            .ok_or_else(|| RoomError::NotFound(name.to_string()))?;

        // Shut down outside the directory's action: it waits on the room.
        let members = handle.shutdown().await;
        tracing::info!(room = %name, stranded = members.len(), "room destroyed");
        Ok(members)
    }

    /// Names of all rooms, in no particular order.
    pub async fn names(&self) -> Result<Vec<String>, RoomError> {
        Ok(self
            .executor
            .submit(|rooms| rooms.keys().cloned().collect())
            .await?)
    }

    /// Returns the number of active rooms.
    pub async fn len(&self) -> Result<usize, RoomError> {
        Ok(self.executor.submit(|rooms| rooms.len()).await?)
    }

    pub async fn is_empty(&self) -> Result<bool, RoomError> {
        Ok(self.len().await? == 0)
    }

    async fn find(&self, name: &str) -> Result<Option<RoomHandle<T>>, RoomError> {
        let key = name.to_string();
        Ok(self
            .executor
            .submit(move |rooms| rooms.get(&key).cloned())
            .await?)
    }
}

impl<T: TransportHandle> Default for RoomRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TransportHandle> RoomDirectory<T> for RoomRegistry<T> {
    type Room = RoomHandle<T>;
    type Error = RoomError;

    async fn lookup(&self, name: &str) -> Result<Option<RoomHandle<T>>, RoomError> {
        self.find(name).await
    }
}
