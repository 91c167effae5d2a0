//! `BurrowServer` builder and lifecycle.
//!
//! This is the entry point for embedding Burrow. It ties the layers
//! together: settings → executors → user registry + room directory.

use std::marker::PhantomData;

use burrow_room::{RoomConfig, RoomError, RoomRegistry};
use burrow_session::{TransportHandle, UserRegistry, UserService};

use crate::{BurrowError, RoomSpec, ServerSettings, SettingsGate};

/// Builder for configuring and starting a Burrow server.
///
/// # Example
///
/// ```rust,ignore
/// let server = BurrowServer::<Outbox>::builder()
///     .kick_duplicate_on_login(true)
///     .room("lobby", RoomConfig::default())
///     .start()
///     .await?;
/// ```
pub struct BurrowServerBuilder<T> {
    settings: ServerSettings,
    _transport: PhantomData<fn() -> T>,
}

impl<T: TransportHandle> BurrowServerBuilder<T> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: ServerSettings::default(),
            _transport: PhantomData,
        }
    }

    /// Replaces all settings, e.g. with ones loaded from a file.
    pub fn settings(mut self, settings: ServerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn server_name(mut self, name: &str) -> Self {
        self.settings.server_name = name.to_string();
        self
    }

    pub fn kick_duplicate_on_login(mut self, enabled: bool) -> Self {
        self.settings.kick_duplicate_on_login = enabled;
        self
    }

    /// Sets the queue capacity of every executor the server spawns.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.settings.executor_queue_capacity = capacity;
        self
    }

    /// Adds a room to create at start.
    pub fn room(mut self, name: &str, config: RoomConfig) -> Self {
        self.settings.rooms.push(RoomSpec {
            name: name.to_string(),
            config,
        });
        self
    }

    /// Freezes the settings, spawns the executors and creates the
    /// configured rooms. Must be called within a Tokio runtime.
    ///
    /// # Errors
    /// - [`BurrowError::Settings`]: the settings failed validation
    /// - [`BurrowError::Room`]: a configured room could not be created
    pub async fn start(self) -> Result<BurrowServer<T>, BurrowError> {
        let mut gate = SettingsGate::new(self.settings);
        let settings = gate.start()?;

        let registry = UserRegistry::new(settings.registry_config());
        let rooms = RoomRegistry::with_capacity(settings.executor_queue_capacity);
        for spec in &settings.rooms {
            rooms.create(&spec.name, spec.config.clone()).await?;
        }

        tracing::info!(
            server = %settings.server_name,
            rooms = settings.rooms.len(),
            kick_duplicate_on_login = settings.kick_duplicate_on_login,
            "burrow server started"
        );

        Ok(BurrowServer {
            gate,
            users: UserService::new(registry, rooms),
        })
    }
}

impl<T: TransportHandle> Default for BurrowServerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Burrow server.
///
/// Cheap to clone: every clone talks to the same executors.
pub struct BurrowServer<T> {
    gate: SettingsGate,
    users: UserService<T, RoomRegistry<T>>,
}

impl<T> Clone for BurrowServer<T> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            users: self.users.clone(),
        }
    }
}

impl<T: TransportHandle> BurrowServer<T> {
    /// Creates a new builder.
    pub fn builder() -> BurrowServerBuilder<T> {
        BurrowServerBuilder::new()
    }

    /// The settings the server started with. Frozen.
    pub fn settings(&self) -> &ServerSettings {
        self.gate.settings()
    }

    /// Session workflows: login, join, leave, log out, kick.
    pub fn users(&self) -> &UserService<T, RoomRegistry<T>> {
        &self.users
    }

    pub fn registry(&self) -> &UserRegistry<T> {
        self.users.registry()
    }

    pub fn rooms(&self) -> &RoomRegistry<T> {
        self.users.rooms()
    }

    /// Destroys every room and stops the user registry.
    ///
    /// Rooms destroyed concurrently by someone else are skipped. Session
    /// operations on any clone of the server fail afterwards.
    pub async fn shutdown(&self) -> Result<(), BurrowError> {
        for name in self.rooms().names().await? {
            match self.rooms().destroy(&name).await {
                Ok(stranded) if !stranded.is_empty() => {
                    tracing::debug!(room = %name, members = stranded.len(), "room closed with members");
                }
                Ok(_) | Err(RoomError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.registry().shutdown().await?;

        tracing::info!(server = %self.settings().server_name, "burrow server stopped");
        Ok(())
    }
}
