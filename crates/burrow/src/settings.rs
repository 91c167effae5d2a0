//! Server settings and the one-way gate that freezes them at start.

use std::collections::HashSet;

use burrow_executor::DEFAULT_QUEUE_CAPACITY;
use burrow_room::RoomConfig;
use burrow_session::RegistryConfig;
use serde::{Deserialize, Serialize};

/// Errors from editing or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The server has started; settings can no longer change.
    #[error("settings are frozen: server already started")]
    AlreadyStarted,

    /// The settings cannot be used to start a server.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// ServerSettings
// ---------------------------------------------------------------------------

/// A room created automatically when the server starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub name: String,
    #[serde(default)]
    pub config: RoomConfig,
}

/// Process-wide settings, read once when the server starts.
///
/// Missing fields fall back to their defaults when deserialized, so a
/// settings file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// The server's own name, used in logs.
    ///
    /// Default: `"!server!"`.
    pub server_name: String,

    /// Replace an existing session on a duplicate login instead of
    /// rejecting the new one.
    ///
    /// Default: `false`.
    pub kick_duplicate_on_login: bool,

    /// Queue capacity of every executor the server spawns.
    ///
    /// Default: 1024.
    pub executor_queue_capacity: usize,

    /// Rooms to create at start.
    pub rooms: Vec<RoomSpec>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            server_name: "!server!".to_string(),
            kick_duplicate_on_login: false,
            executor_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            rooms: Vec::new(),
        }
    }
}

impl ServerSettings {
    /// The user registry configuration these settings describe.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            kick_duplicate_on_login: self.kick_duplicate_on_login,
            queue_capacity: self.executor_queue_capacity,
        }
    }

    /// Checks the settings can start a server.
    ///
    /// # Errors
    /// [`SettingsError::Invalid`] for an empty server name, a zero queue
    /// capacity, or a start room with an empty or repeated name.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.server_name.is_empty() {
            return Err(SettingsError::Invalid("server_name is empty".into()));
        }
        if self.executor_queue_capacity == 0 {
            return Err(SettingsError::Invalid(
                "executor_queue_capacity must be at least 1".into(),
            ));
        }
        let mut seen = HashSet::new();
        for room in &self.rooms {
            if room.name.is_empty() {
                return Err(SettingsError::Invalid("room with empty name".into()));
            }
            if !seen.insert(room.name.as_str()) {
                return Err(SettingsError::Invalid(format!(
                    "room {} listed twice",
                    room.name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SettingsGate
// ---------------------------------------------------------------------------

/// Holds settings until the server starts, then refuses every change.
///
/// ```text
///   Configuring ──(start)──→ Started
///     edits ok                 edits → AlreadyStarted
/// ```
///
/// The transition happens once and is never undone.
#[derive(Debug, Clone, Default)]
pub struct SettingsGate {
    settings: ServerSettings,
    started: bool,
}

impl SettingsGate {
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings,
            started: false,
        }
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Replaces the settings wholesale.
    ///
    /// # Errors
    /// [`SettingsError::AlreadyStarted`] once started.
    pub fn replace(&mut self, settings: ServerSettings) -> Result<(), SettingsError> {
        self.configure(|current| *current = settings)
    }

    /// Edits the settings in place.
    ///
    /// # Errors
    /// [`SettingsError::AlreadyStarted`] once started; `edit` is not run.
    pub fn configure(
        &mut self,
        edit: impl FnOnce(&mut ServerSettings),
    ) -> Result<(), SettingsError> {
        if self.started {
            tracing::debug!("settings change rejected, server already started");
            return Err(SettingsError::AlreadyStarted);
        }
        edit(&mut self.settings);
        Ok(())
    }

    /// Validates and freezes the settings. Calling it again is a no-op.
    ///
    /// # Errors
    /// [`SettingsError::Invalid`] on the first call if validation fails;
    /// the gate then stays open so the settings can be fixed.
    pub fn start(&mut self) -> Result<&ServerSettings, SettingsError> {
        if !self.started {
            self.settings.validate()?;
            self.started = true;
        }
        Ok(&self.settings)
    }
}
