//! The user registry: the authoritative map of logged-in users.
//!
//! The map lives inside an [`ActionExecutor`] worker. Every public method
//! here packages its logic as an action, so:
//! - checks and the writes that depend on them happen in one step
//!   (no check-then-act race between two logins for the same name)
//! - readers always get a copy taken between two complete actions
//!
//! Cheap validation (empty names, out-of-range ids) happens before the
//! action is submitted; it doesn't need serializing.

use std::collections::HashMap;

use burrow_executor::{ActionExecutor, DEFAULT_QUEUE_CAPACITY, ExecutorConfig};

use crate::{NO_DATABASE_ID, SessionError, TransportHandle, User, UserStatus};

/// Configuration for a [`UserRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// When `true`, logging in under a name that already has a live
    /// session replaces that session instead of failing with
    /// [`SessionError::AlreadyLoggedIn`].
    ///
    /// Default: `false`.
    pub kick_duplicate_on_login: bool,

    /// Capacity of the registry executor's queue.
    pub queue_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            kick_duplicate_on_login: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome<T> {
    /// The new session.
    pub user: User<T>,

    /// The session it replaced, when duplicate kicking is enabled and the
    /// name was already logged in. The caller still has to pull it out of
    /// its room.
    pub replaced: Option<User<T>>,
}

/// State owned by the registry's worker. Never touched from anywhere else.
struct Users<T> {
    sessions: HashMap<String, User<T>>,
    /// Sessions ever created. Diagnostic only; never decremented.
    count: u64,
}

impl<T: TransportHandle> Users<T> {
    fn login(
        &mut self,
        name: String,
        database_id: i64,
        is_guest: bool,
        transport: T,
        kick_duplicates: bool,
    ) -> Result<LoginOutcome<T>, SessionError> {
        let replaced = if self.sessions.contains_key(&name) {
            if !kick_duplicates {
                return Err(SessionError::AlreadyLoggedIn(name));
            }
            self.sessions.remove(&name)
        } else {
            None
        };

        self.count += 1;
        let user = User::new(name.clone(), database_id, is_guest, transport, self.count);
        self.sessions.insert(name, user.clone());

        Ok(LoginOutcome { user, replaced })
    }

    /// The live entry for this exact session, or `NotLoggedIn` if the name
    /// is gone or now belongs to a newer login.
    fn live_mut(&mut self, name: &str, serial: u64) -> Result<&mut User<T>, SessionError> {
        self.sessions
            .get_mut(name)
            .filter(|u| u.serial() == serial)
            .ok_or_else(|| SessionError::NotLoggedIn(name.to_string()))
    }
}

/// Handle to the registry of logged-in users.
///
/// Cloning is cheap; all clones share the same map and the same total
/// order of operations.
pub struct UserRegistry<T> {
    executor: ActionExecutor<Users<T>>,
    kick_duplicates: bool,
}

impl<T> Clone for UserRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            kick_duplicates: self.kick_duplicates,
        }
    }
}

impl<T: TransportHandle> UserRegistry<T> {
    /// Spawns the registry's executor. Must be called within a Tokio runtime.
    pub fn new(config: RegistryConfig) -> Self {
        let users = Users {
            sessions: HashMap::new(),
            count: 0,
        };
        let executor = ActionExecutor::spawn(
            users,
            ExecutorConfig::named("users").with_capacity(config.queue_capacity),
        );
        Self {
            executor,
            kick_duplicates: config.kick_duplicate_on_login,
        }
    }

    /// Returns `true` if duplicate logins replace the existing session.
    pub fn kicks_duplicates(&self) -> bool {
        self.kick_duplicates
    }

    /// Logs a user in and returns their new session.
    ///
    /// Guests always get [`NO_DATABASE_ID`], whatever `database_id` says.
    ///
    /// # Errors
    /// - [`SessionError::InvalidArgument`]: empty name or `database_id < -1`
    /// - [`SessionError::AlreadyLoggedIn`]: the name is taken and
    ///   duplicate kicking is off
    pub async fn login(
        &self,
        name: &str,
        database_id: i64,
        is_guest: bool,
        transport: T,
    ) -> Result<LoginOutcome<T>, SessionError> {
        if name.is_empty() {
            return Err(SessionError::InvalidArgument("login requires a user name".into()));
        }
        if database_id < NO_DATABASE_ID {
            return Err(SessionError::InvalidArgument(format!(
                "login requires a database id or {NO_DATABASE_ID} for none, got {database_id}"
            )));
        }
        let database_id = if is_guest { NO_DATABASE_ID } else { database_id };

        let name = name.to_string();
        let kick = self.kick_duplicates;
        let outcome = self
            .executor
            .submit(move |users| users.login(name, database_id, is_guest, transport, kick))
            .await??;

        tracing::info!(
            user = %outcome.user.name(),
            serial = outcome.user.serial(),
            guest = is_guest,
            replaced = outcome.replaced.is_some(),
            "user logged in"
        );
        Ok(outcome)
    }

    /// Returns a copy of the user's current session.
    ///
    /// # Errors
    /// - [`SessionError::InvalidArgument`]: empty name
    /// - [`SessionError::NotLoggedIn`]: no live session
    pub async fn get(&self, name: &str) -> Result<User<T>, SessionError> {
        if name.is_empty() {
            return Err(SessionError::InvalidArgument("get requires a user name".into()));
        }
        let name = name.to_string();
        self.executor
            .submit(move |users| {
                users
                    .sessions
                    .get(&name)
                    .cloned()
                    .ok_or(SessionError::NotLoggedIn(name))
            })
            .await?
    }

    /// Records `room` as the user's current room (`""` for none) and
    /// updates the caller's copy to match.
    ///
    /// # Errors
    /// [`SessionError::NotLoggedIn`] if the session has ended, including
    /// when the name now belongs to a newer login.
    pub(crate) async fn change_room(
        &self,
        user: &mut User<T>,
        room: &str,
    ) -> Result<(), SessionError> {
        let name = user.name().to_string();
        let serial = user.serial();
        let target = room.to_string();
        self.executor
            .submit(move |users| {
                users.live_mut(&name, serial)?.set_room(&target);
                Ok::<_, SessionError>(())
            })
            .await??;

        user.set_room(room);
        Ok(())
    }

    /// Stores a new status for the user and updates the caller's copy.
    ///
    /// # Errors
    /// [`SessionError::NotLoggedIn`] if the session has ended.
    pub async fn set_status(
        &self,
        user: &mut User<T>,
        status: UserStatus,
    ) -> Result<(), SessionError> {
        let name = user.name().to_string();
        let serial = user.serial();
        self.executor
            .submit(move |users| {
                users.live_mut(&name, serial)?.set_status(status);
                Ok::<_, SessionError>(())
            })
            .await??;

        user.set_status(status);
        Ok(())
    }

    /// Removes the session for `name`, whichever login it belongs to.
    ///
    /// Logging out a name that isn't logged in is not an error. Returns
    /// `true` if a session was removed.
    pub async fn logout(&self, name: &str) -> Result<bool, SessionError> {
        let key = name.to_string();
        let removed = self
            .executor
            .submit(move |users| users.sessions.remove(&key).is_some())
            .await?;
        if removed {
            tracing::info!(user = %name, "user logged out");
        }
        Ok(removed)
    }

    /// Removes exactly this session. A newer login under the same name is
    /// left alone.
    ///
    /// Returns the live record that was removed, or `None` if this session
    /// had already ended. The record's room is the authoritative one; the
    /// caller's copy may be out of date.
    pub async fn logout_session(&self, user: &User<T>) -> Result<Option<User<T>>, SessionError> {
        let name = user.name().to_string();
        let serial = user.serial();
        let removed = self
            .executor
            .submit(move |users| {
                users.live_mut(&name, serial).ok()?;
                users.sessions.remove(&name)
            })
            .await?;
        if removed.is_some() {
            tracing::info!(user = %user.name(), serial, "user logged out");
        }
        Ok(removed)
    }

    /// Removes the session for `name` and returns it.
    ///
    /// The lookup and the removal are one action, so nobody can log the
    /// user out (or back in) in between.
    ///
    /// # Errors
    /// - [`SessionError::InvalidArgument`]: empty name
    /// - [`SessionError::NotLoggedIn`]: no live session
    pub async fn kick(&self, name: &str) -> Result<User<T>, SessionError> {
        if name.is_empty() {
            return Err(SessionError::InvalidArgument("kick requires a user name".into()));
        }
        let key = name.to_string();
        let user = self
            .executor
            .submit(move |users| {
                users
                    .sessions
                    .remove(&key)
                    .ok_or(SessionError::NotLoggedIn(key))
            })
            .await??;
        tracing::info!(user = %name, "user kicked");
        Ok(user)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> Result<usize, SessionError> {
        Ok(self.executor.submit(|users| users.sessions.len()).await?)
    }

    pub async fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.len().await? == 0)
    }

    /// Names of all live sessions, in no particular order.
    pub async fn names(&self) -> Result<Vec<String>, SessionError> {
        Ok(self
            .executor
            .submit(|users| users.sessions.keys().cloned().collect())
            .await?)
    }

    /// Total sessions ever created, including ones since logged out.
    pub async fn total_logins(&self) -> Result<u64, SessionError> {
        Ok(self.executor.submit(|users| users.count).await?)
    }

    /// Stops the registry's executor. Later calls fail with
    /// [`SessionError::Executor`].
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        Ok(self.executor.shutdown().await?)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `UserRegistry`.
    //!
    //! Transport handles are plain `&'static str` labels here; the
    //! registry never looks inside them.

    use super::*;

    type Registry = UserRegistry<&'static str>;

    fn registry() -> Registry {
        UserRegistry::new(RegistryConfig::default())
    }

    fn kicking_registry() -> Registry {
        UserRegistry::new(RegistryConfig {
            kick_duplicate_on_login: true,
            ..RegistryConfig::default()
        })
    }

    // =====================================================================
    // login()
    // =====================================================================

    #[tokio::test]
    async fn test_login_new_user_returns_fresh_session() {
        let reg = registry();

        let outcome = reg.login("alice", 7, false, "T1").await.unwrap();

        let user = outcome.user;
        assert_eq!(user.name(), "alice");
        assert_eq!(user.database_id(), 7);
        assert!(!user.is_guest());
        assert_eq!(user.room_name(), "");
        assert_eq!(user.status(), UserStatus::Available);
        assert_eq!(*user.transport(), "T1");
        assert!(outcome.replaced.is_none());
    }

    #[tokio::test]
    async fn test_login_guest_forces_no_database_id() {
        let reg = registry();

        let user = reg.login("guest", 42, true, "T1").await.unwrap().user;

        assert!(user.is_guest());
        assert_eq!(user.database_id(), NO_DATABASE_ID);
    }

    #[tokio::test]
    async fn test_login_empty_name_is_invalid() {
        let reg = registry();

        let result = reg.login("", 1, false, "T1").await;

        assert!(matches!(result, Err(SessionError::InvalidArgument(_))));
        assert_eq!(reg.total_logins().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_login_database_id_below_minus_one_is_invalid() {
        let reg = registry();

        let result = reg.login("alice", -2, false, "T1").await;

        assert!(matches!(result, Err(SessionError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_login_duplicate_name_returns_already_logged_in() {
        let reg = registry();
        reg.login("alice", -1, true, "T1").await.unwrap();

        let result = reg.login("alice", 7, false, "T2").await;

        assert!(
            matches!(&result, Err(SessionError::AlreadyLoggedIn(n)) if n == "alice"),
            "got {result:?}"
        );
        // The original session is untouched.
        assert_eq!(*reg.get("alice").await.unwrap().transport(), "T1");
    }

    #[tokio::test]
    async fn test_login_names_are_case_sensitive() {
        let reg = registry();
        reg.login("alice", -1, true, "T1").await.unwrap();

        reg.login("Alice", -1, true, "T2").await.unwrap();

        assert_eq!(reg.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_login_with_kick_replaces_live_session() {
        let reg = kicking_registry();
        let first = reg.login("alice", -1, true, "T1").await.unwrap().user;

        let outcome = reg.login("alice", 7, false, "T2").await.unwrap();

        let replaced = outcome.replaced.expect("old session should be returned");
        assert_eq!(replaced.serial(), first.serial());
        assert_eq!(*outcome.user.transport(), "T2");
        assert_eq!(reg.len().await.unwrap(), 1);
        assert_eq!(reg.get("alice").await.unwrap().database_id(), 7);
    }

    // =====================================================================
    // get() / logout()
    // =====================================================================

    #[tokio::test]
    async fn test_get_unknown_user_returns_not_logged_in() {
        let reg = registry();

        let result = reg.get("nobody").await;

        assert!(matches!(result, Err(SessionError::NotLoggedIn(_))));
    }

    #[tokio::test]
    async fn test_get_after_logout_returns_not_logged_in() {
        let reg = registry();
        reg.login("alice", -1, true, "T1").await.unwrap();

        assert!(reg.logout("alice").await.unwrap());
        let result = reg.get("alice").await;

        assert!(matches!(result, Err(SessionError::NotLoggedIn(_))));
    }

    #[tokio::test]
    async fn test_logout_missing_user_is_harmless() {
        let reg = registry();

        assert!(!reg.logout("ghost").await.unwrap());
        assert!(!reg.logout("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_login_after_logout_creates_independent_session() {
        let reg = registry();
        let mut first = reg.login("alice", -1, true, "T1").await.unwrap().user;
        reg.change_room(&mut first, "lobby").await.unwrap();
        reg.set_status(&mut first, UserStatus::InGame).await.unwrap();
        reg.logout("alice").await.unwrap();

        let second = reg.login("alice", 7, false, "T2").await.unwrap().user;

        assert_eq!(second.database_id(), 7);
        assert_eq!(second.room_name(), "");
        assert_eq!(second.status(), UserStatus::Available);
        assert_ne!(second.serial(), first.serial());
        assert_eq!(reg.total_logins().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_logout_session_spares_newer_login() {
        let reg = kicking_registry();
        let old = reg.login("alice", -1, true, "T1").await.unwrap().user;
        reg.login("alice", -1, true, "T2").await.unwrap();

        let removed = reg.logout_session(&old).await.unwrap();

        assert!(removed.is_none());
        assert_eq!(*reg.get("alice").await.unwrap().transport(), "T2");
    }

    #[tokio::test]
    async fn test_logout_session_returns_live_record() {
        let reg = registry();
        let stale = reg.login("alice", -1, true, "T1").await.unwrap().user;
        let mut live = reg.get("alice").await.unwrap();
        reg.change_room(&mut live, "lobby").await.unwrap();

        let removed = reg.logout_session(&stale).await.unwrap().expect("live session");

        assert_eq!(removed.room_name(), "lobby", "room comes from the registry, not the copy");
        assert!(reg.is_empty().await.unwrap());
        assert!(reg.logout_session(&stale).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_login_concurrent_same_name_admits_one() {
        let reg = UserRegistry::<u32>::new(RegistryConfig::default());

        let attempts: Vec<_> = (0..32)
            .map(|transport| {
                let reg = reg.clone();
                tokio::spawn(async move { reg.login("alice", -1, true, transport).await })
            })
            .collect();
        let mut winners = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(e, SessionError::AlreadyLoggedIn(_)), "got {e:?}"),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(reg.len().await.unwrap(), 1);
        assert_eq!(reg.total_logins().await.unwrap(), 1);
    }

    // =====================================================================
    // change_room() / set_status()
    // =====================================================================

    #[tokio::test]
    async fn test_change_room_updates_registry_and_copy() {
        let reg = registry();
        let mut user = reg.login("alice", -1, true, "T1").await.unwrap().user;

        reg.change_room(&mut user, "lobby").await.unwrap();

        assert_eq!(user.room_name(), "lobby");
        assert_eq!(reg.get("alice").await.unwrap().room_name(), "lobby");
    }

    #[tokio::test]
    async fn test_change_room_after_logout_returns_not_logged_in() {
        let reg = registry();
        let mut user = reg.login("alice", -1, true, "T1").await.unwrap().user;
        reg.logout("alice").await.unwrap();

        let result = reg.change_room(&mut user, "lobby").await;

        assert!(matches!(result, Err(SessionError::NotLoggedIn(_))));
        assert_eq!(user.room_name(), "", "copy must not change on failure");
    }

    #[tokio::test]
    async fn test_change_room_stale_copy_does_not_touch_new_session() {
        let reg = registry();
        let mut stale = reg.login("alice", -1, true, "T1").await.unwrap().user;
        reg.logout("alice").await.unwrap();
        reg.login("alice", -1, true, "T2").await.unwrap();

        let result = reg.change_room(&mut stale, "lobby").await;

        assert!(matches!(result, Err(SessionError::NotLoggedIn(_))));
        assert_eq!(reg.get("alice").await.unwrap().room_name(), "");
    }

    #[tokio::test]
    async fn test_set_status_updates_registry_and_copy() {
        let reg = registry();
        let mut user = reg.login("alice", -1, true, "T1").await.unwrap().user;

        reg.set_status(&mut user, UserStatus::Idle).await.unwrap();

        assert_eq!(user.status(), UserStatus::Idle);
        assert_eq!(reg.get("alice").await.unwrap().status(), UserStatus::Idle);
    }

    #[tokio::test]
    async fn test_snapshot_does_not_follow_later_changes() {
        let reg = registry();
        let mut user = reg.login("alice", -1, true, "T1").await.unwrap().user;
        let snapshot = reg.get("alice").await.unwrap();

        reg.change_room(&mut user, "lobby").await.unwrap();

        assert_eq!(snapshot.room_name(), "", "snapshots are copies, not aliases");
    }

    // =====================================================================
    // kick() / diagnostics
    // =====================================================================

    #[tokio::test]
    async fn test_kick_removes_and_returns_session() {
        let reg = registry();
        reg.login("alice", -1, true, "T1").await.unwrap();

        let kicked = reg.kick("alice").await.unwrap();

        assert_eq!(kicked.name(), "alice");
        assert!(reg.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_kick_unknown_user_returns_not_logged_in() {
        let reg = registry();

        assert!(matches!(reg.kick("ghost").await, Err(SessionError::NotLoggedIn(_))));
        assert!(matches!(reg.kick("").await, Err(SessionError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_total_logins_never_decreases() {
        let reg = registry();
        reg.login("a", -1, true, "T").await.unwrap();
        reg.login("b", -1, true, "T").await.unwrap();
        reg.logout("a").await.unwrap();

        assert_eq!(reg.len().await.unwrap(), 1);
        assert_eq!(reg.total_logins().await.unwrap(), 2);
        assert_eq!(reg.names().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_shutdown_makes_registry_unavailable() {
        let reg = registry();
        reg.shutdown().await.unwrap();

        let result = reg.login("alice", -1, true, "T1").await;

        assert!(
            matches!(&result, Err(SessionError::Executor(e)) if e.is_unavailable()),
            "got {result:?}"
        );
    }
}
