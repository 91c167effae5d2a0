//! User types: the record the server keeps for one logged-in client.
//!
//! A `User` tracks:
//! - WHO the client is (name, account id, guest flag)
//! - WHERE they are (current room)
//! - WHAT they are doing (status)
//! - HOW to reach them (the transport handle)

use std::fmt;

/// The account id stored for users with no backing account. Guests always
/// carry this value.
pub const NO_DATABASE_ID: i64 = -1;

// ---------------------------------------------------------------------------
// TransportHandle
// ---------------------------------------------------------------------------

/// Bounds for the handle that reaches a user's connection.
///
/// The session layer never looks inside it: it is stored at login, copied
/// into snapshots, and handed to rooms on join. Anything clonable and
/// shareable across tasks qualifies (an mpsc sender, a connection id, ...).
pub trait TransportHandle: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> TransportHandle for T {}

// ---------------------------------------------------------------------------
// UserStatus
// ---------------------------------------------------------------------------

/// What the user is currently doing.
///
/// The registry stores the value; which transitions make sense is up to
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserStatus {
    /// Online and free.
    #[default]
    Available,
    /// Playing a game.
    InGame,
    /// Online but inactive.
    Idle,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::InGame => write!(f, "InGame"),
            Self::Idle => write!(f, "Idle"),
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A snapshot of one user's session.
///
/// Every registry read returns an owned copy. Changing the copy does not
/// change the registry; fields are private so the only way to move a user
/// between rooms or change their status is through a named operation on
/// [`UserRegistry`](crate::UserRegistry) or
/// [`UserService`](crate::UserService), which then refreshes this copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User<T> {
    name: String,
    database_id: i64,
    is_guest: bool,
    room: String,
    status: UserStatus,
    transport: T,
    /// Which login created this session (1 for the first login the
    /// registry ever saw). A later login under the same name gets a new
    /// serial, so stale copies can be told apart from the live session.
    serial: u64,
}

impl<T> User<T> {
    pub(crate) fn new(
        name: String,
        database_id: i64,
        is_guest: bool,
        transport: T,
        serial: u64,
    ) -> Self {
        Self {
            name,
            database_id,
            is_guest,
            room: String::new(),
            status: UserStatus::Available,
            transport,
            serial,
        }
    }

    /// The user's unique, case-sensitive name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The account id in the external store, or [`NO_DATABASE_ID`].
    pub fn database_id(&self) -> i64 {
        self.database_id
    }

    pub fn is_guest(&self) -> bool {
        self.is_guest
    }

    /// Name of the current room; empty when the user is in no room.
    pub fn room_name(&self) -> &str {
        &self.room
    }

    /// Returns `true` if the user is in a room.
    pub fn is_in_room(&self) -> bool {
        !self.room.is_empty()
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    /// The handle to this user's connection.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The login serial that created this session.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn set_room(&mut self, room: &str) {
        room.clone_into(&mut self.room);
    }

    pub(crate) fn set_status(&mut self, status: UserStatus) {
        self.status = status;
    }
}
