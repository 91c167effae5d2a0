//! # Burrow
//!
//! Concurrent session management for multiplayer servers.
//!
//! Burrow keeps track of who is logged in and which room each user is in.
//! All registry state lives inside an [`ActionExecutor`], so concurrent
//! logins, room changes and kicks are applied one at a time without locks.
//! The transport layer owns the connections and hands Burrow an opaque,
//! cloneable handle per user.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use burrow::prelude::*;
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> Result<(), BurrowError> {
//! let server = BurrowServer::<mpsc::UnboundedSender<String>>::builder()
//!     .server_name("lobby-1")
//!     .kick_duplicate_on_login(true)
//!     .room("lobby", RoomConfig::default())
//!     .start()
//!     .await?;
//!
//! let (tx, _rx) = mpsc::unbounded_channel();
//! let mut alice = server.users().login("alice", NO_DATABASE_ID, true, tx).await?;
//! let lobby = server.rooms().get("lobby").await?;
//! server.users().join(&mut alice, &lobby).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`ActionExecutor`]: burrow_executor::ActionExecutor

mod error;
mod server;
mod settings;
mod telemetry;

pub use error::BurrowError;
pub use server::{BurrowServer, BurrowServerBuilder};
pub use settings::{RoomSpec, ServerSettings, SettingsError, SettingsGate};
pub use telemetry::init_tracing;

pub mod prelude {
    //! Everything needed to run a server and drive sessions.

    pub use crate::{
        BurrowError, BurrowServer, BurrowServerBuilder, RoomSpec, ServerSettings, SettingsError,
        SettingsGate, init_tracing,
    };
    pub use burrow_executor::{ActionExecutor, ExecutorConfig, ExecutorError};
    pub use burrow_room::{RoomConfig, RoomError, RoomHandle, RoomRegistry};
    pub use burrow_session::{
        NO_DATABASE_ID, Room, RoomDirectory, SessionError, TransportHandle, User, UserRegistry,
        UserService, UserStatus,
    };
}
