//! Room membership for Burrow.
//!
//! Each room keeps its member list inside its own
//! [`ActionExecutor`](burrow_executor::ActionExecutor), independent of
//! the user registry's. The directory of rooms is a third executor.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates, finds and destroys rooms by name
//! - [`RoomHandle`]: add, remove and list the members of one room
//! - [`RoomConfig`]: room settings (member limit)
//!
//! Both handles implement the session layer's
//! [`Room`](burrow_session::Room) and
//! [`RoomDirectory`](burrow_session::RoomDirectory) traits, so they plug
//! straight into [`UserService`](burrow_session::UserService).

mod config;
mod error;
mod registry;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::RoomHandle;
