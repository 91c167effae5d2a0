//! User session management for Burrow.
//!
//! This crate tracks who is logged in and which room each user occupies:
//!
//! 1. **Registry** ([`UserRegistry`]): the authoritative name → user map.
//!    Every read and write is an action on one [`ActionExecutor`], so two
//!    logins under the same name can never both succeed.
//! 2. **Workflows** ([`UserService`]): join, leave, log out and kick.
//!    These talk to the room layer *outside* the executor and funnel only
//!    the registry update through it.
//! 3. **Room seam** ([`Room`], [`RoomDirectory`]): the two traits the
//!    room layer implements so this crate can add and remove members.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)     ← implements Room / RoomDirectory
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Executor (below)       ← serializes registry actions
//! ```
//!
//! [`ActionExecutor`]: burrow_executor::ActionExecutor

mod error;
mod registry;
mod room;
mod service;
mod user;

pub use error::SessionError;
pub use registry::{LoginOutcome, RegistryConfig, UserRegistry};
pub use room::{Room, RoomDirectory};
pub use service::UserService;
pub use user::{NO_DATABASE_ID, TransportHandle, User, UserStatus};
