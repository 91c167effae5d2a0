//! Serialized action execution for Burrow.
//!
//! An [`ActionExecutor`] owns a piece of shared state and a single worker
//! task. Callers hand it closures ("actions"); the worker runs them one at
//! a time, in the order they were accepted, and sends each result back to
//! the caller that submitted it.
//!
//! ```text
//! caller A ──┐
//! caller B ──┼──→ [ queue ] ──→ worker ──→ action(&mut state) ──→ reply
//! caller C ──┘
//! ```
//!
//! Nothing else can reach the state, so the actions never need a lock and
//! every read sees the state between two complete actions.
//!
//! # Rules for actions
//!
//! - Keep them short: a map lookup or insert, not network or disk I/O.
//!   Stage slow work outside the action and funnel only the mutation in.
//! - Never wait on the same executor from inside an action. The worker is
//!   busy running you, so the reply would never come.

mod error;
mod executor;

pub use error::ExecutorError;
pub use executor::{ActionExecutor, DEFAULT_QUEUE_CAPACITY, ExecutorConfig, Pending};
