//! Error types for the executor.

/// Errors returned when submitting or awaiting an action.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The queue is at capacity. Submission fails fast instead of waiting
    /// for space.
    #[error("executor {executor} is unavailable: queue full")]
    QueueFull {
        /// Name of the saturated executor.
        executor: String,
    },

    /// The worker has stopped (shut down, or every handle was dropped).
    /// Actions still queued when it stopped are discarded with this error.
    #[error("executor {executor} is unavailable: shut down")]
    Closed {
        /// Name of the stopped executor.
        executor: String,
    },

    /// The action panicked. The worker caught the panic and kept running.
    #[error("action on executor {executor} panicked: {message}")]
    ActionPanicked {
        /// Name of the executor that ran the action.
        executor: String,
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl ExecutorError {
    /// Returns `true` if the executor could not take or finish the action
    /// (full queue or stopped worker), as opposed to the action failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::QueueFull { .. } | Self::Closed { .. })
    }
}
