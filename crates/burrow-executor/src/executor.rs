//! The executor handle and its worker task.
//!
//! The worker is an isolated Tokio task that owns the state value and a
//! queue receiver. Handles send it boxed closures through a bounded mpsc
//! channel; each closure carries a `oneshot::Sender` that delivers the
//! result straight back to the caller that submitted it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;

use crate::ExecutorError;

/// Default queue capacity for a new executor.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// A type-erased action, already bound to its reply channel.
type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// What the worker pulls off its queue.
enum Command<S> {
    /// Run one action against the state.
    Run(Job<S>),
    /// Stop after the current action; everything queued behind this is dropped.
    Shutdown,
}

/// Settings for a new executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Diagnostic name used in logs and errors (e.g. `"users"`).
    pub name: String,

    /// How many actions may wait in the queue before [`ActionExecutor::enqueue`]
    /// starts failing with [`ExecutorError::QueueFull`]. Values below 1 are
    /// raised to 1.
    pub queue_capacity: usize,
}

impl ExecutorConfig {
    /// A config with the given name and the default capacity.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Overrides the queue capacity.
    pub fn with_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: "executor".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Handle to a running executor that owns a state value of type `S`.
///
/// Cheap to clone: every clone feeds the same queue, so all actions from
/// all clones share one total order. The worker stops when
/// [`shutdown`](Self::shutdown) is called or the last handle is dropped.
pub struct ActionExecutor<S> {
    name: Arc<str>,
    sender: mpsc::Sender<Command<S>>,
}

// Manual impl: `S` lives in the worker, so handles are clonable for any `S`.
impl<S> Clone for ActionExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            sender: self.sender.clone(),
        }
    }
}

impl<S> std::fmt::Debug for ActionExecutor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("name", &self.name)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<S: Send + 'static> ActionExecutor<S> {
    /// Moves `state` into a new worker task and returns a handle to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(state: S, config: ExecutorConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let name: Arc<str> = Arc::from(config.name);

        let worker = Worker {
            name: Arc::clone(&name),
            state,
            receiver: rx,
        };
        tokio::spawn(worker.run());

        Self { name, sender: tx }
    }

    /// Returns the executor's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once the worker has stopped taking actions.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Accepts `action` into the queue and returns a receipt for its result.
    ///
    /// Acceptance order is execution order: an action enqueued before
    /// another (from any handle) runs before it. This never waits; a full
    /// queue or a stopped worker is reported immediately.
    pub fn enqueue<R, F>(&self, action: F) -> Result<Pending<R>, ExecutorError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let name = Arc::clone(&self.name);

        let job: Job<S> = Box::new(move |state: &mut S| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| action(state)))
                .map_err(panic_message);
            if let Err(message) = &outcome {
                tracing::warn!(executor = %name, %message, "action panicked");
            }
            // The caller may have given up waiting; that's fine.
            let _ = reply_tx.send(outcome);
        });

        self.sender
            .try_send(Command::Run(job))
            .map_err(|e| match e {
                TrySendError::Full(_) => {
                    tracing::debug!(executor = %self.name, "queue full, rejecting action");
                    ExecutorError::QueueFull {
                        executor: self.name.to_string(),
                    }
                }
                TrySendError::Closed(_) => ExecutorError::Closed {
                    executor: self.name.to_string(),
                },
            })?;

        Ok(Pending {
            executor: Arc::clone(&self.name),
            reply: reply_rx,
        })
    }

    /// Runs `action` on the worker and waits for its result.
    pub async fn submit<R, F>(&self, action: F) -> Result<R, ExecutorError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.enqueue(action)?.wait().await
    }

    /// Like [`submit`](Self::submit), but blocks the current OS thread.
    ///
    /// For callers that live outside the async runtime. Panics if called
    /// from within an async context, including from inside an action.
    pub fn submit_blocking<R, F>(&self, action: F) -> Result<R, ExecutorError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.enqueue(action)?.wait_blocking()
    }

    /// Asks the worker to stop once the action it is running completes.
    ///
    /// Waits for queue space to deliver the request. Actions queued behind
    /// it are discarded and their callers receive [`ExecutorError::Closed`].
    pub async fn shutdown(&self) -> Result<(), ExecutorError> {
        self.sender
            .send(Command::Shutdown)
            .await
            .map_err(|_| ExecutorError::Closed {
                executor: self.name.to_string(),
            })
    }
}

/// Receipt for an accepted action. Resolve it with [`wait`](Self::wait)
/// or [`wait_blocking`](Self::wait_blocking).
///
/// Dropping a `Pending` does not cancel the action; it still runs, and
/// its result is discarded.
#[derive(Debug)]
#[must_use = "the action runs regardless, but its result is only observable through wait()"]
pub struct Pending<R> {
    executor: Arc<str>,
    reply: oneshot::Receiver<Result<R, String>>,
}

impl<R> Pending<R> {
    /// Waits for the action to run and returns what it produced.
    pub async fn wait(self) -> Result<R, ExecutorError> {
        let outcome = self.reply.await;
        resolve(&self.executor, outcome)
    }

    /// Blocks the current thread until the action has run.
    ///
    /// Panics if called from within an async context.
    pub fn wait_blocking(self) -> Result<R, ExecutorError> {
        let outcome = self.reply.blocking_recv();
        resolve(&self.executor, outcome)
    }
}

fn resolve<R>(
    executor: &str,
    outcome: Result<Result<R, String>, oneshot::error::RecvError>,
) -> Result<R, ExecutorError> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(ExecutorError::ActionPanicked {
            executor: executor.to_string(),
            message,
        }),
        // Reply sender dropped without a value: the job was discarded
        // because the worker stopped first.
        Err(_) => Err(ExecutorError::Closed {
            executor: executor.to_string(),
        }),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// The worker side: sole owner of the state.
struct Worker<S> {
    name: Arc<str>,
    state: S,
    receiver: mpsc::Receiver<Command<S>>,
}

impl<S> Worker<S> {
    /// Pulls one command at a time and runs it to completion before
    /// pulling the next.
    async fn run(mut self) {
        tracing::info!(executor = %self.name, "executor started");
        let mut executed: u64 = 0;

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                Command::Run(job) => {
                    job(&mut self.state);
                    executed += 1;
                }
                Command::Shutdown => {
                    tracing::info!(executor = %self.name, "executor shutting down");
                    break;
                }
            }
        }

        // Dropping the receiver discards whatever is still queued; those
        // callers see `Closed`.
        tracing::info!(executor = %self.name, executed, "executor stopped");
    }
}
