//! Error type shared by every active object operation.
//!
//! All variants describe contract violations reported synchronously to the
//! caller. A rejected call never mutates the active object.

use std::io;

use thiserror::Error;

/// Errors returned by active object lifecycle and dispatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// `start()` was called on an object that is no longer in the created state.
    #[error("active object already started")]
    AlreadyStarted,
    /// `stop()` or a blocking send was issued before `start()`.
    #[error("active object has not been started")]
    NotStarted,
    /// A send was issued after `stop()`; messages are rejected, not queued.
    #[error("active object is not accepting messages, it has been signalled to stop")]
    NotAcceptingMessages,
    /// The result channel was dropped before a value was published.
    #[error("result channel closed before a value was published")]
    BrokenPromise,
    /// The worker thread terminated because a dispatched task panicked.
    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),
    /// A current-thread object was started from a thread that does not own it.
    #[error("current-thread active object started from a foreign thread")]
    ForeignThread,
    /// The operating system refused to spawn the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
