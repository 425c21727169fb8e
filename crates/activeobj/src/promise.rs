//! One-shot result channel used by result-returning sends.
//!
//! The [`Sender`] half is moved into the message at construction and written
//! exactly once by whichever thread invokes it. The [`Receiver`] half goes back
//! to the caller. Dropping an unfulfilled sender (a task that never ran, or one
//! that panicked) closes the channel, and the receiver reports
//! [`Error::BrokenPromise`].

use core::fmt;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, TryRecvError};

use crate::error::{Error, Result};

/// Creates a connected promise/receiver pair.
pub(crate) fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = bounded(1);
    (Sender { tx }, Receiver { rx })
}

/// Write half of a one-shot result channel.
pub(crate) struct Sender<T> {
    tx: crossbeam_channel::Sender<T>,
}

impl<T> Sender<T> {
    /// Publishes the value, consuming the sender.
    ///
    /// A receiver that was already dropped simply never observes it.
    pub(crate) fn fulfil(self, value: T) {
        let _ = self.tx.send(value);
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

/// Read half of a one-shot result channel.
pub struct Receiver<T> {
    rx: crossbeam_channel::Receiver<T>,
}

impl<T> Receiver<T> {
    /// Blocks until the value is published.
    pub fn wait(self) -> Result<T> {
        self.rx.recv().map_err(|_| Error::BrokenPromise)
    }

    /// Blocks for at most `timeout`; `Ok(None)` means the value is not ready yet.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(Some(value)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::BrokenPromise),
        }
    }

    /// Takes the value if it has already been published.
    pub fn try_take(&self) -> Result<Option<T>> {
        match self.rx.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::BrokenPromise),
        }
    }

    /// Returns `true` once a value is waiting to be taken.
    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("ready", &self.is_ready())
            .finish()
    }
}
