//! Lifecycle state machine of an active object.
//!
//! ```text
//! Created --start()--> Running --stop()--> Stopping --drain--> Stopped
//! ```
//!
//! The state lives in an atomic so that admission checks and the run loop can
//! read it without taking the queue lock.

use core::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Observable lifecycle state of an active object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Constructed, worker not yet spawned.
    Created,
    /// Run loop is (or is about to be) processing messages.
    Running,
    /// Stop requested; the worker is leaving its loop and draining.
    Stopping,
    /// Worker has drained its ready queue and exited.
    Stopped,
}

impl Lifecycle {
    const fn to_raw(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Running => 1,
            Self::Stopping => 2,
            Self::Stopped => 3,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Atomic cell holding a [`Lifecycle`].
pub(crate) struct AtomicLifecycle(AtomicU8);

impl AtomicLifecycle {
    pub(crate) const fn new(state: Lifecycle) -> Self {
        Self(AtomicU8::new(state.to_raw()))
    }

    pub(crate) fn load(&self) -> Lifecycle {
        Lifecycle::from_raw(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: Lifecycle) {
        self.0.store(state.to_raw(), Ordering::Release);
    }

    /// Moves from `current` to `new`, returning the observed state on failure.
    pub(crate) fn transition(&self, current: Lifecycle, new: Lifecycle) -> Result<(), Lifecycle> {
        self.0
            .compare_exchange(
                current.to_raw(),
                new.to_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(Lifecycle::from_raw)
    }
}

impl fmt::Debug for AtomicLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.load(), f)
    }
}
