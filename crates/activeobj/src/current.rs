//! Active object that runs on the thread that created it.
//!
//! Lets a program's main thread become an active object: other threads send
//! messages to it, and [`CurrentThread::start`] turns the calling thread into
//! the worker until [`CurrentThread::stop`] is called.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

use log::debug;

use crate::active::ActiveObject;
use crate::dispatch::Sealed;
use crate::error::{Error, Result};
use crate::lifecycle::Lifecycle;
use crate::scheduler::{Backlog, Scheduler};

/// An active object bound to the thread that constructed it.
///
/// It is running from construction, so blocking sends from other threads are
/// accepted right away and complete once the owner enters
/// [`start`](Self::start). Result-returning sends issued on the owning thread
/// itself, before or during `start`, run inline.
pub struct CurrentThread {
    scheduler: Scheduler,
    entered: AtomicBool,
}

impl CurrentThread {
    /// Binds a new active object to the calling thread.
    pub fn new() -> Self {
        let scheduler = Scheduler::new(
            format!("current-thread {:?}", thread::current().id()),
            Lifecycle::Running,
        );
        scheduler.bind_worker(thread::current().id());
        Self {
            scheduler,
            entered: AtomicBool::new(false),
        }
    }

    /// Runs the scheduling loop on the calling thread until stopped.
    ///
    /// Blocks until [`stop`](Self::stop) is called from another thread or
    /// from a message, then runs the messages left in the ready queue. If
    /// `stop` was already called, only that drain happens.
    pub fn start(&self) -> Result<()> {
        if !self.scheduler.is_worker_thread() {
            return Err(Error::ForeignThread);
        }
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadyStarted);
        }

        debug!("{}: entering run loop", self.scheduler.label());
        self.scheduler.run();
        debug!("{}: left run loop", self.scheduler.label());
        Ok(())
    }

    /// Stops accepting messages and makes [`start`](Self::start) return.
    ///
    /// There is no separate thread to join.
    pub fn stop(&self) -> Result<()> {
        self.scheduler.request_stop();
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        self.scheduler.lifecycle()
    }

    /// Returns `true` until the run loop has been stopped.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Returns `true` until a stop has been requested.
    pub fn is_accepting_messages(&self) -> bool {
        self.scheduler.is_accepting()
    }

    /// Identity of the owning thread.
    pub fn thread_id(&self) -> ThreadId {
        // Bound in `new`, never unset.
        self.scheduler
            .worker_id()
            .unwrap_or_else(|| thread::current().id())
    }

    /// Number of messages currently waiting in each queue.
    pub fn backlog(&self) -> Backlog {
        self.scheduler.backlog()
    }
}

impl Default for CurrentThread {
    fn default() -> Self {
        Self::new()
    }
}

impl Sealed for CurrentThread {
    fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl Drop for CurrentThread {
    fn drop(&mut self) {
        self.scheduler.request_stop();
    }
}

impl PartialEq for CurrentThread {
    fn eq(&self, other: &Self) -> bool {
        self.thread_id() == other.thread_id()
    }
}

impl PartialEq<ThreadId> for CurrentThread {
    fn eq(&self, other: &ThreadId) -> bool {
        self.thread_id() == *other
    }
}

impl PartialEq<CurrentThread> for ThreadId {
    fn eq(&self, other: &CurrentThread) -> bool {
        other == self
    }
}

impl PartialEq<ActiveObject> for CurrentThread {
    fn eq(&self, other: &ActiveObject) -> bool {
        other == self
    }
}

impl fmt::Debug for CurrentThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentThread")
            .field("state", &self.state())
            .field("thread_id", &self.thread_id())
            .finish()
    }
}
