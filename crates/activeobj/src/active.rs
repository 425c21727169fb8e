//! Active object owning a dedicated worker thread.
//!
//! Messages sent from any thread are executed one at a time on the worker, in
//! the order defined by the scheduler. The object owns the worker for its whole
//! life: dropping it stops the loop, drains the ready queue and joins.

use core::fmt;
use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::config::ActiveObjectConfig;
use crate::current::CurrentThread;
use crate::dispatch::Sealed;
use crate::error::{Error, Result};
use crate::lifecycle::Lifecycle;
use crate::scheduler::{Backlog, Scheduler};

/// An active object backed by its own OS thread.
///
/// Share it between threads with [`Arc`]; all operations take `&self`.
///
/// ```
/// use activeobj::{ActiveObject, Dispatch};
///
/// let worker = ActiveObject::new();
/// worker.start()?;
/// let answer = worker.send_sync(|| 6 * 7)?;
/// assert_eq!(answer, 42);
/// worker.stop()?;
/// worker.join()?;
/// # Ok::<(), activeobj::Error>(())
/// ```
pub struct ActiveObject {
    scheduler: Arc<Scheduler>,
    config: ActiveObjectConfig,
    // Serialises `start` against `stop` so a failed spawn rolls back cleanly.
    control: Mutex<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ActiveObject {
    /// Creates an unstarted active object with default configuration.
    pub fn new() -> Self {
        Self::with_config(ActiveObjectConfig::default())
    }

    /// Creates an unstarted active object with the given configuration.
    pub fn with_config(config: ActiveObjectConfig) -> Self {
        Self {
            scheduler: Arc::new(Scheduler::new(config.label(), Lifecycle::Created)),
            config,
            control: Mutex::new(()),
            worker: Mutex::new(None),
        }
    }

    /// Returns the configuration the worker is spawned with.
    pub fn config(&self) -> &ActiveObjectConfig {
        &self.config
    }

    /// Spawns the worker thread and starts processing messages.
    ///
    /// Messages sent before `start()` are kept and run once the worker is up.
    pub fn start(&self) -> Result<()> {
        // Reject early so a task on the worker never touches the handle slot.
        if self.scheduler.lifecycle() != Lifecycle::Created {
            return Err(Error::AlreadyStarted);
        }

        let _control = self.control.lock();
        let mut slot = self.worker.lock();
        self.scheduler
            .transition(Lifecycle::Created, Lifecycle::Running)
            .map_err(|_| Error::AlreadyStarted)?;

        let mut builder = thread::Builder::new();
        if let Some(name) = &self.config.name {
            builder = builder.name(name.clone());
        }
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        let scheduler = Arc::clone(&self.scheduler);
        let handle = match builder.spawn(move || run_worker(&scheduler)) {
            Ok(handle) => handle,
            Err(err) => {
                self.scheduler.abort_start();
                return Err(Error::Spawn(err));
            }
        };

        self.scheduler.bind_worker(handle.thread().id());
        *slot = Some(handle);
        Ok(())
    }

    /// Stops accepting messages and tells the worker to leave its loop.
    ///
    /// Messages already in the ready queue still run; delayed messages that
    /// are not yet due are dropped. Use [`join`](Self::join) to wait for the
    /// worker to finish.
    pub fn stop(&self) -> Result<()> {
        if self.scheduler.lifecycle() == Lifecycle::Created {
            return Err(Error::NotStarted);
        }
        let _control = self.control.lock();
        if self.scheduler.lifecycle() == Lifecycle::Created {
            // A concurrent start failed to spawn and rolled back.
            return Err(Error::NotStarted);
        }
        self.scheduler.request_stop();
        Ok(())
    }

    /// Blocks until the worker thread has exited.
    ///
    /// Safe to call repeatedly; returns immediately if the worker was never
    /// started or has already been joined. Reports
    /// [`Error::WorkerPanicked`] if a task panicked on the worker.
    pub fn join(&self) -> Result<()> {
        if self.scheduler.is_worker_thread() {
            warn!(
                "{}: join requested from its own worker, ignoring",
                self.scheduler.label()
            );
            return Ok(());
        }

        let mut slot = self.worker.lock();
        match slot.take() {
            Some(handle) => handle
                .join()
                .map_err(|payload| Error::WorkerPanicked(panic_message(payload.as_ref()))),
            None => Ok(()),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        self.scheduler.lifecycle()
    }

    /// Returns `true` while the run loop is processing messages.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Returns `true` until a stop has been requested.
    pub fn is_accepting_messages(&self) -> bool {
        self.scheduler.is_accepting()
    }

    /// Identity of the worker thread, once started.
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.scheduler.worker_id()
    }

    /// Number of messages currently waiting in each queue.
    pub fn backlog(&self) -> Backlog {
        self.scheduler.backlog()
    }
}

impl Default for ActiveObject {
    fn default() -> Self {
        Self::new()
    }
}

impl Sealed for ActiveObject {
    fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl Drop for ActiveObject {
    fn drop(&mut self) {
        self.scheduler.shutdown();
        if let Err(err) = self.join() {
            warn!("{}: {}", self.scheduler.label(), err);
        }
    }
}

impl PartialEq for ActiveObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.scheduler, &other.scheduler)
            || matches!(
                (self.thread_id(), other.thread_id()),
                (Some(a), Some(b)) if a == b
            )
    }
}

impl PartialEq<ThreadId> for ActiveObject {
    fn eq(&self, other: &ThreadId) -> bool {
        self.thread_id() == Some(*other)
    }
}

impl PartialEq<ActiveObject> for ThreadId {
    fn eq(&self, other: &ActiveObject) -> bool {
        other == self
    }
}

impl PartialEq<CurrentThread> for ActiveObject {
    fn eq(&self, other: &CurrentThread) -> bool {
        self == &other.thread_id()
    }
}

impl fmt::Debug for ActiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveObject")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("thread_id", &self.thread_id())
            .finish()
    }
}

fn run_worker(scheduler: &Scheduler) {
    scheduler.bind_worker(thread::current().id());
    debug!("{}: worker started", scheduler.label());
    scheduler.run();
    debug!("{}: worker exited", scheduler.label());
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}
