//! Scheduling core shared by [`ActiveObject`](crate::ActiveObject) and
//! [`CurrentThread`](crate::CurrentThread).
//!
//! Synchronisation is two-tier. The lifecycle, the `accepting` flag and the
//! worker identity are lock-free so that admission and same-thread checks never
//! contend with the run loop. Both queues sit behind one mutex observed by one
//! condition variable, notified on every enqueue and on stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};
use crate::lifecycle::{AtomicLifecycle, Lifecycle};
use crate::message::{BoxedMessage, Message, PromisedTask};
use crate::promise::{self, Receiver};
use crate::queue::Queues;

/// Deadline offset used when `now + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Snapshot of the number of messages waiting in each queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backlog {
    pub ready: usize,
    pub delayed: usize,
}

pub struct Scheduler {
    label: String,
    lifecycle: AtomicLifecycle,
    accepting: AtomicBool,
    worker: OnceCell<ThreadId>,
    queues: Mutex<Queues>,
    wake: Condvar,
}

impl Scheduler {
    pub(crate) fn new(label: String, initial: Lifecycle) -> Self {
        Self {
            label,
            lifecycle: AtomicLifecycle::new(initial),
            accepting: AtomicBool::new(true),
            worker: OnceCell::new(),
            queues: Mutex::new(Queues::new()),
            wake: Condvar::new(),
        }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.load()
    }

    pub(crate) fn transition(&self, from: Lifecycle, to: Lifecycle) -> Result<(), Lifecycle> {
        self.lifecycle.transition(from, to)
    }

    pub(crate) fn set_lifecycle(&self, state: Lifecycle) {
        self.lifecycle.store(state);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.lifecycle() == Lifecycle::Running
    }

    pub(crate) fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Records the worker identity. The first binding wins.
    pub(crate) fn bind_worker(&self, id: ThreadId) {
        let _ = self.worker.set(id);
    }

    pub(crate) fn worker_id(&self) -> Option<ThreadId> {
        self.worker.get().copied()
    }

    pub(crate) fn is_worker_thread(&self) -> bool {
        self.worker
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }

    pub(crate) fn backlog(&self) -> Backlog {
        let queues = self.queues.lock();
        Backlog {
            ready: queues.ready_len(),
            delayed: queues.delayed_len(),
        }
    }

    fn admit(&self) -> Result<()> {
        if self.is_accepting() {
            Ok(())
        } else {
            Err(Error::NotAcceptingMessages)
        }
    }

    /// Appends a message to the ready tail.
    pub(crate) fn post(&self, message: BoxedMessage) -> Result<()> {
        self.admit()?;
        let mut queues = self.queues.lock();
        // A stop may have landed between the fast check and the lock.
        self.admit()?;
        queues.push_ready(message);
        trace!("{}: queued message, {} ready", self.label, queues.ready_len());
        self.wake.notify_one();
        Ok(())
    }

    /// Parks a message until `timeout` has elapsed.
    pub(crate) fn post_delayed(&self, message: BoxedMessage, timeout: Duration) -> Result<()> {
        self.admit()?;
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let mut queues = self.queues.lock();
        self.admit()?;
        queues.push_delayed(deadline, message);
        trace!(
            "{}: delayed message by {:?}, {} delayed",
            self.label,
            timeout,
            queues.delayed_len()
        );
        self.wake.notify_one();
        Ok(())
    }

    /// Queues a result-returning message, or runs it inline on the worker.
    ///
    /// The worker cannot wait on its own queue, so a result-returning send
    /// issued from the worker thread executes before this call returns.
    pub(crate) fn post_promised<F, T>(&self, callable: F) -> Result<Receiver<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.admit()?;
        let (promise, receiver) = promise::channel();
        let message = Box::new(PromisedTask::new(callable, promise));
        if self.is_worker_thread() {
            trace!("{}: running result message inline on worker", self.label);
            message.invoke();
        } else {
            self.post(message)?;
        }
        Ok(receiver)
    }

    /// Sends a result-returning message and blocks until its value arrives.
    pub(crate) fn block_on<F, T>(&self, callable: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.admit()?;
        if !self.is_running() {
            return Err(Error::NotStarted);
        }
        self.post_promised(callable)?.wait()
    }

    /// Undoes `Created → Running` when the worker thread failed to spawn.
    ///
    /// Ends in `Stopped` with the queues emptied if a stop already landed,
    /// since no worker will ever run them.
    pub(crate) fn abort_start(&self) {
        if self.is_accepting()
            && self
                .lifecycle
                .transition(Lifecycle::Running, Lifecycle::Created)
                .is_ok()
        {
            return;
        }
        self.accepting.store(false, Ordering::SeqCst);
        self.set_lifecycle(Lifecycle::Stopped);
        let dropped = self.queues.lock().take_all();
        debug!(
            "{}: start aborted after stop, dropped {} messages",
            self.label,
            dropped.len()
        );
    }

    /// Stops admission, leaves `Running` and wakes the worker.
    pub(crate) fn request_stop(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        if self
            .lifecycle
            .transition(Lifecycle::Running, Lifecycle::Stopping)
            .is_ok()
        {
            debug!("{}: stop requested", self.label);
        }
        // Notify under the lock: the worker re-checks the lifecycle while
        // holding it, so the wakeup cannot fall between check and wait.
        let _queues = self.queues.lock();
        self.wake.notify_one();
    }

    /// Runs the scheduling loop on the current thread until stopped, then
    /// drains the ready queue.
    pub(crate) fn run(&self) {
        let _guard = PanicGuard { scheduler: self };

        while self.is_running() {
            let next = {
                let mut queues = self.queues.lock();
                if queues.is_idle() && self.is_running() {
                    self.wake.wait(&mut queues);
                }

                let promoted = queues.promote_due(Instant::now());
                if promoted > 0 {
                    trace!("{}: promoted {} delayed messages", self.label, promoted);
                } else if queues.ready_len() == 0 && self.is_running() {
                    if let Some(deadline) = queues.next_deadline() {
                        self.wake.wait_until(&mut queues, deadline);
                    }
                }

                queues.pop_ready()
            };

            if let Some(message) = next {
                message.invoke();
            }
        }

        self.drain();
    }

    /// Runs every message left in the ready queue and abandons delayed ones.
    fn drain(&self) {
        let mut leftovers = 0usize;
        let abandoned = loop {
            let next = {
                let mut queues = self.queues.lock();
                match queues.pop_ready() {
                    Some(message) => message,
                    None => break queues.take_delayed(),
                }
            };
            next.invoke();
            leftovers += 1;
        };
        let abandoned_count = abandoned.len();
        // Destructors of abandoned messages may drop the last owner.
        drop(abandoned);
        self.set_lifecycle(Lifecycle::Stopped);
        debug!(
            "{}: drained {} leftover messages, abandoned {} delayed",
            self.label, leftovers, abandoned_count
        );
    }

    /// Final shutdown used by destructors: no more messages, loop exits.
    pub(crate) fn shutdown(&self) {
        if self
            .lifecycle
            .transition(Lifecycle::Created, Lifecycle::Stopped)
            .is_ok()
        {
            self.accepting.store(false, Ordering::SeqCst);
            let dropped = self.queues.lock().take_all();
            if !dropped.is_empty() {
                debug!(
                    "{}: dropped {} messages, never started",
                    self.label,
                    dropped.len()
                );
            }
            return;
        }
        self.request_stop();
    }
}

/// Tears the scheduler down when a task panics on the worker.
///
/// Queued messages are dropped so that their promises break and blocked
/// callers observe [`Error::BrokenPromise`] instead of waiting forever.
struct PanicGuard<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if !thread::panicking() {
            return;
        }
        let scheduler = self.scheduler;
        scheduler.accepting.store(false, Ordering::SeqCst);
        scheduler.set_lifecycle(Lifecycle::Stopped);
        let discarded = scheduler.queues.lock().take_all();
        warn!(
            "{}: task panicked on worker, discarded {} pending messages",
            scheduler.label,
            discarded.len()
        );
    }
}
