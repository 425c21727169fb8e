//! The send family shared by both active object variants.

use std::time::Duration;

use crate::error::Result;
use crate::message::Task;
use crate::promise::Receiver;
use crate::scheduler::Scheduler;

mod sealed {
    pub trait Sealed {
        fn scheduler(&self) -> &crate::scheduler::Scheduler;
    }
}

pub(crate) use sealed::Sealed;

/// Message dispatch onto an active object's thread.
///
/// Every send fails with [`Error::NotAcceptingMessages`](crate::Error) once
/// the object has been asked to stop.
pub trait Dispatch: Sealed {
    /// Queues `callable` behind everything already queued. Never blocks.
    fn send<F, R>(&self, callable: F) -> Result<()>
    where
        F: FnOnce() -> R + Send + 'static,
    {
        self.scheduler().post(Box::new(Task::new(callable)))
    }

    /// Queues `callable` to run once `timeout` has elapsed. Never blocks.
    ///
    /// Delayed messages run in deadline order; messages sharing a deadline run
    /// in the order they were sent. A delayed message still pending at
    /// shutdown is dropped without running.
    fn send_delayed<F, R>(&self, callable: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() -> R + Send + 'static,
    {
        self.scheduler()
            .post_delayed(Box::new(Task::new(callable)), timeout)
    }

    /// Queues `callable` and returns a receiver for its result.
    ///
    /// Called from the object's own worker thread, `callable` runs inline
    /// before this returns, ahead of anything already queued.
    fn send_async<F, T>(&self, callable: F) -> Result<Receiver<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.scheduler().post_promised(callable)
    }

    /// Runs `callable` on the object's thread and blocks for its result.
    ///
    /// Fails with [`Error::NotStarted`](crate::Error) if the object is not
    /// running yet, since nothing would ever answer.
    fn send_sync<F, T>(&self, callable: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.scheduler().block_on(callable)
    }

    /// Runs `callable` on the object's thread and blocks until it completes.
    fn send_wait<F>(&self, callable: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send_sync(callable)
    }

    /// Returns `true` when called from the object's worker thread.
    fn is_worker_thread(&self) -> bool {
        self.scheduler().is_worker_thread()
    }
}

impl<D: Sealed + ?Sized> Dispatch for D {}

impl<D: Sealed + ?Sized> Sealed for std::sync::Arc<D> {
    fn scheduler(&self) -> &Scheduler {
        (**self).scheduler()
    }
}
