//! Work items executed by the run loop.
//!
//! A message is a boxed callable behind the object-safe [`Message`] trait. The
//! queues only ever see `Box<dyn Message>`; results travel back to the sender
//! through a one-shot promise channel owned by the message.

use crate::promise::Sender;

/// A unit of deferred work.
pub(crate) trait Message: Send + 'static {
    /// Runs the wrapped callable exactly once on the current thread.
    ///
    /// A panic raised by the callable propagates out of this call.
    fn invoke(self: Box<Self>);
}

pub(crate) type BoxedMessage = Box<dyn Message>;

/// Fire-and-forget message: the callable's result is discarded.
pub(crate) struct Task<F> {
    callable: F,
}

impl<F, T> Task<F>
where
    F: FnOnce() -> T + Send + 'static,
{
    pub(crate) fn new(callable: F) -> Self {
        Self { callable }
    }
}

impl<F, T> Message for Task<F>
where
    F: FnOnce() -> T + Send + 'static,
{
    fn invoke(self: Box<Self>) {
        let _ = (self.callable)();
    }
}

/// Message that publishes the callable's return value to its promise.
///
/// `()`-returning callables publish `()` once they complete, which is what
/// blocking waiters observe as the completion signal.
pub(crate) struct PromisedTask<F, T> {
    callable: F,
    promise: Sender<T>,
}

impl<F, T> PromisedTask<F, T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(callable: F, promise: Sender<T>) -> Self {
        Self { callable, promise }
    }
}

impl<F, T> Message for PromisedTask<F, T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    fn invoke(self: Box<Self>) {
        let Self { callable, promise } = *self;
        promise.fulfil(callable());
    }
}
