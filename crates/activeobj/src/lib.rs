//! # activeobj
//!
//! Active object threads: every message sent to an active object executes on
//! that object's own thread, one at a time, in a well-defined order. This lets
//! a component confine its state to one thread ("all access to X happens on
//! X's active object") without callers managing locks.
//!
//! ## Module Overview
//! - [`Receiver`]  – One-shot result handle returned by result sends.
//! - [`active`]    – [`ActiveObject`], owning a dedicated worker thread.
//! - [`current`]   – [`CurrentThread`], turning the calling thread into a worker.
//! - [`dispatch`]  – The [`Dispatch`] send family shared by both variants.
//! - [`lifecycle`] – `Created → Running → Stopping → Stopped`.
//! - [`config`]    – Worker thread configuration.
//!
//! ## Ordering
//! Ready messages run strictly in the order they were sent. Delayed messages
//! join the back of the ready queue once their deadline passes, in deadline
//! order. The only exception is a result-returning send issued on the worker
//! thread itself, which runs inline so the worker never waits on its own queue.
//!
//! ```
//! use std::time::Duration;
//! use activeobj::{ActiveObject, Dispatch};
//!
//! let ao = ActiveObject::new();
//! ao.start()?;
//! ao.send(|| println!("on the worker"))?;
//! ao.send_delayed(|| println!("a little later"), Duration::from_millis(5))?;
//! let len = ao.send_sync(|| "hello".len())?;
//! assert_eq!(len, 5);
//! ao.stop()?;
//! ao.join()?;
//! # Ok::<(), activeobj::Error>(())
//! ```

pub mod active;
pub mod config;
pub mod current;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
mod message;
mod promise;
mod queue;
mod scheduler;

pub use active::ActiveObject;
pub use config::{ActiveObjectConfig, ActiveObjectConfigBuilder};
pub use current::CurrentThread;
pub use dispatch::Dispatch;
pub use error::{Error, Result};
pub use lifecycle::Lifecycle;
pub use promise::Receiver;
pub use scheduler::Backlog;

#[cfg(test)]
mod tests;
