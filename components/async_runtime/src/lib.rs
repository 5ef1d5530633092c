//! Async runtime for the lazy expression engine.
//!
//! This crate provides the pieces the host uses at the one asynchronous
//! boundary of evaluation:
//! - Event loop with task and microtask queues
//! - A settle-once promise that asynchronous builtins return
//!
//! # Overview
//!
//! - [`EventLoop`] - Shared handle coordinating task execution
//! - [`Promise`] - Pending result with reactions run at settlement
//!
//! The runtime is single-threaded: callbacks may hold `Rc` state and nothing
//! here needs `Send`.
//!
//! # Examples
//!
//! ## Event Loop Usage
//!
//! ```
//! use async_runtime::{EventLoop, Task};
//!
//! let event_loop = EventLoop::new();
//! event_loop.enqueue_task(Task::new(|| {}));
//! event_loop.run_until_done();
//! ```
//!
//! ## Promise Usage
//!
//! ```
//! use async_runtime::{Promise, PromiseState};
//!
//! let promise: Promise<i32, String> = Promise::new();
//! promise.resolve(42);
//! assert_eq!(promise.state(), PromiseState::Fulfilled);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod event_loop;
pub mod promise;
pub mod task_queue;

// Re-export main types at crate root
pub use event_loop::EventLoop;
pub use promise::{Promise, PromiseReaction, PromiseState};
pub use task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
