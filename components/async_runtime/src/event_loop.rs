//! Event loop implementation.
//!
//! This module provides the event loop that coordinates task and microtask
//! execution for the host embedding the evaluator.

use crate::task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Default)]
struct Queues {
    tasks: TaskQueue,
    microtasks: MicrotaskQueue,
}

/// The host event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Takes the oldest task from the task queue and executes it
/// 2. Drains all microtasks in the microtask queue
/// 3. Repeats
///
/// `EventLoop` is a cheap handle; clones share the same queues, so a task may
/// enqueue further work on the loop that is running it.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
///
/// let event_loop = EventLoop::new();
/// event_loop.enqueue_task(Task::new(|| {}));
/// assert_eq!(event_loop.run_until_done(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventLoop {
    queues: Rc<RefCell<Queues>>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the event loop until all tasks and microtasks are processed.
    ///
    /// Work enqueued while running is processed too.
    ///
    /// # Returns
    ///
    /// The number of tasks and microtasks executed.
    pub fn run_until_done(&self) -> usize {
        let mut executed = 0;
        while !self.is_idle() {
            executed += self.process_one_cycle();
        }
        trace!(executed, "event loop idle");
        executed
    }

    /// Adds a task to the task queue.
    ///
    /// The task will be executed in the next available iteration of the event loop.
    pub fn enqueue_task(&self, task: Task) {
        self.queues.borrow_mut().tasks.enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    ///
    /// The microtask will be executed after the current task completes.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.queues.borrow_mut().microtasks.enqueue(microtask);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.queues.borrow().tasks.is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.queues.borrow().microtasks.is_empty()
    }

    /// Returns true if there is nothing left to run.
    pub fn is_idle(&self) -> bool {
        let queues = self.queues.borrow();
        queues.tasks.is_empty() && queues.microtasks.is_empty()
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// This drains the microtask queue completely. New microtasks added during
    /// execution will also be processed before this method returns.
    pub fn run_all_microtasks(&self) -> usize {
        let mut executed = 0;
        loop {
            // The borrow must end before the microtask runs: it may enqueue more.
            let next = self.queues.borrow_mut().microtasks.dequeue();
            match next {
                Some(microtask) => {
                    microtask.run();
                    executed += 1;
                }
                None => return executed,
            }
        }
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    ///
    /// This represents one iteration of the event loop.
    pub fn process_one_cycle(&self) -> usize {
        let mut executed = 0;
        let next = self.queues.borrow_mut().tasks.dequeue();
        if let Some(task) = next {
            task.run();
            executed += 1;
        }
        executed + self.run_all_microtasks()
    }
}
