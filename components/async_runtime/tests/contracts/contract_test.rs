//! Contract tests for async_runtime component
//!
//! These tests pin the surface the interpreter's asynchronous builtin bridge
//! relies on.

use async_runtime::{EventLoop, MicroTask, Promise, PromiseState, Task};
use std::cell::RefCell;
use std::rc::Rc;

mod event_loop_contract {
    use super::*;

    #[test]
    fn event_loop_handles_share_queues() {
        let event_loop = EventLoop::new();
        let other = event_loop.clone();
        other.enqueue_microtask(MicroTask::new(|| {}));
        assert!(!event_loop.is_microtask_queue_empty());
        assert_eq!(event_loop.run_until_done(), 1);
    }

    #[test]
    fn run_until_done_reports_executed_count() {
        let event_loop = EventLoop::new();
        event_loop.enqueue_task(Task::new(|| {}));
        event_loop.enqueue_microtask(MicroTask::new(|| {}));
        assert_eq!(event_loop.run_until_done(), 2);
    }
}

mod promise_contract {
    use super::*;

    #[test]
    fn settlement_from_a_task_reaches_reaction() {
        let event_loop = EventLoop::new();
        let promise: Promise<String, String> = Promise::new();
        let seen = Rc::new(RefCell::new(None));

        let s = seen.clone();
        promise.then(move |r| *s.borrow_mut() = Some(r));

        let host = promise.clone();
        event_loop.enqueue_task(Task::new(move || {
            host.resolve("payload".to_string());
        }));

        assert_eq!(promise.state(), PromiseState::Pending);
        event_loop.run_until_done();
        assert_eq!(*seen.borrow(), Some(Ok("payload".to_string())));
    }

    #[test]
    fn pre_settled_constructors() {
        let ok: Promise<i32, String> = Promise::resolved(1);
        let err: Promise<i32, String> = Promise::rejected("x".to_string());
        assert_eq!(ok.state(), PromiseState::Fulfilled);
        assert_eq!(err.state(), PromiseState::Rejected);
    }
}
