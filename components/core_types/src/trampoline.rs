//! Trampolined continuation driving.
//!
//! Engine operations never call their continuation directly. They return a
//! [`Step`] that a [`Driver`] unwraps in a loop, so native stack depth stays
//! constant however deep the interpreted recursion goes.
//!
//! Every step is stamped with the token of the driver that created it. A
//! driver refuses to run a step carrying another driver's token, and refuses
//! to be re-entered while it is running; both are integrity faults.

use crate::{EvalError, Value};
use async_runtime::EventLoop;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{error, trace};

/// Success continuation
pub type Cont = Rc<dyn Fn(&Driver, Value) -> Step>;

/// Error continuation
pub type ErrCont = Rc<dyn Fn(&Driver, EvalError) -> Step>;

/// Wrap a closure as a [`Cont`].
pub fn cont(f: impl Fn(&Driver, Value) -> Step + 'static) -> Cont {
    Rc::new(f)
}

/// Wrap a closure as an [`ErrCont`].
pub fn err_cont(f: impl Fn(&Driver, EvalError) -> Step + 'static) -> ErrCont {
    Rc::new(f)
}

struct Bounce {
    token: u64,
    thunk: Box<dyn FnOnce(&Driver) -> Step>,
}

/// One unit of pending work, or nothing.
///
/// A step is consumed by value, so it runs at most once.
#[must_use = "a step does nothing unless a driver runs it"]
pub struct Step {
    bounce: Option<Bounce>,
}

impl Step {
    /// The empty step: the current chain is finished or suspended.
    pub fn done() -> Self {
        Step { bounce: None }
    }

    /// Returns true for the empty step.
    pub fn is_done(&self) -> bool {
        self.bounce.is_none()
    }

    /// Token of the driver that created this step.
    pub fn token(&self) -> Option<u64> {
        self.bounce.as_ref().map(|b| b.token)
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.bounce {
            Some(b) => write!(f, "Step {{ token: {} }}", b.token),
            None => write!(f, "Step::done"),
        }
    }
}

struct TrampolineInner {
    next_token: Cell<u64>,
    event_loop: EventLoop,
}

/// Owner of the driver token counter and the host event loop.
///
/// Cheap to clone; clones share the counter.
#[derive(Clone)]
pub struct Trampoline {
    inner: Rc<TrampolineInner>,
}

impl Trampoline {
    /// Create a trampoline resuming asynchronous work on `event_loop`.
    pub fn new(event_loop: EventLoop) -> Self {
        Trampoline {
            inner: Rc::new(TrampolineInner {
                next_token: Cell::new(1),
                event_loop,
            }),
        }
    }

    /// The event loop asynchronous builtins resume on.
    pub fn event_loop(&self) -> &EventLoop {
        &self.inner.event_loop
    }

    /// Create a driver holding a fresh token.
    pub fn driver(&self) -> Driver {
        let token = self.inner.next_token.get();
        self.inner.next_token.set(token + 1);
        Driver {
            token,
            trampoline: self.clone(),
            queue: RefCell::new(VecDeque::new()),
            running: Cell::new(false),
        }
    }

    /// Run `start` to exhaustion on a fresh driver.
    ///
    /// An integrity fault aborts the drive and is handed to `on_fault` on
    /// another fresh driver.
    pub fn drive(&self, start: impl FnOnce(&Driver) -> Step, on_fault: &ErrCont) {
        let driver = self.driver();
        let step = start(&driver);
        if let Err(fault) = driver.run(step) {
            let recovery = self.driver();
            let step = on_fault(&recovery, fault);
            if let Err(fault) = recovery.run(step) {
                error!(token = recovery.token(), %fault, "fault handler faulted");
            }
        }
    }
}

impl Default for Trampoline {
    fn default() -> Self {
        Trampoline::new(EventLoop::new())
    }
}

/// A single drive loop.
pub struct Driver {
    token: u64,
    trampoline: Trampoline,
    queue: RefCell<VecDeque<Step>>,
    running: Cell<bool>,
}

impl Driver {
    /// This driver's token.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// The trampoline that created this driver.
    pub fn trampoline(&self) -> &Trampoline {
        &self.trampoline
    }

    /// Shorthand for `self.trampoline().event_loop()`.
    pub fn event_loop(&self) -> &EventLoop {
        self.trampoline.event_loop()
    }

    /// A step that passes `value` to `k`.
    pub fn bounce(&self, k: &Cont, value: Value) -> Step {
        let k = Rc::clone(k);
        self.defer(move |driver| k(driver, value))
    }

    /// A step that passes `error` to `ek`.
    pub fn fail(&self, ek: &ErrCont, error: EvalError) -> Step {
        let ek = Rc::clone(ek);
        self.defer(move |driver| ek(driver, error))
    }

    /// A step that runs `f`.
    pub fn defer(&self, f: impl FnOnce(&Driver) -> Step + 'static) -> Step {
        Step {
            bounce: Some(Bounce {
                token: self.token,
                thunk: Box::new(f),
            }),
        }
    }

    /// Queue `step` to run once the current chain is exhausted.
    pub fn schedule(&self, step: Step) {
        if !step.is_done() {
            self.queue.borrow_mut().push_back(step);
        }
    }

    /// Number of scheduled steps not yet started.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run `step`, then every scheduled step, until no work remains.
    ///
    /// Returns the number of steps executed.
    pub fn run(&self, step: Step) -> Result<u64, EvalError> {
        if self.running.replace(true) {
            error!(token = self.token, "driver re-entered while running");
            return Err(EvalError::integrity(format!(
                "driver {} re-entered while running",
                self.token
            )));
        }
        trace!(token = self.token, "drive start");

        let mut current = step;
        let mut executed: u64 = 0;
        loop {
            match current.bounce {
                Some(bounce) => {
                    if bounce.token != self.token {
                        self.queue.borrow_mut().clear();
                        self.running.set(false);
                        error!(
                            token = self.token,
                            foreign = bounce.token,
                            "step from another driver"
                        );
                        return Err(EvalError::integrity(format!(
                            "driver {} received a step from driver {}",
                            self.token, bounce.token
                        )));
                    }
                    current = (bounce.thunk)(self);
                    executed += 1;
                }
                None => {
                    let next = self.queue.borrow_mut().pop_front();
                    match next {
                        Some(step) => current = step,
                        None => break,
                    }
                }
            }
        }

        self.running.set(false);
        trace!(token = self.token, steps = executed, "drive finished");
        Ok(executed)
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("token", &self.token)
            .field("pending", &self.pending())
            .finish()
    }
}
