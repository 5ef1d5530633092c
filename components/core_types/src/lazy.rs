//! Memoized deferred computations.
//!
//! A lazy moves through `Unforced -> Forcing -> Forced | Errored`. The
//! producer runs at most once; callers forcing while it runs are queued and
//! resumed in arrival order when it settles.

use crate::{cont, err_cont, Cont, Driver, ErrCont, EvalError, Step, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

/// Produces a lazy's value, reporting through the given continuations.
pub type Producer = Box<dyn FnOnce(&Driver, Cont, ErrCont) -> Step>;

struct Waiter {
    k: Cont,
    ek: ErrCont,
}

enum LazyState {
    Unforced(Producer),
    Forcing(Vec<Waiter>),
    Forced(Value),
    Errored(EvalError),
}

/// A shared handle to a deferred computation.
///
/// # Examples
///
/// ```
/// use core_types::{cont, err_cont, Lazy, Step, Trampoline, Value};
///
/// let lazy = Lazy::new(|driver, k, _ek| driver.bounce(&k, Value::Number(7.0)));
/// assert!(!lazy.is_settled());
///
/// let trampoline = Trampoline::default();
/// let driver = trampoline.driver();
/// let step = lazy.force(&driver, cont(|_, _| Step::done()), err_cont(|_, _| Step::done()));
/// driver.run(step).unwrap();
/// assert_eq!(lazy.outcome().unwrap().unwrap(), Value::Number(7.0));
/// ```
#[derive(Clone)]
pub struct Lazy {
    state: Rc<RefCell<LazyState>>,
}

impl Lazy {
    /// A lazy that runs `producer` when first forced.
    pub fn new(producer: impl FnOnce(&Driver, Cont, ErrCont) -> Step + 'static) -> Self {
        Lazy {
            state: Rc::new(RefCell::new(LazyState::Unforced(Box::new(producer)))),
        }
    }

    /// A lazy already settled with `value`.
    pub fn forced(value: Value) -> Self {
        Lazy {
            state: Rc::new(RefCell::new(LazyState::Forced(value))),
        }
    }

    /// A lazy already settled with `error`.
    pub fn errored(error: EvalError) -> Self {
        Lazy {
            state: Rc::new(RefCell::new(LazyState::Errored(error))),
        }
    }

    /// The settled outcome, if any.
    pub fn outcome(&self) -> Option<Result<Value, EvalError>> {
        match &*self.state.borrow() {
            LazyState::Forced(value) => Some(Ok(value.clone())),
            LazyState::Errored(error) => Some(Err(error.clone())),
            _ => None,
        }
    }

    /// Returns true once forced or errored.
    pub fn is_settled(&self) -> bool {
        matches!(
            &*self.state.borrow(),
            LazyState::Forced(_) | LazyState::Errored(_)
        )
    }

    /// Returns true while the producer is running.
    pub fn is_forcing(&self) -> bool {
        matches!(&*self.state.borrow(), LazyState::Forcing(_))
    }

    /// Number of callers queued on a running producer.
    pub fn waiting(&self) -> usize {
        match &*self.state.borrow() {
            LazyState::Forcing(waiters) => waiters.len(),
            _ => 0,
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Lazy) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Force this lazy, delivering its outcome to `k` or `ek`.
    pub fn force(&self, driver: &Driver, k: Cont, ek: ErrCont) -> Step {
        let producer = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                LazyState::Forced(value) => return driver.bounce(&k, value.clone()),
                LazyState::Errored(error) => return driver.fail(&ek, error.clone()),
                LazyState::Forcing(waiters) => {
                    waiters.push(Waiter { k, ek });
                    trace!(waiting = waiters.len(), "lazy already forcing; caller queued");
                    return Step::done();
                }
                LazyState::Unforced(_) => {
                    match std::mem::replace(&mut *state, LazyState::Forcing(vec![Waiter { k, ek }])) {
                        LazyState::Unforced(producer) => producer,
                        _ => return Step::done(),
                    }
                }
            }
        };

        trace!(token = driver.token(), "lazy forcing");
        let this = self.clone();
        let on_value = cont(move |d, value| this.accept(d, value));
        let this = self.clone();
        let on_error = err_cont(move |d, error| this.settle(d, Err(error)));
        driver.defer(move |d| producer(d, on_value, on_error))
    }

    /// Settle with `value`, chaining through it first if it is itself lazy.
    fn accept(&self, driver: &Driver, value: Value) -> Step {
        match value {
            Value::Lazy(inner) if inner.ptr_eq(self) => self.settle(
                driver,
                Err(EvalError::type_error("lazy value depends on itself")),
            ),
            Value::Lazy(inner) => {
                let this = self.clone();
                let on_value = cont(move |d, v| this.accept(d, v));
                let this = self.clone();
                let on_error = err_cont(move |d, e| this.settle(d, Err(e)));
                inner.force(driver, on_value, on_error)
            }
            value => self.settle(driver, Ok(value)),
        }
    }

    fn settle(&self, driver: &Driver, outcome: Result<Value, EvalError>) -> Step {
        let waiters = {
            let mut state = self.state.borrow_mut();
            if !matches!(&*state, LazyState::Forcing(_)) {
                warn!("lazy settled after it was already settled; outcome ignored");
                return Step::done();
            }
            let settled = match &outcome {
                Ok(value) => LazyState::Forced(value.clone()),
                Err(error) => LazyState::Errored(error.clone()),
            };
            match std::mem::replace(&mut *state, settled) {
                LazyState::Forcing(waiters) => waiters,
                _ => Vec::new(),
            }
        };
        trace!(
            token = driver.token(),
            waiters = waiters.len(),
            ok = outcome.is_ok(),
            "lazy settled"
        );

        let mut resumes = waiters.into_iter().map(|w| match &outcome {
            Ok(value) => driver.bounce(&w.k, value.clone()),
            Err(error) => driver.fail(&w.ek, error.clone()),
        });
        let first = resumes.next().unwrap_or_else(Step::done);
        for step in resumes {
            driver.schedule(step);
        }
        first
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            LazyState::Unforced(_) => write!(f, "Lazy(unforced)"),
            LazyState::Forcing(waiters) => write!(f, "Lazy(forcing, {} waiting)", waiters.len()),
            LazyState::Forced(value) => write!(f, "Lazy(forced {:?})", value),
            LazyState::Errored(error) => write!(f, "Lazy(errored {})", error),
        }
    }
}
