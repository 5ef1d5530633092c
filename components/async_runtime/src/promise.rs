//! Settle-once promise used at the asynchronous builtin boundary.
//!
//! A `Promise` is a shared handle: the host keeps one clone to settle it when
//! its operation completes, the evaluator keeps another to register the
//! reaction that resumes evaluation.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with an error.
    Rejected,
}

/// A reaction to be triggered when a Promise settles.
///
/// This represents a handler registered via [`Promise::then`].
pub struct PromiseReaction<T, E> {
    callback: Box<dyn FnOnce(Result<T, E>)>,
}

impl<T, E> PromiseReaction<T, E> {
    fn run(self, outcome: Result<T, E>) {
        (self.callback)(outcome)
    }
}

impl<T, E> std::fmt::Debug for PromiseReaction<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PromiseReaction {{ ... }}")
    }
}

enum Settlement<T, E> {
    Pending(Vec<PromiseReaction<T, E>>),
    Fulfilled(T),
    Rejected(E),
}

/// A pending result produced by an asynchronous operation.
///
/// # Examples
///
/// ```
/// use async_runtime::{Promise, PromiseState};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let promise: Promise<i32, String> = Promise::new();
/// let seen = Rc::new(Cell::new(0));
/// let s = seen.clone();
/// promise.then(move |outcome| s.set(outcome.unwrap()));
///
/// assert_eq!(promise.state(), PromiseState::Pending);
/// promise.resolve(42);
/// assert_eq!(promise.state(), PromiseState::Fulfilled);
/// assert_eq!(seen.get(), 42);
/// ```
pub struct Promise<T, E> {
    inner: Rc<RefCell<Settlement<T, E>>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, E> std::fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state())
            .finish()
    }
}

impl<T, E> Promise<T, E> {
    /// Returns the current state.
    pub fn state(&self) -> PromiseState {
        match &*self.inner.borrow() {
            Settlement::Pending(_) => PromiseState::Pending,
            Settlement::Fulfilled(_) => PromiseState::Fulfilled,
            Settlement::Rejected(_) => PromiseState::Rejected,
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Promise<T, E> {
    /// Creates a new pending Promise.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Settlement::Pending(Vec::new()))),
        }
    }

    /// Creates a Promise already fulfilled with `value`.
    pub fn resolved(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Settlement::Fulfilled(value))),
        }
    }

    /// Creates a Promise already rejected with `error`.
    pub fn rejected(error: E) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Settlement::Rejected(error))),
        }
    }

    /// Returns the outcome once settled.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        match &*self.inner.borrow() {
            Settlement::Pending(_) => None,
            Settlement::Fulfilled(value) => Some(Ok(value.clone())),
            Settlement::Rejected(error) => Some(Err(error.clone())),
        }
    }

    /// Resolves the Promise with a value.
    ///
    /// Returns `false` (and changes nothing) if the Promise was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Rejects the Promise with an error.
    ///
    /// Returns `false` (and changes nothing) if the Promise was already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Registers a handler for the outcome.
    ///
    /// The handler runs synchronously at settlement, or immediately if the
    /// Promise is already settled. Handlers run in registration order.
    pub fn then<F>(&self, handler: F)
    where
        F: FnOnce(Result<T, E>) + 'static,
    {
        let reaction = PromiseReaction {
            callback: Box::new(handler),
        };
        let settled = {
            let mut inner = self.inner.borrow_mut();
            match &mut *inner {
                Settlement::Pending(reactions) => {
                    reactions.push(reaction);
                    return;
                }
                Settlement::Fulfilled(value) => Ok(value.clone()),
                Settlement::Rejected(error) => Err(error.clone()),
            }
        };
        reaction.run(settled);
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let reactions = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(&*inner, Settlement::Pending(_)) {
                warn!("promise settled twice; second outcome ignored");
                return false;
            }
            let next = match &outcome {
                Ok(value) => Settlement::Fulfilled(value.clone()),
                Err(error) => Settlement::Rejected(error.clone()),
            };
            match std::mem::replace(&mut *inner, next) {
                Settlement::Pending(reactions) => reactions,
                _ => Vec::new(),
            }
        };
        // Reactions may register more reactions; the borrow is released first.
        for reaction in reactions {
            reaction.run(outcome.clone());
        }
        true
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Default for Promise<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
