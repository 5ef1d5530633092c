//! Core value types for the lazy expression engine.
//!
//! This crate provides the foundation every other engine crate builds on:
//! the lifted value model, memoized lazies, the environment chain, the error
//! taxonomy and the trampoline that keeps continuation-passing evaluation off
//! the native stack.
//!
//! # Overview
//!
//! - [`Value`] - Closed union over every runtime value
//! - [`Lazy`] - Deferred computation with single-flight forcing
//! - [`Env`] - Scope chain for variable lookup and assignment
//! - [`EvalError`] - Errors delivered to error-continuations
//! - [`Trampoline`] / [`Driver`] / [`Step`] - Stack-safe continuation driving
//! - [`with_stack_for_depth`] - Stack headroom for dropping and walking long sequences
//!
//! # Examples
//!
//! ```
//! use core_types::{cont, err_cont, Lazy, Step, Trampoline, Value};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let answer = Lazy::new(|driver, k, _ek| driver.bounce(&k, Value::Number(42.0)));
//!
//! let seen = Rc::new(RefCell::new(None));
//! let s = seen.clone();
//! let trampoline = Trampoline::default();
//! let driver = trampoline.driver();
//! let step = answer.force(
//!     &driver,
//!     cont(move |_, v| {
//!         *s.borrow_mut() = Some(v);
//!         Step::done()
//!     }),
//!     err_cont(|_, _| Step::done()),
//! );
//! driver.run(step).unwrap();
//! assert_eq!(*seen.borrow(), Some(Value::Number(42.0)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod environment;
mod error;
mod function;
mod lazy;
mod stack;
mod trampoline;
mod value;

pub use environment::Env;
pub use error::{ErrorKind, EvalError};
pub use function::{AsyncFn, BuiltinFunction, BuiltinKind, DeferredFn, ForcingFn, UserFunction};
pub use lazy::{Lazy, Producer};
pub use stack::{ensure_sufficient_stack, with_stack_for_depth};
pub use trampoline::{cont, err_cont, Cont, Driver, ErrCont, Step, Trampoline};
pub use value::{format_number, ArrayRef, Cons, ObjectRef, Table, Value};
