//! Continuation-passing evaluator for the lazy expression language
//!
//! This crate provides:
//! - AST dispatch over trampolined continuations
//! - Function invocation and the three builtin calling conventions
//! - Named-method tables and lazy sequence operations
//! - The bridge from asynchronous builtins back onto the drive loop
//!
//! # Example
//!
//! ```
//! use ast::builder::{binary, num};
//! use ast::BinaryOperator;
//! use core_types::{Env, Value};
//! use interpreter::VM;
//!
//! let vm = VM::new(Env::root());
//! let program = vec![binary(BinaryOperator::Add, num(1.0), num(2.0))];
//! assert_eq!(vm.execute(&program).unwrap(), Value::Number(3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod dispatch;
pub mod lvalue;
pub mod methods;
pub mod promise_integration;
pub mod sequence;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::{apply, invoke};
pub use dispatch::{evaluate, evaluate_forced, force, get_member, program_lazy, ValuesCont};
pub use lvalue::LValue;
pub use methods::{invoke_method, SequenceMethod};
pub use promise_integration::await_promise;
pub use sequence::Callback;
pub use vm::VM;
