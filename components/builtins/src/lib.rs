//! Base environment for the lazy expression engine
//!
//! This crate provides the bindings every evaluation starts from:
//! - `nil` and `undefined`
//! - `range(from, to, step)`, an auto-forcing builtin returning a lazy sequence
//! - `lazy(expr)`, a deferred builtin wrapping its argument in a lazy
//! - `table(columns, rows)`, a deferred builtin building a table value
//!
//! Host applications add their own builtins through [`HostCapabilities`].
//!
//! # Example
//!
//! ```
//! use ast::builder::{call, num, var};
//! use builtins::{new_base_environment, HostCapabilities};
//! use core_types::Value;
//! use interpreter::VM;
//!
//! let vm = VM::new(new_base_environment(HostCapabilities::new()));
//! let result = vm
//!     .execute(&[call(var("range"), vec![num(1.0), num(0.0)])])
//!     .unwrap();
//! assert_eq!(result, Value::Nil);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod deferred;
pub mod environment;
pub mod range;
pub mod table;

// Re-export main types for convenience
pub use environment::{new_base_environment, HostCapabilities, BASE_BINDINGS};
pub use range::range;
