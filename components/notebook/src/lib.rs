//! Evaluation orchestrator for notebook cells
//!
//! An [`Evaluation`] takes one pre-parsed program, a scope and a result slot,
//! and reports progress to an [`EvaluationObserver`]:
//!
//! - `update` each time a lazy in the result settles while others remain
//! - `done` once the wire snapshot holds no stubs
//! - `error` on the first failure; nothing follows it
//!
//! # Example
//!
//! ```
//! use ast::parse_program;
//! use builtins::{new_base_environment, HostCapabilities};
//! use core_types::Trampoline;
//! use notebook::{Evaluation, RecordingObserver};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let program = parse_program(
//!     r#"{"type":"FunctionCall","name":{"type":"Variable","name":"range"},
//!         "arguments":[{"type":"Literal","value":0},{"type":"Literal","value":2}]}"#,
//! )
//! .unwrap();
//! let env = new_base_environment(HostCapabilities::new());
//! let observer = RecordingObserver::new();
//! let evaluation = Evaluation::new("out", env, Trampoline::default(), Rc::new(observer.clone()));
//! evaluation.run(&program).unwrap();
//!
//! let last = observer.last().unwrap();
//! assert!(last.is_terminal());
//! assert_eq!(
//!     last.snapshot(),
//!     Some(&json!({"!": "cons", "head": 0, "tail": {"!": "cons", "head": 1, "tail": null}}))
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod evaluation;
pub mod event;

pub use evaluation::{Evaluation, Phase};
pub use event::{EvaluationEvent, EvaluationObserver, RecordingObserver};
