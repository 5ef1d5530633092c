//! Developer CLI for the lazy expression engine
//!
//! Reads programs as JSON ASTs, evaluates them in one persistent base
//! environment and prints the orchestrator's events as JSON lines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod repl;
pub mod runtime;

pub use cli::{init_tracing, Cli};
pub use error::{CliError, CliResult};
pub use runtime::Runtime;
