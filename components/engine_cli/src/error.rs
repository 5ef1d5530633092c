//! Error types for the CLI

use core_types::EvalError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// The engine refused the program
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// File I/O error
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// Program text is not a valid JSON AST, or an event failed to serialize
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The evaluation finished with an `error` event
    #[error("{0}")]
    Failed(String),

    /// REPL error
    #[error("REPL error: {0}")]
    Repl(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
