//! Evaluation errors.
//!
//! Every failure the engine can report travels through an error-continuation
//! as an [`EvalError`]. Only some kinds can be intercepted by `try`/`catch`.

use crate::Value;
use std::collections::HashMap;
use thiserror::Error;

/// The kind of an evaluation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation unsupported on a value variant
    TypeError,
    /// Reference to a name bound nowhere in the scope chain
    UnboundVariable,
    /// Arbitrary value raised by `throw`
    UserThrown,
    /// Structured wire input that cannot be decoded
    MalformedWire,
    /// Broken engine invariant (trampoline misuse); never caught
    InternalIntegrityFault,
}

/// An error raised during evaluation.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, EvalError};
///
/// let error = EvalError::not_a("object", "number");
/// assert_eq!(error.kind(), ErrorKind::TypeError);
/// assert_eq!(error.to_string(), "TypeError: `object` is not a number");
/// assert!(error.is_catchable());
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Operation unsupported on a variant
    #[error("TypeError: {0}")]
    Type(String),
    /// Unbound variable
    #[error("ReferenceError: {0} is not defined")]
    UnboundVariable(String),
    /// Value raised by `throw`
    #[error("Uncaught {0}")]
    Thrown(Value),
    /// Undecodable wire input
    #[error("MalformedWire: {0}")]
    MalformedWire(String),
    /// Internal integrity fault
    #[error("InternalError: {0}")]
    Integrity(String),
}

impl EvalError {
    /// Create a TypeError
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::Type(message.into())
    }

    /// "`<type_name>` is not a <expected>"
    pub fn not_a(type_name: &str, expected: &str) -> Self {
        let article = match expected.chars().next() {
            Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
            _ => "a",
        };
        EvalError::Type(format!("`{}` is not {} {}", type_name, article, expected))
    }

    /// "`<type_name>` does not support <operation>"
    pub fn unsupported(type_name: &str, operation: &str) -> Self {
        EvalError::Type(format!("`{}` does not support {}", type_name, operation))
    }

    /// Create a MalformedWire error
    pub fn malformed(message: impl Into<String>) -> Self {
        EvalError::MalformedWire(message.into())
    }

    /// Create an internal integrity fault
    pub fn integrity(message: impl Into<String>) -> Self {
        EvalError::Integrity(message.into())
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Type(_) => ErrorKind::TypeError,
            EvalError::UnboundVariable(_) => ErrorKind::UnboundVariable,
            EvalError::Thrown(_) => ErrorKind::UserThrown,
            EvalError::MalformedWire(_) => ErrorKind::MalformedWire,
            EvalError::Integrity(_) => ErrorKind::InternalIntegrityFault,
        }
    }

    /// Whether `try`/`catch` may intercept this error.
    pub fn is_catchable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TypeError | ErrorKind::UnboundVariable | ErrorKind::UserThrown
        )
    }

    /// The value a `catch` clause binds.
    ///
    /// Thrown values come back unchanged; engine errors become
    /// `{name, message}` objects.
    pub fn into_value(self) -> Value {
        let (name, message) = match self {
            EvalError::Thrown(value) => return value,
            EvalError::Type(message) => ("TypeError", message),
            EvalError::UnboundVariable(name) => {
                ("ReferenceError", format!("{} is not defined", name))
            }
            EvalError::MalformedWire(message) => ("MalformedWire", message),
            EvalError::Integrity(message) => ("InternalError", message),
        };
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), Value::string(name));
        fields.insert("message".to_string(), Value::string(message));
        Value::object(fields)
    }
}
