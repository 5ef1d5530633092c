//! Base environment factory and host capability injection.

use async_runtime::Promise;
use core_types::{BuiltinFunction, Env, EvalError, Value};
use tracing::debug;

use crate::deferred::lazy_builtin;
use crate::range::range_builtin;
use crate::table::table_builtin;

/// Names every base environment binds.
pub const BASE_BINDINGS: [&str; 5] = ["nil", "undefined", "range", "lazy", "table"];

/// Functions supplied by the embedding application.
///
/// # Example
///
/// ```
/// use async_runtime::Promise;
/// use builtins::{new_base_environment, HostCapabilities};
/// use core_types::Value;
///
/// let host = HostCapabilities::new()
///     .with_async("fetch", |_args| Promise::resolved(Value::string("body")));
/// let env = new_base_environment(host);
/// assert!(env.is_bound("fetch"));
/// assert!(env.is_bound("range"));
/// ```
#[derive(Default)]
pub struct HostCapabilities {
    bindings: Vec<(String, Value)>,
}

impl HostCapabilities {
    /// No host functions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asynchronous builtin.
    pub fn with_async(
        mut self,
        name: &str,
        f: impl Fn(&[Value]) -> Promise<Value, EvalError> + 'static,
    ) -> Self {
        self.bindings
            .push((name.to_string(), BuiltinFunction::asynchronous(name, f)));
        self
    }

    /// Register an auto-forcing builtin.
    pub fn with_forcing(
        mut self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.bindings
            .push((name.to_string(), BuiltinFunction::forcing(name, f)));
        self
    }

    /// Bind a plain value.
    pub fn with_value(mut self, name: &str, value: Value) -> Self {
        self.bindings.push((name.to_string(), value));
        self
    }

    /// Names of the registered capabilities, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl std::fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("names", &self.names())
            .finish()
    }
}

/// A fresh root scope holding the base bindings plus `host`'s capabilities.
///
/// Host bindings are installed last and may shadow a base binding.
pub fn new_base_environment(host: HostCapabilities) -> Env {
    let env = Env::root();
    env.declare("nil", Value::Nil);
    env.declare("undefined", Value::Undefined);
    env.declare("range", BuiltinFunction::forcing("range", range_builtin));
    env.declare("lazy", BuiltinFunction::deferred("lazy", lazy_builtin));
    env.declare("table", BuiltinFunction::deferred("table", table_builtin));

    debug!(host = ?host.names(), "base environment created");
    for (name, value) in host.bindings {
        env.declare(name, value);
    }
    env
}
