//! Function values: user closures and host builtins.

use crate::{Cont, Driver, Env, ErrCont, EvalError, Step, Value};
use ast::NodeRef;
use async_runtime::Promise;
use std::fmt;
use std::rc::Rc;

/// A closure: parameters, body statements and the captured environment.
pub struct UserFunction {
    /// Declared name, if any
    pub name: Option<String>,
    /// Parameter names
    pub params: Vec<String>,
    /// Body statements; the last one's value is the result
    pub body: Rc<[NodeRef]>,
    /// Captured environment
    pub env: Env,
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Raw builtin: unevaluated arguments, calling environment, continuations.
pub type DeferredFn = Rc<dyn Fn(&Driver, &[NodeRef], &Env, Cont, ErrCont) -> Step>;

/// Auto-forcing builtin: top-level forced arguments in, result out.
pub type ForcingFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// Asynchronous builtin: forced arguments in, pending result out.
pub type AsyncFn = Rc<dyn Fn(&[Value]) -> Promise<Value, EvalError>>;

/// The calling convention of a builtin.
#[derive(Clone)]
pub enum BuiltinKind {
    /// Controls evaluation of its own arguments
    Deferred(DeferredFn),
    /// Receives evaluated and forced arguments
    Forcing(ForcingFn),
    /// Like `Forcing`, but settles later through the event loop
    Async(AsyncFn),
}

impl BuiltinKind {
    /// Convention name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinKind::Deferred(_) => "deferred",
            BuiltinKind::Forcing(_) => "forcing",
            BuiltinKind::Async(_) => "async",
        }
    }
}

/// A host function.
pub struct BuiltinFunction {
    /// Name the function is registered under
    pub name: String,
    /// Calling convention
    pub kind: BuiltinKind,
}

impl BuiltinFunction {
    /// A deferred builtin value.
    pub fn deferred(
        name: impl Into<String>,
        f: impl Fn(&Driver, &[NodeRef], &Env, Cont, ErrCont) -> Step + 'static,
    ) -> Value {
        Self::value(name, BuiltinKind::Deferred(Rc::new(f)))
    }

    /// An auto-forcing builtin value.
    pub fn forcing(
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Value {
        Self::value(name, BuiltinKind::Forcing(Rc::new(f)))
    }

    /// An asynchronous builtin value.
    pub fn asynchronous(
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Promise<Value, EvalError> + 'static,
    ) -> Value {
        Self::value(name, BuiltinKind::Async(Rc::new(f)))
    }

    fn value(name: impl Into<String>, kind: BuiltinKind) -> Value {
        Value::Builtin(Rc::new(BuiltinFunction {
            name: name.into(),
            kind,
        }))
    }
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFunction({}, {})", self.name, self.kind.name())
    }
}
