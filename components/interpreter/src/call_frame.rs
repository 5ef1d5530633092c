//! Function invocation.
//!
//! [`invoke`] calls a function with argument expressions, honouring each
//! builtin's calling convention. [`apply`] calls it with values that are
//! already evaluated, as sequence callbacks do.

use ast::NodeRef;
use core_types::{
    cont, BuiltinFunction, BuiltinKind, Cont, Driver, Env, ErrCont, EvalError, Step,
    UserFunction, Value,
};
use std::rc::Rc;
use tracing::trace;

use crate::dispatch::{evaluate_body, evaluate_list, force_all, values_cont};
use crate::promise_integration::await_promise;

/// Invoke a forced callee with unevaluated arguments.
pub fn invoke(
    driver: &Driver,
    callee: Value,
    args: Rc<[NodeRef]>,
    env: &Env,
    k: Cont,
    ek: ErrCont,
) -> Step {
    match callee {
        Value::UserFunction(function) => {
            let ek2 = ek.clone();
            evaluate_list(
                driver,
                args,
                env,
                false,
                values_cont(move |d, values| enter(d, &function, values, k.clone(), ek2.clone())),
                ek,
            )
        }
        Value::Builtin(builtin) => {
            if let BuiltinKind::Deferred(f) = &builtin.kind {
                return f(driver, &args[..], env, k, ek);
            }
            let ek2 = ek.clone();
            evaluate_list(
                driver,
                args,
                env,
                true,
                values_cont(move |d, values| call_builtin(d, &builtin, values, k.clone(), ek2.clone())),
                ek,
            )
        }
        other => driver.fail(&ek, EvalError::not_a(other.type_name(), "function")),
    }
}

/// Apply a callee to already-evaluated arguments.
pub fn apply(driver: &Driver, callee: Value, args: Vec<Value>, k: Cont, ek: ErrCont) -> Step {
    match callee {
        Value::Lazy(lazy) => {
            let args = Rc::new(args);
            let ek2 = ek.clone();
            lazy.force(
                driver,
                cont(move |d, callee| apply(d, callee, args.as_ref().clone(), k.clone(), ek2.clone())),
                ek,
            )
        }
        Value::UserFunction(function) => enter(driver, &function, args, k, ek),
        Value::Builtin(builtin) => {
            if let BuiltinKind::Deferred(_) = &builtin.kind {
                return driver.fail(
                    &ek,
                    EvalError::type_error(format!(
                        "`{}` cannot be applied to evaluated arguments",
                        builtin.name
                    )),
                );
            }
            let ek2 = ek.clone();
            force_all(
                driver,
                args,
                values_cont(move |d, values| call_builtin(d, &builtin, values, k.clone(), ek2.clone())),
                ek,
            )
        }
        other => driver.fail(&ek, EvalError::not_a(other.type_name(), "function")),
    }
}

/// Bind parameters in a child of the captured scope and run the body.
fn enter(driver: &Driver, function: &UserFunction, args: Vec<Value>, k: Cont, ek: ErrCont) -> Step {
    let scope = function.env.child();
    let mut args = args.into_iter();
    for param in &function.params {
        scope.declare(param.clone(), args.next().unwrap_or(Value::Undefined));
    }
    trace!(
        function = function.name.as_deref().unwrap_or("anonymous"),
        "enter"
    );
    evaluate_body(driver, function.body.clone(), &scope, k, ek)
}

/// Call an auto-forcing or asynchronous builtin with forced arguments.
fn call_builtin(
    driver: &Driver,
    builtin: &BuiltinFunction,
    args: Vec<Value>,
    k: Cont,
    ek: ErrCont,
) -> Step {
    match &builtin.kind {
        BuiltinKind::Forcing(f) => match f(&args) {
            Ok(value) => driver.bounce(&k, value),
            Err(error) => driver.fail(&ek, error),
        },
        BuiltinKind::Async(f) => await_promise(driver, &builtin.name, f(&args), k, ek),
        BuiltinKind::Deferred(_) => driver.fail(
            &ek,
            EvalError::type_error(format!("`{}` takes raw arguments", builtin.name)),
        ),
    }
}
