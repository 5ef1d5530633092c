//! `lazy(expr)`: wrap an expression in a producer run only on demand.

use ast::NodeRef;
use core_types::{Cont, Driver, Env, ErrCont, EvalError, Lazy, Step, Value};
use interpreter::evaluate;

/// The deferred entry point bound as `lazy`.
///
/// The argument expression is captured with the calling environment and not
/// evaluated until the returned lazy is forced.
pub fn lazy_builtin(driver: &Driver, args: &[NodeRef], env: &Env, k: Cont, ek: ErrCont) -> Step {
    let expr = match args {
        [expr] => expr.clone(),
        _ => {
            return driver.fail(
                &ek,
                EvalError::type_error(format!("lazy expects 1 argument, got {}", args.len())),
            )
        }
    };
    let env = env.clone();
    let deferred = Lazy::new(move |d, k, ek| evaluate(d, &expr, &env, k, ek));
    driver.bounce(&k, Value::Lazy(deferred))
}
