//! Named-method dispatch.
//!
//! Each receiver variant has a fixed method table; anything else falls back
//! to reading the property and invoking whatever value is found there.

use ast::NodeRef;
use core_types::{cont, Cont, Driver, Env, ErrCont, EvalError, Lazy, Step, Value};
use std::rc::Rc;
use tracing::trace;

use crate::call_frame::invoke;
use crate::dispatch::{evaluate_forced, force};
use crate::sequence::{self, Callback};

/// Methods answered by arrays, tables and sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMethod {
    /// `map(f)`
    Map,
    /// `where(p)`
    Where,
    /// `concat()`
    Concat,
    /// `take(n)`
    Take,
    /// `toArray()`
    ToArray,
}

impl SequenceMethod {
    /// Look up a method by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "map" => Some(SequenceMethod::Map),
            "where" => Some(SequenceMethod::Where),
            "concat" => Some(SequenceMethod::Concat),
            "take" => Some(SequenceMethod::Take),
            "toArray" => Some(SequenceMethod::ToArray),
            _ => None,
        }
    }
}

fn answers_sequence_methods(receiver: &Value) -> bool {
    matches!(
        receiver,
        Value::Nil | Value::Cons(_) | Value::Array(_) | Value::Table(_)
    )
}

/// Call `receiver.name(args...)`.
///
/// A lazy receiver that has not settled yields a new lazy that forwards the
/// call once the receiver is forced.
pub fn invoke_method(
    driver: &Driver,
    receiver: Value,
    name: String,
    args: Rc<[NodeRef]>,
    env: Env,
    k: Cont,
    ek: ErrCont,
) -> Step {
    if let Value::Lazy(lazy) = &receiver {
        return match lazy.outcome() {
            Some(Ok(value)) => invoke_method(driver, value, name, args, env, k, ek),
            Some(Err(error)) => driver.fail(&ek, error),
            None => {
                trace!(method = %name, "deferring method call on unsettled lazy");
                let lazy = lazy.clone();
                let forwarded = Lazy::new(move |d, k2, ek2| {
                    let ek3 = ek2.clone();
                    lazy.force(
                        d,
                        cont(move |d, value| {
                            invoke_method(
                                d,
                                value,
                                name.clone(),
                                args.clone(),
                                env.clone(),
                                k2.clone(),
                                ek3.clone(),
                            )
                        }),
                        ek2,
                    )
                });
                driver.bounce(&k, Value::Lazy(forwarded))
            }
        };
    }

    if answers_sequence_methods(&receiver) {
        if let Some(method) = SequenceMethod::from_name(&name) {
            return sequence_method(driver, receiver, method, &args, &env, k, ek);
        }
    }

    // Fallback: property lookup, then invocation of what was found.
    let found = match receiver.get_property(&Value::string(name.as_str())) {
        Ok(found) => found,
        Err(error) => return driver.fail(&ek, error),
    };
    let ek2 = ek.clone();
    force(
        driver,
        found,
        cont(move |d, method| {
            if method.is_function() {
                invoke(d, method, args.clone(), &env, k.clone(), ek2.clone())
            } else {
                d.fail(
                    &ek2,
                    EvalError::type_error(format!(
                        "`{}.{}` is not a function",
                        receiver.type_name(),
                        name
                    )),
                )
            }
        }),
        ek,
    )
}

fn sequence_method(
    driver: &Driver,
    receiver: Value,
    method: SequenceMethod,
    args: &[NodeRef],
    env: &Env,
    k: Cont,
    ek: ErrCont,
) -> Step {
    match method {
        SequenceMethod::Map | SequenceMethod::Where => {
            let callback = match Callback::from_arguments(args, env) {
                Ok(callback) => callback,
                Err(error) => return driver.fail(&ek, error),
            };
            let result = if method == SequenceMethod::Map {
                sequence::map(receiver, callback)
            } else {
                sequence::filter(receiver, callback)
            };
            driver.bounce(&k, result)
        }
        SequenceMethod::Concat => driver.bounce(&k, sequence::concat(receiver)),
        SequenceMethod::ToArray => sequence::to_array(driver, receiver, k, ek),
        SequenceMethod::Take => {
            let count = match args {
                [count] => count.clone(),
                _ => {
                    return driver.fail(
                        &ek,
                        EvalError::type_error(format!(
                            "take expects 1 argument, got {}",
                            args.len()
                        )),
                    )
                }
            };
            let ek2 = ek.clone();
            evaluate_forced(
                driver,
                &count,
                env,
                cont(move |d, count| match count.to_number() {
                    Ok(n) if n >= 0.0 => d.bounce(&k, sequence::take(receiver.clone(), n as usize)),
                    Ok(_) => d.fail(&ek2, EvalError::type_error("take expects a non-negative count")),
                    Err(error) => d.fail(&ek2, error),
                }),
                ek,
            )
        }
    }
}
