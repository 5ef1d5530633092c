//! Lazy sequence operations over `Cons`/`Nil`.
//!
//! `map`, `filter`, `concat` and `take` build a new lazy without forcing
//! anything; each cell is computed only when something forces it. Arrays and
//! tables convert eagerly into a full spine the first time they are consumed.

use ast::{Node, NodeRef};
use core_types::{cont, Cont, Driver, Env, ErrCont, EvalError, Lazy, Step, Value};
use std::cell::RefCell;
use std::rc::Rc;

use crate::call_frame::apply;
use crate::dispatch::{evaluate, force};

/// The per-element function of `map`, `where` and comprehensions.
#[derive(Clone)]
pub enum Callback {
    /// Expression with the element bound to `_`; a function result is
    /// applied to the element
    Implicit {
        /// Expression evaluated per element
        body: NodeRef,
        /// Defining scope
        env: Env,
    },
    /// Expression with the element bound to an explicit name
    Named {
        /// Element name
        name: String,
        /// Expression evaluated per element
        body: NodeRef,
        /// Defining scope
        env: Env,
    },
    /// A function value applied to the element
    Function(Value),
}

impl Callback {
    /// Expression callback binding `_`.
    pub fn implicit(body: NodeRef, env: &Env) -> Self {
        Callback::Implicit {
            body,
            env: env.clone(),
        }
    }

    /// Expression callback binding `name`.
    pub fn named(name: &str, body: NodeRef, env: &Env) -> Self {
        Callback::Named {
            name: name.to_string(),
            body,
            env: env.clone(),
        }
    }

    /// Parse method-call arguments: `(expr)` or `(name, expr)`.
    pub fn from_arguments(args: &[NodeRef], env: &Env) -> Result<Self, EvalError> {
        match args {
            [body] => Ok(Callback::implicit(body.clone(), env)),
            [param, body] => match &**param {
                Node::Variable { name } => Ok(Callback::named(name, body.clone(), env)),
                other => Err(EvalError::type_error(format!(
                    "callback parameter must be a name, found {}",
                    other.kind()
                ))),
            },
            _ => Err(EvalError::type_error(format!(
                "expected a callback of 1 or 2 arguments, got {}",
                args.len()
            ))),
        }
    }

    /// Run the callback on `element`.
    pub fn call(&self, driver: &Driver, element: Value, k: Cont, ek: ErrCont) -> Step {
        match self {
            Callback::Function(function) => apply(driver, function.clone(), vec![element], k, ek),
            Callback::Named { name, body, env } => {
                let (binder, expr, defining) = (name.clone(), body.clone(), env.clone());
                let ek2 = ek.clone();
                let with_element = cont(move |d, element| {
                    let scope = element_scope(&defining, &element);
                    scope.declare(binder.clone(), element);
                    evaluate(d, &expr, &scope, k.clone(), ek2.clone())
                });
                settle_element(driver, env, body, name, element, with_element, ek)
            }
            Callback::Implicit { body, env } => {
                let (expr, defining) = (body.clone(), env.clone());
                let ek2 = ek.clone();
                let with_element = cont(move |d, element| {
                    let scope = element_scope(&defining, &element);
                    scope.declare("_", element.clone());
                    let k = k.clone();
                    let ek3 = ek2.clone();
                    let on_result = cont(move |d, result| {
                        if result.is_function() {
                            apply(d, result, vec![element.clone()], k.clone(), ek3.clone())
                        } else {
                            d.bounce(&k, result)
                        }
                    });
                    evaluate(d, &expr, &scope, on_result, ek2.clone())
                });
                settle_element(driver, env, body, "_", element, with_element, ek)
            }
        }
    }
}

/// Hand `element` to `k`, forcing it first when it is still unsettled and
/// `body` mentions a name neither `binder` nor the defining scope provides.
/// Such a name can only come from the element's fields.
fn settle_element(
    driver: &Driver,
    env: &Env,
    body: &Node,
    binder: &str,
    element: Value,
    k: Cont,
    ek: ErrCont,
) -> Step {
    let unsettled = matches!(&element, Value::Lazy(lazy) if !lazy.is_settled());
    let needs_fields = unsettled
        && body
            .variable_names()
            .into_iter()
            .any(|name| name != binder && !env.is_bound(name));
    if needs_fields {
        force(driver, element, k, ek)
    } else {
        driver.bounce(&k, element)
    }
}

/// Object elements expose their fields as variables inside the callback.
fn element_scope(env: &Env, element: &Value) -> Env {
    let object = match element {
        Value::Object(fields) => Some(fields.clone()),
        Value::Lazy(lazy) => match lazy.outcome() {
            Some(Ok(Value::Object(fields))) => Some(fields),
            _ => None,
        },
        _ => None,
    };
    match object {
        Some(fields) => env.object_scope(fields).child(),
        None => env.child(),
    }
}

/// Force `value` into a `Cons`/`Nil` sequence.
pub fn to_sequence(driver: &Driver, value: Value, k: Cont, ek: ErrCont) -> Step {
    let ek2 = ek.clone();
    force(
        driver,
        value,
        cont(move |d, forced| match forced {
            Value::Nil | Value::Cons(_) => d.bounce(&k, forced),
            Value::Array(elements) => {
                let elements = elements.borrow().clone();
                d.bounce(&k, Value::sequence(elements))
            }
            Value::Table(table) => d.bounce(&k, Value::sequence(table.data.clone())),
            other => d.fail(&ek2, EvalError::not_a(other.type_name(), "sequence")),
        }),
        ek,
    )
}

/// `source.map(callback)`
pub fn map(source: Value, callback: Callback) -> Value {
    Value::Lazy(Lazy::new(move |driver, k, ek| {
        let ek2 = ek.clone();
        to_sequence(
            driver,
            source,
            cont(move |d, seq| match seq {
                Value::Cons(cell) => {
                    let tail = cell.tail.clone();
                    let next = callback.clone();
                    let k = k.clone();
                    callback.call(
                        d,
                        cell.head.clone(),
                        cont(move |d, mapped| {
                            d.bounce(&k, Value::cons(mapped, map(tail.clone(), next.clone())))
                        }),
                        ek2.clone(),
                    )
                }
                _ => d.bounce(&k, Value::Nil),
            }),
            ek,
        )
    }))
}

/// `source.where(predicate)`
pub fn filter(source: Value, predicate: Callback) -> Value {
    Value::Lazy(Lazy::new(move |driver, k, ek| {
        filter_step(driver, source, predicate, k, ek)
    }))
}

fn filter_step(driver: &Driver, source: Value, predicate: Callback, k: Cont, ek: ErrCont) -> Step {
    let ek2 = ek.clone();
    to_sequence(
        driver,
        source,
        cont(move |d, seq| {
            let cell = match seq {
                Value::Cons(cell) => cell,
                _ => return d.bounce(&k, Value::Nil),
            };
            let head = cell.head.clone();
            let predicate2 = predicate.clone();
            let k = k.clone();
            let ek3 = ek2.clone();
            let keep = cont(move |d, verdict| {
                let verdict = match verdict.is_truthy() {
                    Ok(verdict) => verdict,
                    Err(error) => return d.fail(&ek3, error),
                };
                if verdict {
                    let rest = filter(cell.tail.clone(), predicate2.clone());
                    d.bounce(&k, Value::cons(cell.head.clone(), rest))
                } else {
                    filter_step(d, cell.tail.clone(), predicate2.clone(), k.clone(), ek3.clone())
                }
            });
            let ek4 = ek2.clone();
            predicate.call(
                d,
                head,
                cont(move |d, verdict| force(d, verdict, keep.clone(), ek4.clone())),
                ek2.clone(),
            )
        }),
        ek,
    )
}

/// `source.concat()`: flatten one level.
pub fn concat(source: Value) -> Value {
    concat_from(Value::Nil, source)
}

/// Yield the rest of `inner`, then the flattening of `outer`.
fn concat_from(inner: Value, outer: Value) -> Value {
    Value::Lazy(Lazy::new(move |driver, k, ek| {
        concat_step(driver, inner, outer, k, ek)
    }))
}

fn concat_step(driver: &Driver, inner: Value, outer: Value, k: Cont, ek: ErrCont) -> Step {
    let ek2 = ek.clone();
    to_sequence(
        driver,
        inner,
        cont(move |d, inner| match inner {
            Value::Cons(cell) => d.bounce(
                &k,
                Value::cons(cell.head.clone(), concat_from(cell.tail.clone(), outer.clone())),
            ),
            _ => {
                let k = k.clone();
                let ek3 = ek2.clone();
                to_sequence(
                    d,
                    outer.clone(),
                    cont(move |d, outer| match outer {
                        Value::Cons(cell) => concat_step(
                            d,
                            cell.head.clone(),
                            cell.tail.clone(),
                            k.clone(),
                            ek3.clone(),
                        ),
                        _ => d.bounce(&k, Value::Nil),
                    }),
                    ek2.clone(),
                )
            }
        }),
        ek,
    )
}

/// `source.take(count)`: at most `count` leading elements.
pub fn take(source: Value, count: usize) -> Value {
    Value::Lazy(Lazy::new(move |driver, k, ek| {
        if count == 0 {
            return driver.bounce(&k, Value::Nil);
        }
        to_sequence(
            driver,
            source,
            cont(move |d, seq| match seq {
                Value::Cons(cell) => d.bounce(
                    &k,
                    Value::cons(cell.head.clone(), take(cell.tail.clone(), count - 1)),
                ),
                _ => d.bounce(&k, Value::Nil),
            }),
            ek,
        )
    }))
}

/// Force the whole spine and collect the heads, which stay unforced.
pub fn to_array(driver: &Driver, source: Value, k: Cont, ek: ErrCont) -> Step {
    collect_step(driver, source, Rc::new(RefCell::new(Vec::new())), k, ek)
}

fn collect_step(
    driver: &Driver,
    source: Value,
    acc: Rc<RefCell<Vec<Value>>>,
    k: Cont,
    ek: ErrCont,
) -> Step {
    let ek2 = ek.clone();
    to_sequence(
        driver,
        source,
        cont(move |d, seq| match seq {
            Value::Cons(cell) => {
                acc.borrow_mut().push(cell.head.clone());
                collect_step(d, cell.tail.clone(), acc.clone(), k.clone(), ek2.clone())
            }
            _ => d.bounce(&k, Value::array(acc.take())),
        }),
        ek,
    )
}

/// The element at `index`, forcing the spine up to it. Past the end yields
/// `undefined`.
pub fn nth(driver: &Driver, source: Value, index: usize, k: Cont, ek: ErrCont) -> Step {
    let ek2 = ek.clone();
    to_sequence(
        driver,
        source,
        cont(move |d, seq| match seq {
            Value::Cons(cell) if index == 0 => d.bounce(&k, cell.head.clone()),
            Value::Cons(cell) => nth(d, cell.tail.clone(), index - 1, k.clone(), ek2.clone()),
            _ => d.bounce(&k, Value::Undefined),
        }),
        ek,
    )
}
