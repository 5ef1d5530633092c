//! Assignable locations.
//!
//! An [`LValue`] addresses either a variable or a property slot, so
//! assignment reads and writes the same way whatever the target is.

use ast::{Node, NodeRef};
use core_types::{cont, Cont, Driver, Env, ErrCont, EvalError, Step, Value};
use std::rc::Rc;

use crate::dispatch::evaluate_forced;

/// Continuation receiving a resolved location.
pub type LValueCont = Rc<dyn Fn(&Driver, LValue) -> Step>;

/// Wrap a closure as an [`LValueCont`].
pub fn lvalue_cont(f: impl Fn(&Driver, LValue) -> Step + 'static) -> LValueCont {
    Rc::new(f)
}

/// A variable or property slot.
#[derive(Debug, Clone)]
pub enum LValue {
    /// A binding found through `env`
    Variable {
        /// Variable name
        name: String,
        /// Scope the lookup starts from
        env: Env,
    },
    /// `target[key]`
    Property {
        /// Forced object or array
        target: Value,
        /// Forced key
        key: Value,
    },
}

impl LValue {
    /// Resolve `node` to a location, evaluating the base and key of a
    /// property access.
    pub fn resolve(driver: &Driver, node: &NodeRef, env: &Env, k: LValueCont, ek: ErrCont) -> Step {
        match &**node {
            Node::Variable { name } => {
                let location = LValue::Variable {
                    name: name.clone(),
                    env: env.clone(),
                };
                driver.defer(move |d| k(d, location))
            }
            Node::PropertyAccess { base, name } => {
                let key_node = name.clone();
                let env2 = env.clone();
                let ek2 = ek.clone();
                evaluate_forced(
                    driver,
                    base,
                    env,
                    cont(move |d, target| {
                        let k = k.clone();
                        evaluate_forced(
                            d,
                            &key_node,
                            &env2,
                            cont(move |d, key| {
                                let location = LValue::Property {
                                    target: target.clone(),
                                    key,
                                };
                                k(d, location)
                            }),
                            ek2.clone(),
                        )
                    }),
                    ek,
                )
            }
            other => driver.fail(
                &ek,
                EvalError::type_error(format!("cannot assign to {}", other.kind())),
            ),
        }
    }

    /// Read the current value.
    pub fn get(&self, driver: &Driver, k: Cont, ek: ErrCont) -> Step {
        let current = match self {
            LValue::Variable { name, env } => env.lookup(name),
            LValue::Property { target, key } => target.get_property(key),
        };
        match current {
            Ok(value) => driver.bounce(&k, value),
            Err(error) => driver.fail(&ek, error),
        }
    }

    /// Store `value`, then pass it on to `k`.
    pub fn set(&self, driver: &Driver, value: Value, k: Cont, ek: ErrCont) -> Step {
        let stored = match self {
            LValue::Variable { name, env } => env.assign(name, value.clone()),
            LValue::Property { target, key } => target.set_property(key, value.clone()),
        };
        match stored {
            Ok(()) => driver.bounce(&k, value),
            Err(error) => driver.fail(&ek, error),
        }
    }
}
