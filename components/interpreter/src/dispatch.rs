//! AST dispatch.
//!
//! Evaluates one node at a time in continuation-passing style. Every result is
//! delivered with `driver.bounce` so control always returns to the drive loop
//! before the next continuation runs.

use ast::{AssignmentOperator, Comprehension, LiteralValue, Node, NodeRef, UnaryOperator};
use core_types::{
    cont, err_cont, Cont, Driver, Env, ErrCont, EvalError, Lazy, Step, UserFunction, Value,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

use crate::call_frame;
use crate::lvalue::{lvalue_cont, LValue};
use crate::methods;
use crate::sequence::{self, Callback};

/// Continuation receiving a list of values.
pub type ValuesCont = Rc<dyn Fn(&Driver, Vec<Value>) -> Step>;

/// Wrap a closure as a [`ValuesCont`].
pub fn values_cont(f: impl Fn(&Driver, Vec<Value>) -> Step + 'static) -> ValuesCont {
    Rc::new(f)
}

/// Resolve a value to a non-lazy one.
pub fn force(driver: &Driver, value: Value, k: Cont, ek: ErrCont) -> Step {
    match value {
        Value::Lazy(lazy) => lazy.force(driver, k, ek),
        value => driver.bounce(&k, value),
    }
}

/// Evaluate `node` and force its result.
pub fn evaluate_forced(driver: &Driver, node: &NodeRef, env: &Env, k: Cont, ek: ErrCont) -> Step {
    let ek2 = ek.clone();
    evaluate(
        driver,
        node,
        env,
        cont(move |d, value| force(d, value, k.clone(), ek2.clone())),
        ek,
    )
}

/// Evaluate a statement list; the result is the last statement's value.
pub fn evaluate_body(driver: &Driver, body: Rc<[NodeRef]>, env: &Env, k: Cont, ek: ErrCont) -> Step {
    body_step(driver, body, 0, env.clone(), k, ek)
}

fn body_step(
    driver: &Driver,
    body: Rc<[NodeRef]>,
    index: usize,
    env: Env,
    k: Cont,
    ek: ErrCont,
) -> Step {
    if body.is_empty() {
        return driver.bounce(&k, Value::Undefined);
    }
    let node = body[index].clone();
    if index + 1 == body.len() {
        return evaluate(driver, &node, &env, k, ek);
    }
    let scope = env.clone();
    let ek2 = ek.clone();
    let next = cont(move |d, _| body_step(d, body.clone(), index + 1, env.clone(), k.clone(), ek2.clone()));
    evaluate(driver, &node, &scope, next, ek)
}

/// Evaluate `nodes` left to right, optionally forcing each result.
pub fn evaluate_list(
    driver: &Driver,
    nodes: Rc<[NodeRef]>,
    env: &Env,
    forced: bool,
    k: ValuesCont,
    ek: ErrCont,
) -> Step {
    let acc = Rc::new(RefCell::new(Vec::with_capacity(nodes.len())));
    list_step(driver, nodes, 0, env.clone(), forced, acc, k, ek)
}

#[allow(clippy::too_many_arguments)]
fn list_step(
    driver: &Driver,
    nodes: Rc<[NodeRef]>,
    index: usize,
    env: Env,
    forced: bool,
    acc: Rc<RefCell<Vec<Value>>>,
    k: ValuesCont,
    ek: ErrCont,
) -> Step {
    if index == nodes.len() {
        let values = acc.take();
        return driver.defer(move |d| k(d, values));
    }
    let node = nodes[index].clone();
    let scope = env.clone();
    let ek2 = ek.clone();
    let next = cont(move |d, value| {
        acc.borrow_mut().push(value);
        list_step(
            d,
            nodes.clone(),
            index + 1,
            env.clone(),
            forced,
            acc.clone(),
            k.clone(),
            ek2.clone(),
        )
    });
    if forced {
        evaluate_forced(driver, &node, &scope, next, ek)
    } else {
        evaluate(driver, &node, &scope, next, ek)
    }
}

/// Force every value in `values`, in order.
pub fn force_all(driver: &Driver, values: Vec<Value>, k: ValuesCont, ek: ErrCont) -> Step {
    let acc = Rc::new(RefCell::new(Vec::with_capacity(values.len())));
    force_step(driver, Rc::new(values), 0, acc, k, ek)
}

fn force_step(
    driver: &Driver,
    values: Rc<Vec<Value>>,
    index: usize,
    acc: Rc<RefCell<Vec<Value>>>,
    k: ValuesCont,
    ek: ErrCont,
) -> Step {
    if index == values.len() {
        let forced = acc.take();
        return driver.defer(move |d| k(d, forced));
    }
    let value = values[index].clone();
    let ek2 = ek.clone();
    let next = cont(move |d, v| {
        acc.borrow_mut().push(v);
        force_step(d, values.clone(), index + 1, acc.clone(), k.clone(), ek2.clone())
    });
    force(driver, value, next, ek)
}

/// A lazy that evaluates `program` in `env` when forced.
pub fn program_lazy(program: Rc<[NodeRef]>, env: Env) -> Lazy {
    Lazy::new(move |driver, k, ek| evaluate_body(driver, program, &env, k, ek))
}

/// Evaluate a single node.
pub fn evaluate(driver: &Driver, node: &NodeRef, env: &Env, k: Cont, ek: ErrCont) -> Step {
    match &**node {
        Node::Literal { value } => driver.bounce(&k, literal(value)),

        Node::Variable { name } => match env.lookup(name) {
            Ok(value) => driver.bounce(&k, value),
            Err(error) => driver.fail(&ek, error),
        },

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
                    let ek3 = ek2.clone();
                    evaluate_forced(
                        d,
                        &key_node,
                        &env2,
                        cont(move |d, key| get_member(d, target.clone(), key, k.clone(), ek3.clone())),
                        ek2.clone(),
                    )
                }),
                ek,
            )
        }

        Node::AssignmentExpression {
            left,
            operator,
            right,
        } => assignment(driver, left, *operator, right, env, k, ek),

        Node::BinaryExpression {
            left,
            operator,
            right,
        } => {
            let op = *operator;
            let right = right.clone();
            let env2 = env.clone();
            let ek2 = ek.clone();
            evaluate_forced(
                driver,
                left,
                env,
                cont(move |d, lhs| {
                    let k = k.clone();
                    let ek3 = ek2.clone();
                    evaluate_forced(
                        d,
                        &right,
                        &env2,
                        cont(move |d, rhs| match lhs.binary(op, &rhs) {
                            Ok(value) => d.bounce(&k, value),
                            Err(error) => d.fail(&ek3, error),
                        }),
                        ek2.clone(),
                    )
                }),
                ek,
            )
        }

        Node::UnaryExpression { operator, argument } => {
            let op = *operator;
            let ek2 = ek.clone();
            evaluate_forced(
                driver,
                argument,
                env,
                cont(move |d, value| match unary(op, &value) {
                    Ok(result) => d.bounce(&k, result),
                    Err(error) => d.fail(&ek2, error),
                }),
                ek,
            )
        }

        Node::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => {
            let consequent = consequent.clone();
            let alternate = alternate.clone();
            let env2 = env.clone();
            let ek2 = ek.clone();
            evaluate_forced(
                driver,
                test,
                env,
                cont(move |d, value| match value.is_truthy() {
                    Ok(true) => evaluate(d, &consequent, &env2, k.clone(), ek2.clone()),
                    Ok(false) => evaluate(d, &alternate, &env2, k.clone(), ek2.clone()),
                    Err(error) => d.fail(&ek2, error),
                }),
                ek,
            )
        }

        Node::SequenceExpression { expressions } => {
            evaluate_body(driver, expressions.as_slice().into(), env, k, ek)
        }

        Node::VariableStatement { declarations } => {
            let declared: Rc<[(String, Option<NodeRef>)]> = declarations
                .iter()
                .map(|decl| (decl.name.clone(), decl.value.clone()))
                .collect();
            declare_step(driver, declared, 0, env.clone(), k, ek)
        }

        Node::FunctionCall { name, arguments } => {
            call(driver, name, arguments.as_slice().into(), env, k, ek)
        }

        Node::Function {
            name,
            params,
            elements,
        } => {
            let function = Value::UserFunction(Rc::new(UserFunction {
                name: name.clone(),
                params: params.clone(),
                body: elements.as_slice().into(),
                env: env.clone(),
            }));
            if let Some(name) = name {
                env.declare(name.clone(), function.clone());
            }
            driver.bounce(&k, function)
        }

        Node::TryStatement { block, handler } => {
            let identifier = handler.identifier.clone();
            let handler_block: Rc<[NodeRef]> = handler.block.as_slice().into();
            let env2 = env.clone();
            let k2 = k.clone();
            let outer = ek.clone();
            let on_error = err_cont(move |d, error| {
                if !error.is_catchable() {
                    return d.fail(&outer, error);
                }
                debug!(identifier = %identifier, %error, "caught");
                let scope = env2.child();
                scope.declare(identifier.clone(), error.into_value());
                evaluate_body(d, handler_block.clone(), &scope, k2.clone(), outer.clone())
            });
            evaluate_body(driver, block.as_slice().into(), env, k, on_error)
        }

        Node::ThrowStatement { exception } => {
            let ek2 = ek.clone();
            evaluate_forced(
                driver,
                exception,
                env,
                cont(move |d, value| d.fail(&ek2, EvalError::Thrown(value))),
                ek,
            )
        }

        Node::ObjectLiteral { properties } => {
            let names: Vec<String> = properties.iter().map(|p| p.name.clone()).collect();
            let values: Rc<[NodeRef]> = properties.iter().map(|p| p.value.clone()).collect();
            evaluate_list(
                driver,
                values,
                env,
                false,
                values_cont(move |d, values| {
                    let fields: HashMap<String, Value> =
                        names.iter().cloned().zip(values).collect();
                    d.bounce(&k, Value::object(fields))
                }),
                ek,
            )
        }

        Node::ArrayLiteral { elements } => evaluate_list(
            driver,
            elements.as_slice().into(),
            env,
            false,
            values_cont(move |d, values| d.bounce(&k, Value::array(values))),
            ek,
        ),

        Node::ComprehensionMapExpression(comprehension) => {
            comprehend(driver, comprehension, false, env, k, ek)
        }

        Node::ComprehensionConcatMapExpression(comprehension) => {
            comprehend(driver, comprehension, true, env, k, ek)
        }

        Node::Unsupported => driver.fail(
            &ek,
            EvalError::type_error("unsupported syntax node"),
        ),
    }
}

fn literal(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Boolean(b) => Value::Boolean(*b),
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::String(s) => Value::string(s.as_str()),
        LiteralValue::Undefined => Value::Undefined,
    }
}

fn unary(op: UnaryOperator, value: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOperator::Minus => match value {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(EvalError::not_a(other.type_name(), "number")),
        },
        UnaryOperator::Not => Ok(Value::Boolean(!value.is_truthy()?)),
    }
}

/// Read `key` from a forced `target`. Numeric keys on sequences walk the
/// spine.
pub fn get_member(driver: &Driver, target: Value, key: Value, k: Cont, ek: ErrCont) -> Step {
    if target.is_sequence() {
        if let Some(index) = key.as_index() {
            return sequence::nth(driver, target, index, k, ek);
        }
    }
    match target.get_property(&key) {
        Ok(value) => driver.bounce(&k, value),
        Err(error) => driver.fail(&ek, error),
    }
}

fn declare_step(
    driver: &Driver,
    declarations: Rc<[(String, Option<NodeRef>)]>,
    index: usize,
    env: Env,
    k: Cont,
    ek: ErrCont,
) -> Step {
    let Some((name, init)) = declarations.get(index).cloned() else {
        return driver.bounce(&k, Value::Undefined);
    };
    match init {
        None => {
            env.declare(name, Value::Undefined);
            declare_step(driver, declarations, index + 1, env, k, ek)
        }
        Some(init) => {
            let scope = env.clone();
            let ek2 = ek.clone();
            let next = cont(move |d, value| {
                env.declare(name.clone(), value);
                declare_step(d, declarations.clone(), index + 1, env.clone(), k.clone(), ek2.clone())
            });
            evaluate(driver, &init, &scope, next, ek)
        }
    }
}

fn assignment(
    driver: &Driver,
    left: &NodeRef,
    operator: AssignmentOperator,
    right: &NodeRef,
    env: &Env,
    k: Cont,
    ek: ErrCont,
) -> Step {
    let right = right.clone();
    let env2 = env.clone();
    let ek2 = ek.clone();
    let on_target = lvalue_cont(move |d, target: LValue| match operator.binary() {
        None => {
            let k = k.clone();
            let ek3 = ek2.clone();
            evaluate(
                d,
                &right,
                &env2,
                cont(move |d, value| target.set(d, value, k.clone(), ek3.clone())),
                ek2.clone(),
            )
        }
        Some(op) => {
            // The current value is read and forced before the right side runs.
            let right = right.clone();
            let env = env2.clone();
            let k = k.clone();
            let ek = ek2.clone();
            let store = target.clone();
            target.get(
                d,
                cont(move |d, current| {
                    let right = right.clone();
                    let env = env.clone();
                    let k = k.clone();
                    let ek4 = ek.clone();
                    let store = store.clone();
                    force(
                        d,
                        current,
                        cont(move |d, current| {
                            let k = k.clone();
                            let ek5 = ek4.clone();
                            let store = store.clone();
                            evaluate_forced(
                                d,
                                &right,
                                &env,
                                cont(move |d, rhs| match current.binary(op, &rhs) {
                                    Ok(result) => store.set(d, result, k.clone(), ek5.clone()),
                                    Err(error) => d.fail(&ek5, error),
                                }),
                                ek4.clone(),
                            )
                        }),
                        ek.clone(),
                    )
                }),
                ek2.clone(),
            )
        }
    });
    LValue::resolve(driver, left, env, on_target, ek)
}

fn call(
    driver: &Driver,
    callee: &NodeRef,
    args: Rc<[NodeRef]>,
    env: &Env,
    k: Cont,
    ek: ErrCont,
) -> Step {
    let env2 = env.clone();
    let ek2 = ek.clone();
    match &**callee {
        Node::PropertyAccess { base, name } => {
            // The receiver stays unforced: a lazy receiver yields a lazy result.
            let key_node = name.clone();
            evaluate(
                driver,
                base,
                env,
                cont(move |d, receiver| {
                    let args = args.clone();
                    let env = env2.clone();
                    let k = k.clone();
                    let ek3 = ek2.clone();
                    evaluate_forced(
                        d,
                        &key_node,
                        &env2,
                        cont(move |d, key| {
                            methods::invoke_method(
                                d,
                                receiver.clone(),
                                key.to_key(),
                                args.clone(),
                                env.clone(),
                                k.clone(),
                                ek3.clone(),
                            )
                        }),
                        ek2.clone(),
                    )
                }),
                ek,
            )
        }
        _ => evaluate_forced(
            driver,
            callee,
            env,
            cont(move |d, function| {
                call_frame::invoke(d, function, args.clone(), &env2, k.clone(), ek2.clone())
            }),
            ek,
        ),
    }
}

fn comprehend(
    driver: &Driver,
    comprehension: &Comprehension,
    concat: bool,
    env: &Env,
    k: Cont,
    ek: ErrCont,
) -> Step {
    let name = comprehension.name.clone().unwrap_or_else(|| "_".to_string());
    let produce = Callback::named(&name, comprehension.yield_expr.clone(), env);
    let guard = comprehension
        .guard
        .as_ref()
        .map(|guard| Callback::named(&name, guard.clone(), env));
    evaluate(
        driver,
        &comprehension.generate,
        env,
        cont(move |d, source| {
            let mut result = source;
            if let Some(guard) = &guard {
                result = sequence::filter(result, guard.clone());
            }
            result = sequence::map(result, produce.clone());
            if concat {
                result = sequence::concat(result);
            }
            d.bounce(&k, result)
        }),
        ek,
    )
}
