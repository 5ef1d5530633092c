//! Integration tests for interpreter
//!
//! Exercises evaluation together with laziness, the drive loop and the host
//! event loop.

use ast::builder::*;
use ast::{AssignmentOperator, BinaryOperator, NodeRef};
use async_runtime::Promise;
use core_types::{cont, err_cont, BuiltinFunction, Env, Lazy, Step, Trampoline, Value};
use interpreter::VM;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn countdown_program(depth: f64) -> Vec<NodeRef> {
    // function down(n) { n == 0 ? 0 : 1 + down(n - 1) }; down(depth)
    vec![
        function(
            Some("down"),
            &["n"],
            vec![conditional(
                binary(BinaryOperator::Eq, var("n"), num(0.0)),
                num(0.0),
                binary(
                    BinaryOperator::Add,
                    num(1.0),
                    call(
                        var("down"),
                        vec![binary(BinaryOperator::Sub, var("n"), num(1.0))],
                    ),
                ),
            )],
        ),
        call(var("down"), vec![num(depth)]),
    ]
}

#[test]
fn test_deep_recursion_does_not_grow_native_stack() {
    let vm = VM::new(Env::root());
    let result = vm.execute(&countdown_program(10_000.0)).unwrap();
    assert_eq!(result, Value::Number(10_000.0));
}

fn accumulator_program(tail: Option<NodeRef>) -> Vec<NodeRef> {
    // var n = 0; var xs = [1,2,3].map(n += _); <tail>; n
    let mut program = vec![
        declare(vec![("n", Some(num(0.0)))]),
        declare(vec![(
            "xs",
            Some(method(
                array(vec![num(1.0), num(2.0), num(3.0)]),
                "map",
                vec![compound(AssignmentOperator::AddAssign, var("n"), var("_"))],
            )),
        )]),
    ];
    program.extend(tail);
    program.push(var("n"));
    program
}

#[test]
fn test_map_is_lazy_until_indexed() {
    let vm = VM::new(Env::root());
    assert_eq!(vm.execute(&accumulator_program(None)).unwrap(), Value::Number(0.0));

    let vm = VM::new(Env::root());
    let first = accumulator_program(Some(index(var("xs"), num(0.0))));
    assert_eq!(vm.execute(&first).unwrap(), Value::Number(1.0));

    let vm = VM::new(Env::root());
    let third = accumulator_program(Some(index(var("xs"), num(2.0))));
    assert_eq!(vm.execute(&third).unwrap(), Value::Number(6.0));
}

#[test]
fn test_mapped_cells_are_memoized() {
    let vm = VM::new(Env::root());
    let program = accumulator_program(Some(sequence(vec![
        index(var("xs"), num(2.0)),
        index(var("xs"), num(2.0)),
        index(var("xs"), num(0.0)),
    ])));
    assert_eq!(vm.execute(&program).unwrap(), Value::Number(6.0));
}

#[test]
fn test_method_on_lazy_receiver_stays_lazy() {
    let forced = Rc::new(Cell::new(0));
    let counter = forced.clone();
    let env = Env::root();
    env.declare(
        "source",
        Value::Lazy(Lazy::new(move |d, k, _ek| {
            counter.set(counter.get() + 1);
            d.bounce(&k, Value::sequence(vec![Value::Number(1.0), Value::Number(2.0)]))
        })),
    );
    let vm = VM::new(env);

    // Binding the mapped value does not force the receiver.
    let bind = vec![declare(vec![(
        "ys",
        Some(method(var("source"), "map", vec![binary(BinaryOperator::Mul, var("_"), num(3.0))])),
    )])];
    vm.execute(&bind).unwrap();
    assert_eq!(forced.get(), 0);

    let read = vec![index(var("ys"), num(1.0))];
    assert_eq!(vm.execute(&read).unwrap(), Value::Number(6.0));
    assert_eq!(forced.get(), 1);
}

#[test]
fn test_globals_persist_between_executions() {
    let vm = VM::new(Env::root());
    vm.execute(&[declare(vec![("x", Some(num(4.0)))])]).unwrap();
    let result = vm
        .execute(&[binary(BinaryOperator::Mul, var("x"), var("x"))])
        .unwrap();
    assert_eq!(result, Value::Number(16.0));
}

#[test]
fn test_async_builtin_resumes_on_fresh_driver() {
    let env = Env::root();
    env.declare(
        "later",
        BuiltinFunction::asynchronous("later", |args: &[Value]| {
            Promise::resolved(Value::Number(args[0].to_number().unwrap_or(0.0) + 1.0))
        }),
    );
    let vm = VM::new(env);
    let program = vec![binary(
        BinaryOperator::Mul,
        call(var("later"), vec![num(1.0)]),
        num(10.0),
    )];
    assert_eq!(vm.execute(&program).unwrap(), Value::Number(20.0));
}

#[test]
fn test_async_rejection_is_catchable() {
    let env = Env::root();
    env.declare(
        "fetch",
        BuiltinFunction::asynchronous("fetch", |_: &[Value]| {
            Promise::rejected(core_types::EvalError::Thrown(Value::string("offline")))
        }),
    );
    let vm = VM::new(env);
    let program = vec![try_catch(
        vec![call(var("fetch"), vec![])],
        "e",
        vec![binary(BinaryOperator::Add, string("caught "), var("e"))],
    )];
    assert_eq!(vm.execute(&program).unwrap(), Value::string("caught offline"));
}

#[test]
fn test_pending_host_work_is_reported() {
    let pending: Promise<Value, core_types::EvalError> = Promise::new();
    let held = pending.clone();
    let env = Env::root();
    env.declare(
        "never",
        BuiltinFunction::asynchronous("never", move |_: &[Value]| held.clone()),
    );
    let vm = VM::new(env);
    let err = vm.execute(&[call(var("never"), vec![])]).unwrap_err();
    assert_eq!(err.kind(), core_types::ErrorKind::InternalIntegrityFault);
    drop(pending);
}

#[test]
fn test_concurrent_forces_share_one_evaluation() {
    let trampoline = Trampoline::default();
    let env = Env::root();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    env.declare(
        "tick",
        BuiltinFunction::forcing("tick", move |_: &[Value]| {
            counter.set(counter.get() + 1);
            Ok(Value::Number(counter.get() as f64))
        }),
    );
    let vm = VM::with_trampoline(trampoline.clone(), env);
    let lazy = vm.prepare(&[call(var("tick"), vec![])]);

    let order = Rc::new(RefCell::new(Vec::new()));
    let driver = trampoline.driver();
    let mut steps = Vec::new();
    for waiter in 0..3 {
        let order = order.clone();
        steps.push(lazy.force(
            &driver,
            cont(move |_, value| {
                order.borrow_mut().push((waiter, value));
                Step::done()
            }),
            err_cont(|_, _| Step::done()),
        ));
    }
    for step in steps {
        driver.schedule(step);
    }
    driver.run(Step::done()).unwrap();

    assert_eq!(calls.get(), 1);
    let order = order.borrow();
    assert_eq!(order.len(), 3);
    assert_eq!(
        order.iter().map(|(waiter, _)| *waiter).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(order.iter().all(|(_, value)| *value == Value::Number(1.0)));
}

fn pending_object(forced: Rc<Cell<usize>>) -> Value {
    Value::Lazy(Lazy::new(move |d, k, _| {
        forced.set(forced.get() + 1);
        let mut fields = std::collections::HashMap::new();
        fields.insert("price".to_string(), Value::Number(3.0));
        d.bounce(&k, Value::object(fields))
    }))
}

#[test]
fn test_unsettled_object_element_exposes_fields() {
    let forced = Rc::new(Cell::new(0));
    let env = Env::root();
    env.declare("pending", pending_object(forced.clone()));
    let vm = VM::new(env);

    // [pending].map(price * 10)[0]
    let program = vec![index(
        method(
            array(vec![var("pending")]),
            "map",
            vec![binary(BinaryOperator::Mul, var("price"), num(10.0))],
        ),
        num(0.0),
    )];
    assert_eq!(vm.execute(&program).unwrap(), Value::Number(30.0));
    assert_eq!(forced.get(), 1);
}

#[test]
fn test_element_is_not_forced_when_no_field_is_mentioned() {
    let forced = Rc::new(Cell::new(0));
    let env = Env::root();
    env.declare("pending", pending_object(forced.clone()));
    env.declare("bonus", Value::Number(2.0));
    let vm = VM::new(env);

    // [pending].map(bonus + 1)[0]
    let program = vec![index(
        method(
            array(vec![var("pending")]),
            "map",
            vec![binary(BinaryOperator::Add, var("bonus"), num(1.0))],
        ),
        num(0.0),
    )];
    assert_eq!(vm.execute(&program).unwrap(), Value::Number(3.0));
    assert_eq!(forced.get(), 0);
}
