//! Contract tests for lazy

use super::run;
use ast::builder::*;
use ast::{AssignmentOperator, BinaryOperator};
use core_types::{ErrorKind, Value};

#[test]
fn test_lazy_defers_evaluation() {
    // var n = 0; var l = lazy(n += 1); n
    let program = vec![
        declare(vec![("n", Some(num(0.0)))]),
        declare(vec![(
            "l",
            Some(call(
                var("lazy"),
                vec![compound(AssignmentOperator::AddAssign, var("n"), num(1.0))],
            )),
        )]),
        var("n"),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(0.0));
}

#[test]
fn test_lazy_runs_once() {
    // var n = 0; var l = lazy(n += 1); l + l; n
    let program = vec![
        declare(vec![("n", Some(num(0.0)))]),
        declare(vec![(
            "l",
            Some(call(
                var("lazy"),
                vec![compound(AssignmentOperator::AddAssign, var("n"), num(1.0))],
            )),
        )]),
        binary(BinaryOperator::Add, var("l"), var("l")),
        var("n"),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(1.0));
}

#[test]
fn test_lazy_error_surfaces_when_forced() {
    let program = vec![
        declare(vec![("l", Some(call(var("lazy"), vec![var("missing")])))]),
        binary(BinaryOperator::Add, var("l"), num(1.0)),
    ];
    assert_eq!(run(program).unwrap_err().kind(), ErrorKind::UnboundVariable);
}

#[test]
fn test_unforced_lazy_error_is_silent() {
    let program = vec![
        declare(vec![("l", Some(call(var("lazy"), vec![var("missing")])))]),
        num(7.0),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(7.0));
}

#[test]
fn test_lazy_cannot_be_used_as_callback() {
    let program = vec![method(
        method(array(vec![num(1.0)]), "map", vec![var("lazy")]),
        "toArray",
        vec![],
    )];
    let err = run(program).unwrap_err();
    assert!(err.to_string().contains("cannot be applied"));
}

#[test]
fn test_lazy_arity() {
    assert!(run(vec![call(var("lazy"), vec![])]).is_err());
}
