//! Unit tests for interpreter components

use ast::builder::*;
use ast::{AssignmentOperator, BinaryOperator, NodeRef, UnaryOperator};
use core_types::{BuiltinFunction, Env, ErrorKind, EvalError, Value};
use interpreter::VM;
use pretty_assertions::assert_eq;

fn run(program: Vec<NodeRef>) -> Result<Value, EvalError> {
    VM::new(Env::root()).execute(&program)
}

fn numbers(value: &Value) -> Vec<f64> {
    match value {
        Value::Array(elements) => elements
            .borrow()
            .iter()
            .map(|element| match element {
                Value::Number(n) => *n,
                Value::Lazy(lazy) => match lazy.outcome() {
                    Some(Ok(Value::Number(n))) => n,
                    other => panic!("unforced element {:?}", other),
                },
                other => panic!("expected number, got {:?}", other),
            })
            .collect(),
        other => panic!("expected array, got {:?}", other),
    }
}

fn array_of(values: &[f64]) -> NodeRef {
    array(values.iter().map(|n| num(*n)).collect())
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_literals_evaluate_to_themselves() {
    assert_eq!(run(vec![num(4.5)]).unwrap(), Value::Number(4.5));
    assert_eq!(run(vec![string("hi")]).unwrap(), Value::string("hi"));
    assert_eq!(run(vec![boolean(false)]).unwrap(), Value::Boolean(false));
    assert_eq!(run(vec![undefined()]).unwrap(), Value::Undefined);
}

#[test]
fn test_empty_program_is_undefined() {
    assert_eq!(run(vec![]).unwrap(), Value::Undefined);
}

#[test]
fn test_addition() {
    let result = run(vec![binary(BinaryOperator::Add, num(1.0), num(2.0))]).unwrap();
    assert_eq!(result, Value::Number(3.0));
}

#[test]
fn test_string_concatenation_from_either_side() {
    let left = run(vec![binary(BinaryOperator::Add, string("n="), num(3.0))]).unwrap();
    assert_eq!(left, Value::string("n=3"));
    let right = run(vec![binary(BinaryOperator::Add, num(3.0), string("!"))]).unwrap();
    assert_eq!(right, Value::string("3!"));
}

#[test]
fn test_object_is_not_a_number() {
    let err = run(vec![binary(BinaryOperator::Mul, object(vec![]), num(2.0))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeError);
    assert!(err.to_string().contains("`object` is not a number"));
}

#[test]
fn test_unary_operators() {
    assert_eq!(
        run(vec![unary(UnaryOperator::Minus, num(2.0))]).unwrap(),
        Value::Number(-2.0)
    );
    assert_eq!(
        run(vec![unary(UnaryOperator::Not, string(""))]).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_conditional_only_evaluates_taken_branch() {
    let program = vec![conditional(boolean(true), num(1.0), var("missing"))];
    assert_eq!(run(program).unwrap(), Value::Number(1.0));
}

#[test]
fn test_sequence_expression_yields_last() {
    let program = vec![sequence(vec![num(1.0), num(2.0), num(3.0)])];
    assert_eq!(run(program).unwrap(), Value::Number(3.0));
}

// ============================================================================
// Variables and assignment
// ============================================================================

#[test]
fn test_declaration_without_initializer_is_undefined() {
    let program = vec![declare(vec![("x", None)]), var("x")];
    assert_eq!(run(program).unwrap(), Value::Undefined);
}

#[test]
fn test_declarations_bind_sequentially() {
    let program = vec![
        declare(vec![
            ("a", Some(num(2.0))),
            ("b", Some(binary(BinaryOperator::Mul, var("a"), num(5.0)))),
        ]),
        var("b"),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(10.0));
}

#[test]
fn test_unbound_variable() {
    let err = run(vec![var("nope")]).unwrap_err();
    assert_eq!(err, EvalError::UnboundVariable("nope".to_string()));
}

#[test]
fn test_assignment_to_undeclared_variable_fails() {
    let err = run(vec![assign(var("ghost"), num(1.0))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnboundVariable);
}

#[test]
fn test_compound_assignment_reads_left_first() {
    // var x = 1; x += (x = 5, 10); x
    let program = vec![
        declare(vec![("x", Some(num(1.0)))]),
        compound(
            AssignmentOperator::AddAssign,
            var("x"),
            sequence(vec![assign(var("x"), num(5.0)), num(10.0)]),
        ),
        var("x"),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(11.0));
}

#[test]
fn test_property_assignment() {
    let program = vec![
        declare(vec![("o", Some(object(vec![("a", num(1.0))])))]),
        assign(prop(var("o"), "b"), num(2.0)),
        binary(
            BinaryOperator::Add,
            prop(var("o"), "a"),
            prop(var("o"), "b"),
        ),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(3.0));
}

#[test]
fn test_array_index_assignment_pads() {
    let program = vec![
        declare(vec![("xs", Some(array(vec![])))]),
        assign(index(var("xs"), num(2.0)), num(7.0)),
        prop(var("xs"), "length"),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(3.0));
}

#[test]
fn test_cannot_assign_to_literal() {
    let err = run(vec![assign(num(1.0), num(2.0))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeError);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_function_call_binds_parameters() {
    let program = vec![
        function(
            Some("add"),
            &["a", "b"],
            vec![binary(BinaryOperator::Add, var("a"), var("b"))],
        ),
        call(var("add"), vec![num(2.0), num(3.0)]),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(5.0));
}

#[test]
fn test_missing_arguments_are_undefined() {
    let program = vec![
        function(Some("f"), &["a"], vec![var("a")]),
        call(var("f"), vec![]),
    ];
    assert_eq!(run(program).unwrap(), Value::Undefined);
}

#[test]
fn test_empty_function_body_is_undefined() {
    let program = vec![function(Some("f"), &[], vec![]), call(var("f"), vec![])];
    assert_eq!(run(program).unwrap(), Value::Undefined);
}

#[test]
fn test_closures_capture_defining_scope() {
    // function make(n) { function (m) { n + m } }; make(10)(5)
    let program = vec![
        function(
            Some("make"),
            &["n"],
            vec![function(
                None,
                &["m"],
                vec![binary(BinaryOperator::Add, var("n"), var("m"))],
            )],
        ),
        call(call(var("make"), vec![num(10.0)]), vec![num(5.0)]),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(15.0));
}

#[test]
fn test_calling_a_number_fails() {
    let err = run(vec![call(num(1.0), vec![])]).unwrap_err();
    assert!(err.to_string().contains("is not a function"));
}

#[test]
fn test_forcing_builtin_receives_forced_arguments() {
    let env = Env::root();
    env.declare(
        "double",
        BuiltinFunction::forcing("double", |args: &[Value]| {
            Ok(Value::Number(args[0].to_number()? * 2.0))
        }),
    );
    let vm = VM::new(env);
    let result = vm.execute(&[call(var("double"), vec![num(21.0)])]).unwrap();
    assert_eq!(result, Value::Number(42.0));
}

#[test]
fn test_forcing_builtin_error_is_catchable() {
    let env = Env::root();
    env.declare(
        "boom",
        BuiltinFunction::forcing("boom", |_: &[Value]| Err(EvalError::type_error("boom"))),
    );
    let vm = VM::new(env);
    let program = vec![try_catch(
        vec![call(var("boom"), vec![])],
        "e",
        vec![prop(var("e"), "name")],
    )];
    assert_eq!(vm.execute(&program).unwrap(), Value::string("TypeError"));
}

// ============================================================================
// Exceptions
// ============================================================================

#[test]
fn test_thrown_value_is_rebound_exactly() {
    let program = vec![
        declare(vec![("thing", Some(object(vec![("code", num(7.0))])))]),
        try_catch(
            vec![throw(var("thing"))],
            "caught",
            vec![binary(BinaryOperator::Eq, var("caught"), var("thing"))],
        ),
    ];
    assert_eq!(run(program).unwrap(), Value::Boolean(true));
}

#[test]
fn test_uncaught_throw_propagates() {
    let err = run(vec![throw(string("oops"))]).unwrap_err();
    assert_eq!(err, EvalError::Thrown(Value::string("oops")));
}

#[test]
fn test_unbound_variable_caught_as_reference_error() {
    let program = vec![try_catch(
        vec![var("missing")],
        "e",
        vec![prop(var("e"), "name")],
    )];
    assert_eq!(run(program).unwrap(), Value::string("ReferenceError"));
}

#[test]
fn test_catch_scope_does_not_leak() {
    let program = vec![
        try_catch(vec![throw(num(1.0))], "e", vec![var("e")]),
        var("e"),
    ];
    assert_eq!(run(program).unwrap_err().kind(), ErrorKind::UnboundVariable);
}

#[test]
fn test_try_without_error_yields_block_value() {
    let program = vec![try_catch(vec![num(5.0)], "e", vec![num(0.0)])];
    assert_eq!(run(program).unwrap(), Value::Number(5.0));
}

// ============================================================================
// Sequences and methods
// ============================================================================

#[test]
fn test_map_doubles() {
    let program = vec![method(
        method(
            array_of(&[1.0, 2.0, 3.0]),
            "map",
            vec![binary(BinaryOperator::Mul, var("_"), num(2.0))],
        ),
        "toArray",
        vec![],
    )];
    assert_eq!(numbers(&run(program).unwrap()), vec![2.0, 4.0, 6.0]);
}

#[test]
fn test_where_filters() {
    let program = vec![method(
        method(
            array_of(&[1.0, 20.0, 2.0, 30.0, 3.0, 15.0]),
            "where",
            vec![binary(BinaryOperator::Lt, num(10.0), var("_"))],
        ),
        "toArray",
        vec![],
    )];
    assert_eq!(numbers(&run(program).unwrap()), vec![20.0, 30.0, 15.0]);
}

#[test]
fn test_named_callback() {
    let program = vec![method(
        method(
            array_of(&[1.0, 2.0]),
            "map",
            vec![var("x"), binary(BinaryOperator::Add, var("x"), num(1.0))],
        ),
        "toArray",
        vec![],
    )];
    assert_eq!(numbers(&run(program).unwrap()), vec![2.0, 3.0]);
}

#[test]
fn test_function_valued_callback_is_applied() {
    let program = vec![
        function(
            Some("square"),
            &["n"],
            vec![binary(BinaryOperator::Mul, var("n"), var("n"))],
        ),
        method(
            method(array_of(&[2.0, 3.0]), "map", vec![var("square")]),
            "toArray",
            vec![],
        ),
    ];
    assert_eq!(numbers(&run(program).unwrap()), vec![4.0, 9.0]);
}

#[test]
fn test_object_elements_expose_fields() {
    let program = vec![method(
        method(
            array(vec![
                object(vec![("price", num(3.0))]),
                object(vec![("price", num(4.0))]),
            ]),
            "map",
            vec![binary(BinaryOperator::Mul, var("price"), num(10.0))],
        ),
        "toArray",
        vec![],
    )];
    assert_eq!(numbers(&run(program).unwrap()), vec![30.0, 40.0]);
}

#[test]
fn test_concat_flattens_one_level() {
    let program = vec![method(
        method(
            array(vec![
                array_of(&[1.0, 2.0]),
                array_of(&[]),
                array_of(&[3.0]),
            ]),
            "concat",
            vec![],
        ),
        "toArray",
        vec![],
    )];
    assert_eq!(numbers(&run(program).unwrap()), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_take_prefix() {
    let program = vec![method(
        method(array_of(&[5.0, 6.0, 7.0]), "take", vec![num(2.0)]),
        "toArray",
        vec![],
    )];
    assert_eq!(numbers(&run(program).unwrap()), vec![5.0, 6.0]);
}

#[test]
fn test_sequence_indexing_walks_spine() {
    let mapped = method(
        array_of(&[1.0, 2.0, 3.0]),
        "map",
        vec![binary(BinaryOperator::Add, var("_"), num(100.0))],
    );
    assert_eq!(
        run(vec![index(mapped.clone(), num(2.0))]).unwrap(),
        Value::Number(103.0)
    );
    assert_eq!(
        run(vec![index(mapped, num(9.0))]).unwrap(),
        Value::Undefined
    );
}

#[test]
fn test_map_of_empty_array_is_nil() {
    let program = vec![method(array(vec![]), "map", vec![var("_")])];
    assert_eq!(run(program).unwrap(), Value::Nil);
}

#[test]
fn test_unknown_method_on_object_property() {
    // o.f(2) where o.f is a function
    let program = vec![
        declare(vec![(
            "o",
            Some(object(vec![(
                "f",
                function(None, &["n"], vec![binary(BinaryOperator::Add, var("n"), num(1.0))]),
            )])),
        )]),
        method(var("o"), "f", vec![num(2.0)]),
    ];
    assert_eq!(run(program).unwrap(), Value::Number(3.0));
}

#[test]
fn test_method_on_non_function_property_fails() {
    let program = vec![method(object(vec![("f", num(1.0))]), "f", vec![])];
    let err = run(program).unwrap_err();
    assert!(err.to_string().contains("`object.f` is not a function"));
}

// ============================================================================
// Comprehensions
// ============================================================================

#[test]
fn test_guarded_comprehension() {
    // [x * x for x in [1,2,3,4] if x > 1]
    let program = vec![method(
        comprehension(
            binary(BinaryOperator::Mul, var("x"), var("x")),
            Some("x"),
            array_of(&[1.0, 2.0, 3.0, 4.0]),
            Some(binary(BinaryOperator::Gt, var("x"), num(1.0))),
        ),
        "toArray",
        vec![],
    )];
    assert_eq!(numbers(&run(program).unwrap()), vec![4.0, 9.0, 16.0]);
}

#[test]
fn test_nested_dependent_comprehension() {
    // [x + y for x in [10, 20] for y in [x, x + 1]]
    let inner = comprehension(
        binary(BinaryOperator::Add, var("x"), var("y")),
        Some("y"),
        array(vec![var("x"), binary(BinaryOperator::Add, var("x"), num(1.0))]),
        None,
    );
    let program = vec![method(
        concat_comprehension(inner, Some("x"), array_of(&[10.0, 20.0]), None),
        "toArray",
        vec![],
    )];
    assert_eq!(numbers(&run(program).unwrap()), vec![20.0, 21.0, 40.0, 41.0]);
}
