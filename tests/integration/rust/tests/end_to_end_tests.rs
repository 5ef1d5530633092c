//! End-to-end tests across the whole engine
//!
//! JSON AST -> evaluator -> orchestrator -> wire JSON -> decoded value.
//! Covers:
//! - `range` bounds and steps
//! - sequence methods and comprehensions
//! - laziness and memoization observed through side effects
//! - assignment order, exceptions and key escaping
//! - deep recursion

use ast::builder::*;
use ast::{AssignmentOperator, BinaryOperator, NodeRef};
use core_types::Value;
use integration_tests::{evaluate, evaluate_json, final_value, numbers};
use notebook::EvaluationEvent;
use pretty_assertions::assert_eq;
use serde_json::json;

fn range_of(args: &[f64]) -> Vec<f64> {
    let program = vec![call(var("range"), args.iter().map(|n| num(*n)).collect())];
    numbers(&final_value(&evaluate(&program)))
}

fn array_of(values: &[f64]) -> NodeRef {
    array(values.iter().map(|n| num(*n)).collect())
}

// ============================================================================
// range
// ============================================================================

#[test]
fn test_range_default_step() {
    assert_eq!(range_of(&[0.0, 5.0]), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_range_with_step() {
    assert_eq!(range_of(&[0.0, 10.0, 3.0]), vec![0.0, 3.0, 6.0, 9.0]);
}

#[test]
fn test_range_descending() {
    assert_eq!(
        range_of(&[10.0, 0.0, -2.0]),
        vec![10.0, 8.0, 6.0, 4.0, 2.0, 0.0]
    );
}

#[test]
fn test_range_empty() {
    assert!(range_of(&[1.0, 0.0]).is_empty());
}

#[test]
fn test_range_streams_before_done() {
    let events = evaluate(&[call(var("range"), vec![num(0.0), num(5.0)])]);
    let updates = events
        .iter()
        .filter(|e| matches!(e, EvaluationEvent::Update { .. }))
        .count();
    assert_eq!(updates, 6);
    assert!(matches!(events.last(), Some(EvaluationEvent::Done { .. })));
}

// ============================================================================
// Sequences and comprehensions
// ============================================================================

#[test]
fn test_one_plus_two() {
    let events = evaluate_json(
        r#"{"type":"BinaryExpression","operator":"+",
            "left":{"type":"Literal","value":1},"right":{"type":"Literal","value":2}}"#,
    );
    assert_eq!(final_value(&events), Value::Number(3.0));
}

#[test]
fn test_map_doubles() {
    let program = vec![method(
        array_of(&[1.0, 2.0, 3.0]),
        "map",
        vec![binary(BinaryOperator::Mul, var("_"), num(2.0))],
    )];
    assert_eq!(numbers(&final_value(&evaluate(&program))), vec![2.0, 4.0, 6.0]);
}

#[test]
fn test_where_filters() {
    let program = vec![method(
        array_of(&[1.0, 20.0, 2.0, 30.0, 3.0, 15.0]),
        "where",
        vec![binary(BinaryOperator::Lt, num(10.0), var("_"))],
    )];
    assert_eq!(
        numbers(&final_value(&evaluate(&program))),
        vec![20.0, 30.0, 15.0]
    );
}

#[test]
fn test_concat_flattens_one_level() {
    let program = vec![method(
        array(vec![array_of(&[1.0, 2.0]), array_of(&[]), array_of(&[3.0])]),
        "concat",
        vec![],
    )];
    assert_eq!(
        numbers(&final_value(&evaluate(&program))),
        vec![1.0, 2.0, 3.0]
    );
}

#[test]
fn test_comprehension_matches_where_then_map() {
    // [x * 2 for x in range(0, 6) if x % 2 == 0]
    let comprehended = vec![comprehension(
        binary(BinaryOperator::Mul, var("x"), num(2.0)),
        Some("x"),
        call(var("range"), vec![num(0.0), num(6.0)]),
        Some(binary(
            BinaryOperator::Eq,
            binary(BinaryOperator::Mod, var("x"), num(2.0)),
            num(0.0),
        )),
    )];
    // range(0, 6).where(_ % 2 == 0).map(_ * 2)
    let chained = vec![method(
        method(
            call(var("range"), vec![num(0.0), num(6.0)]),
            "where",
            vec![binary(
                BinaryOperator::Eq,
                binary(BinaryOperator::Mod, var("_"), num(2.0)),
                num(0.0),
            )],
        ),
        "map",
        vec![binary(BinaryOperator::Mul, var("_"), num(2.0))],
    )];

    let expected = vec![0.0, 4.0, 8.0, 12.0];
    assert_eq!(numbers(&final_value(&evaluate(&comprehended))), expected);
    assert_eq!(numbers(&final_value(&evaluate(&chained))), expected);
}

#[test]
fn test_dependent_generators() {
    // [x * 10 + y for x in range(1, 3) for y in range(x, 3)]
    let inner = comprehension(
        binary(BinaryOperator::Add, binary(BinaryOperator::Mul, var("x"), num(10.0)), var("y")),
        Some("y"),
        call(var("range"), vec![var("x"), num(3.0)]),
        None,
    );
    let program = vec![concat_comprehension(
        inner,
        Some("x"),
        call(var("range"), vec![num(1.0), num(3.0)]),
        None,
    )];
    assert_eq!(
        numbers(&final_value(&evaluate(&program))),
        vec![11.0, 12.0, 13.0, 22.0, 23.0, 33.0]
    );
}

// ============================================================================
// Laziness
// ============================================================================

fn accumulator(tail: Option<NodeRef>) -> Vec<NodeRef> {
    // var n = 0; var xs = [1,2,3].map(n += _); <tail>; n
    let mut program = vec![
        declare(vec![("n", Some(num(0.0)))]),
        declare(vec![(
            "xs",
            Some(method(
                array_of(&[1.0, 2.0, 3.0]),
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
fn test_unindexed_map_runs_nothing() {
    assert_eq!(final_value(&evaluate(&accumulator(None))), Value::Number(0.0));
}

#[test]
fn test_indexing_runs_only_what_is_needed() {
    let first = accumulator(Some(index(var("xs"), num(0.0))));
    assert_eq!(final_value(&evaluate(&first)), Value::Number(1.0));

    let third = accumulator(Some(index(var("xs"), num(2.0))));
    assert_eq!(final_value(&evaluate(&third)), Value::Number(6.0));
}

#[test]
fn test_lazy_builtin_defers_until_forced() {
    // var n = 0; var l = lazy(n = n + 1); n
    let program = vec![
        declare(vec![("n", Some(num(0.0)))]),
        declare(vec![(
            "l",
            Some(call(
                var("lazy"),
                vec![assign(var("n"), binary(BinaryOperator::Add, var("n"), num(1.0)))],
            )),
        )]),
        var("n"),
    ];
    assert_eq!(final_value(&evaluate(&program)), Value::Number(0.0));
}

// ============================================================================
// Assignment, exceptions, escaping
// ============================================================================

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
    assert_eq!(final_value(&evaluate(&program)), Value::Number(11.0));
}

#[test]
fn test_thrown_value_is_rebound_exactly() {
    // var o = {a: 1}; try { throw o } catch (e) { e == o }
    let program = vec![
        declare(vec![("o", Some(object(vec![("a", num(1.0))])))]),
        try_catch(
            vec![throw(var("o"))],
            "e",
            vec![binary(BinaryOperator::Eq, var("e"), var("o"))],
        ),
    ];
    assert_eq!(final_value(&evaluate(&program)), Value::Boolean(true));
}

#[test]
fn test_uncaught_throw_is_error_event() {
    let events = evaluate(&[throw(string("boom"))]);
    assert_eq!(events.len(), 1);
    match &events[0] {
        EvaluationEvent::Error { kind, thrown, .. } => {
            assert_eq!(kind, "UserThrown");
            assert_eq!(thrown, &Some(json!("boom")));
        }
        other => panic!("expected error, got {:?}", other),
    }
}

#[test]
fn test_reserved_keys_are_escaped_on_the_wire() {
    let program = vec![object(vec![("!", num(1.0)), ("!!!", num(2.0))])];
    let events = evaluate(&program);
    assert_eq!(
        events.last().and_then(|e| e.snapshot()),
        Some(&json!({"!!": 1, "!!!!": 2}))
    );

    let decoded = final_value(&events);
    assert_eq!(
        decoded.get_property(&Value::string("!")).unwrap(),
        Value::Number(1.0)
    );
    assert_eq!(
        decoded.get_property(&Value::string("!!!")).unwrap(),
        Value::Number(2.0)
    );
}

#[test]
fn test_table_is_tagged_on_the_wire() {
    // table(["a"], [{a: 1}])
    let program = vec![call(
        var("table"),
        vec![
            array(vec![string("a")]),
            array(vec![object(vec![("a", num(1.0))])]),
        ],
    )];
    let events = evaluate(&program);
    assert_eq!(
        events.last().and_then(|e| e.snapshot()),
        Some(&json!({"!": "table", "columns": ["a"], "data": [{"a": 1}]}))
    );
}

// ============================================================================
// Recursion
// ============================================================================

#[test]
fn test_deep_recursion_through_the_orchestrator() {
    // function down(n) { n == 0 ? 0 : 1 + down(n - 1) }; down(10000)
    let program = vec![
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
        call(var("down"), vec![num(10_000.0)]),
    ];
    assert_eq!(final_value(&evaluate(&program)), Value::Number(10_000.0));
}

// ============================================================================
// Long sequences on the wire
// ============================================================================

fn forced_range(count: f64) -> Vec<NodeRef> {
    // var s = range(1, count); s.toArray(); s
    vec![
        declare(vec![(
            "s",
            Some(call(var("range"), vec![num(1.0), num(count)])),
        )]),
        method(var("s"), "toArray", vec![]),
        var("s"),
    ]
}

#[test]
fn test_long_forced_sequence_through_the_orchestrator() {
    let events = evaluate(&forced_range(50_000.0));
    assert_eq!(events.len(), 1);
    let values = numbers(&final_value(&events));
    assert_eq!(values.len(), 50_000);
    assert_eq!(values.first(), Some(&1.0));
    assert_eq!(values.last(), Some(&50_000.0));
}

#[test]
fn test_done_snapshot_survives_wire_text() {
    let events = evaluate(&forced_range(1_000.0));
    let snapshot = events.last().and_then(|e| e.snapshot()).unwrap();
    let text = wire_codec::write(snapshot).unwrap();
    let values = numbers(&wire_codec::from_str(&text).unwrap());
    assert_eq!(values, (1..=1_000).map(f64::from).collect::<Vec<_>>());
}
