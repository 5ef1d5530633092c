//! Contract tests for table

use super::run;
use ast::builder::*;
use ast::BinaryOperator;
use core_types::Value;
use pretty_assertions::assert_eq;

fn sample() -> ast::NodeRef {
    call(
        var("table"),
        vec![
            array(vec![string("name"), string("qty")]),
            array(vec![
                object(vec![("name", string("bolt")), ("qty", num(4.0))]),
                object(vec![("name", string("nut")), ("qty", num(12.0))]),
            ]),
        ],
    )
}

#[test]
fn test_table_holds_columns_and_rows() {
    match run(vec![sample()]).unwrap() {
        Value::Table(table) => {
            assert_eq!(table.columns, vec!["name".to_string(), "qty".to_string()]);
            assert_eq!(table.data.len(), 2);
        }
        other => panic!("expected table, got {:?}", other),
    }
}

#[test]
fn test_table_length_property() {
    assert_eq!(
        run(vec![prop(sample(), "length")]).unwrap(),
        Value::Number(2.0)
    );
}

#[test]
fn test_table_rows_from_sequence() {
    let rows = method(
        call(var("range"), vec![num(1.0), num(3.0)]),
        "map",
        vec![object(vec![("n", var("_"))])],
    );
    let program = vec![prop(
        call(var("table"), vec![array(vec![string("n")]), rows]),
        "length",
    )];
    assert_eq!(run(program).unwrap(), Value::Number(3.0));
}

#[test]
fn test_table_is_a_sequence_of_rows() {
    let program = vec![method(
        method(
            sample(),
            "where",
            vec![binary(BinaryOperator::Gt, var("qty"), num(5.0))],
        ),
        "toArray",
        vec![],
    )];
    match run(program).unwrap() {
        Value::Array(rows) => {
            assert_eq!(rows.borrow().len(), 1);
            let row = rows.borrow()[0].clone();
            assert_eq!(
                row.get_property(&Value::string("name")).unwrap(),
                Value::string("nut")
            );
        }
        other => panic!("expected array, got {:?}", other),
    }
}

#[test]
fn test_column_names_must_be_strings() {
    let program = vec![call(var("table"), vec![array(vec![num(1.0)]), array(vec![])])];
    assert!(run(program).unwrap_err().to_string().contains("column names"));
}
