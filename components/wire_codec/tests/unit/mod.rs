//! Unit tests for the wire codec

use core_types::{cont, err_cont, Lazy, Step, Trampoline, Value};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wire_codec::{decode, encode, from_str, to_string};

fn object(pairs: &[(&str, Value)]) -> Value {
    Value::object(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<HashMap<_, _>>(),
    )
}

// ============================================================================
// Key escaping
// ============================================================================

#[test]
fn test_reserved_keys_escape_on_the_wire() {
    let value = object(&[("!", Value::Number(1.0)), ("!!!", Value::Number(2.0))]);
    assert_eq!(encode(&value).unwrap(), json!({"!!": 1, "!!!!": 2}));
}

#[test]
fn test_reserved_keys_unescape_on_decode() {
    let decoded = decode(&json!({"!!": 1, "!!!!": 2})).unwrap();
    assert_eq!(
        decoded,
        object(&[("!", Value::Number(1.0)), ("!!!", Value::Number(2.0))])
    );
}

#[test]
fn test_ordinary_keys_pass_through() {
    let value = object(&[("a!", Value::Boolean(true)), ("", Value::Nil)]);
    assert_eq!(encode(&value).unwrap(), json!({"a!": true, "": null}));
}

// ============================================================================
// Structural values
// ============================================================================

#[test]
fn test_sequence_encoding() {
    let seq = Value::sequence(vec![Value::Number(1.0), Value::string("two")]);
    assert_eq!(
        encode(&seq).unwrap(),
        json!({"!": "cons", "head": 1, "tail": {"!": "cons", "head": "two", "tail": null}})
    );
}

#[test]
fn test_table_round_trip() {
    let table = Value::table(
        vec!["a".to_string()],
        vec![object(&[("a", Value::Number(1.5))])],
    );
    let wire = encode(&table).unwrap();
    assert_eq!(
        wire,
        json!({"!": "table", "columns": ["a"], "data": [{"a": 1.5}]})
    );
    assert_eq!(decode(&wire).unwrap(), table);
}

#[test]
fn test_undefined_round_trip() {
    let wire = to_string(&Value::Undefined).unwrap();
    assert_eq!(from_str(&wire).unwrap(), Value::Undefined);
}

#[test]
fn test_user_keys_named_like_payload_fields() {
    let value = object(&[("head", Value::Number(1.0)), ("id", Value::Number(2.0))]);
    assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
}

// ============================================================================
// Foreign values
// ============================================================================

fn force(value: Value) -> Result<Value, core_types::EvalError> {
    let lazy = match value {
        Value::Lazy(lazy) => lazy,
        other => panic!("expected lazy, got {:?}", other),
    };
    let outcome = Rc::new(RefCell::new(None));
    let ok = outcome.clone();
    let failed = outcome.clone();
    let trampoline = Trampoline::default();
    let driver = trampoline.driver();
    let step = lazy.force(
        &driver,
        cont(move |_, v| {
            *ok.borrow_mut() = Some(Ok(v));
            Step::done()
        }),
        err_cont(move |_, e| {
            *failed.borrow_mut() = Some(Err(e));
            Step::done()
        }),
    );
    driver.run(step).unwrap();
    let result = outcome.borrow_mut().take();
    result.unwrap()
}

#[test]
fn test_decoded_lazy_cannot_be_resumed() {
    let decoded = decode(&json!({"!": "lazy", "id": 3})).unwrap();
    let err = force(decoded).unwrap_err();
    assert!(err.to_string().contains("cannot resume a foreign lazy"));
}

#[test]
fn test_in_flight_lazy_does_not_survive_the_wire() {
    let live = Value::Lazy(Lazy::new(|d, k, _| d.bounce(&k, Value::Number(1.0))));
    let decoded = decode(&encode(&live).unwrap()).unwrap();
    assert!(force(decoded).is_err());
    assert_eq!(force(live).unwrap(), Value::Number(1.0));
}

#[test]
fn test_decoded_function_fails_when_called() {
    let decoded = decode(&json!({"!": "function", "name": "fetch"})).unwrap();
    match decoded {
        Value::Builtin(builtin) => {
            assert_eq!(builtin.name, "fetch");
            match &builtin.kind {
                core_types::BuiltinKind::Forcing(f) => {
                    let err = f(&[]).unwrap_err();
                    assert!(err.to_string().contains("cannot call a foreign function"));
                }
                _ => panic!("expected a forcing builtin"),
            }
        }
        other => panic!("expected builtin, got {:?}", other),
    }
}
