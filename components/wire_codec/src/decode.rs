//! Wire JSON to value.

use core_types::{ensure_sufficient_stack, BuiltinFunction, EvalError, Lazy, Value};
use serde::Deserialize;
use serde_json::Map;
use std::collections::HashMap;

use crate::escape::{longest_escape_first, unescape_key, TAG};

/// Parse and decode wire text.
///
/// Parsing has no nesting limit: a sequence nests one level per cell, so a
/// snapshot is as deep as the longest sequence it holds.
pub fn from_str(text: &str) -> Result<Value, EvalError> {
    let unparseable = |e: serde_json::Error| {
        EvalError::malformed(format!("unparseable wire text: {}", e))
    };
    let mut parser = serde_json::Deserializer::from_str(text);
    parser.disable_recursion_limit();
    let json = serde_json::Value::deserialize(serde_stacker::Deserializer::new(&mut parser))
        .map_err(unparseable)?;
    let decoded = parser.end().map_err(unparseable).and_then(|()| decode(&json));
    crate::tree::release(json);
    decoded
}

/// Decode wire JSON.
///
/// Lazy stubs decode to lazies that fail when forced, and functions to
/// builtins that fail when called: neither can be resumed in this process.
pub fn decode(json: &serde_json::Value) -> Result<Value, EvalError> {
    ensure_sufficient_stack(|| decode_value(json))
}

fn decode_value(json: &serde_json::Value) -> Result<Value, EvalError> {
    Ok(match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(
            n.as_f64()
                .ok_or_else(|| EvalError::malformed(format!("unrepresentable number {}", n)))?,
        ),
        serde_json::Value::String(s) => Value::string(s.as_str()),
        serde_json::Value::Array(elements) => Value::array(
            elements
                .iter()
                .map(decode)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        serde_json::Value::Object(map) => match map.get(TAG) {
            Some(tag) => decode_tagged(tag, map)?,
            None => decode_object(map)?,
        },
    })
}

/// Decode a run of nested `cons` stubs in a loop, then link the cells from
/// the end.
fn decode_spine(map: &Map<String, serde_json::Value>) -> Result<Value, EvalError> {
    let mut heads = Vec::new();
    let mut cell = map;
    let end = loop {
        heads.push(decode(field(cell, "cons", "head")?)?);
        let tail = field(cell, "cons", "tail")?;
        match tail.as_object() {
            Some(next) if next.get(TAG).and_then(serde_json::Value::as_str) == Some("cons") => {
                cell = next
            }
            _ => break decode(tail)?,
        }
    };
    Ok(heads
        .into_iter()
        .rev()
        .fold(end, |tail, head| Value::cons(head, tail)))
}

fn decode_object(map: &Map<String, serde_json::Value>) -> Result<Value, EvalError> {
    let mut fields = HashMap::with_capacity(map.len());
    for key in longest_escape_first(map.keys()) {
        if let (Some(name), Some(field)) = (unescape_key(key), map.get(key)) {
            fields.insert(name, decode(field)?);
        }
    }
    Ok(Value::object(fields))
}

fn field<'a>(
    map: &'a Map<String, serde_json::Value>,
    tag: &str,
    name: &str,
) -> Result<&'a serde_json::Value, EvalError> {
    map.get(name)
        .ok_or_else(|| EvalError::malformed(format!("`{}` stub is missing `{}`", tag, name)))
}

fn decode_tagged(
    tag: &serde_json::Value,
    map: &Map<String, serde_json::Value>,
) -> Result<Value, EvalError> {
    let tag = tag
        .as_str()
        .ok_or_else(|| EvalError::malformed(format!("tag must be a string, found {}", tag)))?;
    match tag {
        "undefined" => Ok(Value::Undefined),
        "lazy" => {
            field(map, tag, "id")?
                .as_u64()
                .ok_or_else(|| EvalError::malformed("lazy id must be a non-negative integer"))?;
            Ok(Value::Lazy(foreign_lazy()))
        }
        "cons" => decode_spine(map),
        "table" => {
            let columns = field(map, tag, "columns")?
                .as_array()
                .ok_or_else(|| EvalError::malformed("table columns must be an array"))?
                .iter()
                .map(|column| {
                    column
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| EvalError::malformed("table columns must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let data = field(map, tag, "data")?
                .as_array()
                .ok_or_else(|| EvalError::malformed("table data must be an array"))?
                .iter()
                .map(decode)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::table(columns, data))
        }
        "function" => {
            let name = match field(map, tag, "name")? {
                serde_json::Value::String(name) => name.clone(),
                serde_json::Value::Null => "anonymous".to_string(),
                other => {
                    return Err(EvalError::malformed(format!(
                        "function name must be a string, found {}",
                        other
                    )))
                }
            };
            Ok(BuiltinFunction::forcing(name, |_| {
                Err(EvalError::type_error("cannot call a foreign function"))
            }))
        }
        "number" => match field(map, tag, "value")?.as_str() {
            Some("NaN") => Ok(Value::Number(f64::NAN)),
            Some("Infinity") => Ok(Value::Number(f64::INFINITY)),
            Some("-Infinity") => Ok(Value::Number(f64::NEG_INFINITY)),
            _ => Err(EvalError::malformed("number stub must spell NaN or an infinity")),
        },
        other => Err(EvalError::malformed(format!("unknown tag `{}`", other))),
    }
}

fn foreign_lazy() -> Lazy {
    Lazy::new(|driver, _k, ek| {
        driver.fail(&ek, EvalError::type_error("cannot resume a foreign lazy"))
    })
}
