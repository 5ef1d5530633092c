//! Value to wire JSON.

use core_types::{ensure_sufficient_stack, EvalError, Lazy, Value};
use serde_json::{json, Map, Number};
use std::rc::Rc;

use crate::escape::{escape_key, TAG};

/// Largest integer a double holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Assigns ids to lazies that have no value yet.
pub trait StubSink {
    /// Record `lazy` and return the id its stub carries.
    fn stub(&mut self, lazy: &Lazy) -> u64;
}

/// A sink that only numbers stubs from zero.
#[derive(Debug, Default)]
pub struct Numbering {
    next: u64,
}

impl StubSink for Numbering {
    fn stub(&mut self, _lazy: &Lazy) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Encode `value`, numbering any unsettled lazies from zero.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use serde_json::json;
///
/// let value = Value::array(vec![Value::Number(1.0), Value::Undefined, Value::Nil]);
/// assert_eq!(
///     wire_codec::encode(&value).unwrap(),
///     json!([1, {"!": "undefined"}, null])
/// );
/// ```
pub fn encode(value: &Value) -> Result<serde_json::Value, EvalError> {
    encode_with(value, &mut Numbering::default())
}

/// Encode `value`, asking `sink` for each stub id.
pub fn encode_with(value: &Value, sink: &mut dyn StubSink) -> Result<serde_json::Value, EvalError> {
    Encoder {
        sink,
        path: Vec::new(),
    }
    .encode(value)
}

/// Encode to a JSON string.
pub fn to_string(value: &Value) -> Result<String, EvalError> {
    let json = encode(value)?;
    let text = crate::tree::write(&json);
    crate::tree::release(json);
    text
}

fn tagged(tag: &str) -> Map<String, serde_json::Value> {
    let mut map = Map::new();
    map.insert(TAG.to_string(), json!(tag));
    map
}

/// Wire form of a number.
pub fn encode_number(n: f64) -> serde_json::Value {
    if n.is_nan() || n.is_infinite() {
        let spelled = if n.is_nan() {
            "NaN"
        } else if n > 0.0 {
            "Infinity"
        } else {
            "-Infinity"
        };
        let mut map = tagged("number");
        map.insert("value".to_string(), json!(spelled));
        return serde_json::Value::Object(map);
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return json!(n as i64);
    }
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

struct Encoder<'a> {
    sink: &'a mut dyn StubSink,
    /// Reference values on the current path, for cycle detection
    path: Vec<*const ()>,
}

impl Encoder<'_> {
    fn encode(&mut self, value: &Value) -> Result<serde_json::Value, EvalError> {
        ensure_sufficient_stack(|| self.encode_value(value))
    }

    fn encode_value(&mut self, value: &Value) -> Result<serde_json::Value, EvalError> {
        Ok(match value {
            Value::Undefined => serde_json::Value::Object(tagged("undefined")),
            Value::Nil => serde_json::Value::Null,
            Value::Boolean(b) => json!(b),
            Value::Number(n) => encode_number(*n),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Object(fields) => {
                self.enter(Rc::as_ptr(fields) as *const ())?;
                let mut map = Map::new();
                for (key, field) in fields.borrow().iter() {
                    map.insert(escape_key(key), self.encode(field)?);
                }
                self.path.pop();
                serde_json::Value::Object(map)
            }
            Value::Array(elements) => {
                self.enter(Rc::as_ptr(elements) as *const ())?;
                let encoded = elements
                    .borrow()
                    .iter()
                    .map(|element| self.encode(element))
                    .collect::<Result<Vec<_>, _>>()?;
                self.path.pop();
                serde_json::Value::Array(encoded)
            }
            Value::UserFunction(function) => {
                let mut map = tagged("function");
                map.insert("name".to_string(), json!(function.name));
                serde_json::Value::Object(map)
            }
            Value::Builtin(builtin) => {
                let mut map = tagged("function");
                map.insert("name".to_string(), json!(builtin.name));
                serde_json::Value::Object(map)
            }
            Value::Lazy(lazy) => match lazy.outcome() {
                Some(Ok(forced)) => self.encode(&forced)?,
                _ => {
                    let mut map = tagged("lazy");
                    map.insert("id".to_string(), json!(self.sink.stub(lazy)));
                    serde_json::Value::Object(map)
                }
            },
            Value::Cons(_) => self.encode_spine(value)?,
            Value::Table(table) => {
                let mut map = tagged("table");
                map.insert("columns".to_string(), json!(table.columns));
                let data = table
                    .data
                    .iter()
                    .map(|row| self.encode(row))
                    .collect::<Result<Vec<_>, _>>()?;
                map.insert("data".to_string(), serde_json::Value::Array(data));
                serde_json::Value::Object(map)
            }
        })
    }

    /// Walk a sequence spine in a loop, through forced lazies, then nest the
    /// encoded cells from the end.
    fn encode_spine(&mut self, value: &Value) -> Result<serde_json::Value, EvalError> {
        let mut heads = Vec::new();
        let mut cursor = value.clone();
        let end = loop {
            let next = match &cursor {
                Value::Cons(cell) => {
                    heads.push(self.encode(&cell.head)?);
                    cell.tail.clone()
                }
                Value::Lazy(lazy) => match lazy.outcome() {
                    Some(Ok(forced)) => forced,
                    _ => break self.encode(&cursor)?,
                },
                _ => break self.encode(&cursor)?,
            };
            cursor = next;
        };
        Ok(heads.into_iter().rev().fold(end, |tail, head| {
            let mut map = tagged("cons");
            map.insert("head".to_string(), head);
            map.insert("tail".to_string(), tail);
            serde_json::Value::Object(map)
        }))
    }

    fn enter(&mut self, ptr: *const ()) -> Result<(), EvalError> {
        if self.path.contains(&ptr) {
            return Err(EvalError::type_error("cannot encode a cyclic value"));
        }
        self.path.push(ptr);
        Ok(())
    }
}
