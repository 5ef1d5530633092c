//! The lifted value model.
//!
//! [`Value`] is a closed union over every runtime value. This module holds the
//! capabilities that need no evaluation: truthiness, coercions, property
//! access, operators and equality. Invocation and method dispatch live in the
//! interpreter because they evaluate code.

use crate::function::{BuiltinFunction, UserFunction};
use crate::{EvalError, Lazy};
use ast::BinaryOperator;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// How many slots one index assignment may add to an array
const MAX_ARRAY_GROWTH: usize = 1 << 16;

/// Shared, mutable object storage
pub type ObjectRef = Rc<RefCell<HashMap<String, Value>>>;

/// Shared, mutable array storage
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// A cons cell. The head may be unforced; the tail is a sequence or a lazy
/// producing one.
#[derive(Debug, Clone, PartialEq)]
pub struct Cons {
    /// First element
    pub head: Value,
    /// Rest of the sequence
    pub tail: Value,
}

/// A chain of cells drops one cell per level.
impl Drop for Cons {
    fn drop(&mut self) {
        let tail = std::mem::replace(&mut self.tail, Value::Nil);
        crate::ensure_sufficient_stack(move || drop(tail));
    }
}

/// Tabular data: column names plus one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column names
    pub columns: Vec<String>,
    /// Rows
    pub data: Vec<Value>,
}

/// A runtime value.
///
/// # Examples
///
/// ```
/// use ast::BinaryOperator;
/// use core_types::Value;
///
/// let sum = Value::Number(1.0).binary(BinaryOperator::Add, &Value::Number(2.0)).unwrap();
/// assert_eq!(sum, Value::Number(3.0));
///
/// let text = Value::string("n=").binary(BinaryOperator::Add, &Value::Number(3.0)).unwrap();
/// assert_eq!(text.to_string(), "n=3");
/// ```
#[derive(Clone)]
pub enum Value {
    /// The undefined singleton
    Undefined,
    /// Boolean
    Boolean(bool),
    /// IEEE-754 double
    Number(f64),
    /// Immutable string
    String(Rc<str>),
    /// Key/value mapping
    Object(ObjectRef),
    /// Dense array
    Array(ArrayRef),
    /// Closure over an environment
    UserFunction(Rc<UserFunction>),
    /// Host function
    Builtin(Rc<BuiltinFunction>),
    /// Deferred computation
    Lazy(Lazy),
    /// Empty sequence
    Nil,
    /// Non-empty sequence
    Cons(Rc<Cons>),
    /// Table
    Table(Rc<Table>),
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }

    /// Create an object value.
    pub fn object(fields: HashMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(fields)))
    }

    /// Create an array value.
    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    /// Create a cons cell.
    pub fn cons(head: Value, tail: Value) -> Value {
        Value::Cons(Rc::new(Cons { head, tail }))
    }

    /// Create a table.
    pub fn table(columns: Vec<String>, data: Vec<Value>) -> Value {
        Value::Table(Rc::new(Table { columns, data }))
    }

    /// Build an eager `Cons`/`Nil` sequence from a list of values.
    pub fn sequence(elements: Vec<Value>) -> Value {
        elements
            .into_iter()
            .rev()
            .fold(Value::Nil, |tail, head| Value::cons(head, tail))
    }

    /// The variant name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::UserFunction(_) | Value::Builtin(_) => "function",
            Value::Lazy(_) => "lazy",
            Value::Nil => "nil",
            Value::Cons(_) => "cons",
            Value::Table(_) => "table",
        }
    }

    /// Returns true for `Nil` and `Cons`.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Nil | Value::Cons(_))
    }

    /// Returns true for user functions and builtins.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::UserFunction(_) | Value::Builtin(_))
    }

    /// Truthiness of a forced value.
    pub fn is_truthy(&self) -> Result<bool, EvalError> {
        Ok(match self {
            Value::Undefined | Value::Nil => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Lazy(lazy) => match lazy.outcome() {
                Some(Ok(value)) => return value.is_truthy(),
                _ => return Err(EvalError::not_a("lazy", "boolean")),
            },
            _ => true,
        })
    }

    /// Numeric coercion.
    pub fn to_number(&self) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| EvalError::not_a("string", "number")),
            other => Err(EvalError::not_a(other.type_name(), "number")),
        }
    }

    /// Interpret this value as a property key.
    pub fn to_key(&self) -> String {
        self.to_string()
    }

    /// Interpret this value as an array index, if it is a non-negative
    /// integer (or a string spelling one).
    pub fn as_index(&self) -> Option<usize> {
        let n = match self {
            Value::Number(n) => *n,
            Value::String(s) => s.parse::<f64>().ok()?,
            _ => return None,
        };
        if n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64 {
            Some(n as usize)
        } else {
            None
        }
    }

    /// Read a property of a forced value.
    pub fn get_property(&self, key: &Value) -> Result<Value, EvalError> {
        match self {
            Value::Object(fields) => Ok(fields
                .borrow()
                .get(&key.to_key())
                .cloned()
                .unwrap_or(Value::Undefined)),
            Value::Array(elements) => {
                let elements = elements.borrow();
                if let Some(index) = key.as_index() {
                    return Ok(elements.get(index).cloned().unwrap_or(Value::Undefined));
                }
                match key.to_key().as_str() {
                    "length" => Ok(Value::Number(elements.len() as f64)),
                    _ => Ok(Value::Undefined),
                }
            }
            Value::String(s) => match key.to_key().as_str() {
                "length" => Ok(Value::Number(s.chars().count() as f64)),
                _ => Ok(Value::Undefined),
            },
            Value::Cons(cell) => match key.to_key().as_str() {
                "head" => Ok(cell.head.clone()),
                "tail" => Ok(cell.tail.clone()),
                _ => Ok(Value::Undefined),
            },
            Value::Table(table) => match key.to_key().as_str() {
                "columns" => Ok(Value::array(
                    table.columns.iter().map(|c| Value::string(c.as_str())).collect(),
                )),
                "data" => Ok(Value::array(table.data.clone())),
                "length" => Ok(Value::Number(table.data.len() as f64)),
                _ => Ok(Value::Undefined),
            },
            other => Err(EvalError::not_a(other.type_name(), "object")),
        }
    }

    /// Write a property of a forced value.
    pub fn set_property(&self, key: &Value, value: Value) -> Result<(), EvalError> {
        match self {
            Value::Object(fields) => {
                fields.borrow_mut().insert(key.to_key(), value);
                Ok(())
            }
            Value::Array(elements) => {
                let index = key
                    .as_index()
                    .ok_or_else(|| EvalError::type_error(format!("`{}` is not an array index", key)))?;
                let mut elements = elements.borrow_mut();
                if index >= elements.len() {
                    let len = index
                        .checked_add(1)
                        .filter(|len| len - elements.len() <= MAX_ARRAY_GROWTH)
                        .ok_or_else(|| {
                            EvalError::type_error(format!(
                                "index {} is too far past the end of an array of length {}",
                                index,
                                elements.len()
                            ))
                        })?;
                    elements.resize(len, Value::Undefined);
                }
                elements[index] = value;
                Ok(())
            }
            other => Err(EvalError::not_a(other.type_name(), "object")),
        }
    }

    /// Apply a binary operator with `self` as the left operand.
    ///
    /// Both operands must already be forced.
    pub fn binary(&self, op: BinaryOperator, rhs: &Value) -> Result<Value, EvalError> {
        use BinaryOperator::*;
        match op {
            Eq => return Ok(Value::Boolean(self.strict_equals(rhs))),
            NotEq => return Ok(Value::Boolean(!self.strict_equals(rhs))),
            And => return Ok(Value::Boolean(self.is_truthy()? && rhs.is_truthy()?)),
            Or => return Ok(Value::Boolean(self.is_truthy()? || rhs.is_truthy()?)),
            _ => {}
        }

        if op == Add && (matches!(self, Value::String(_)) || matches!(rhs, Value::String(_))) {
            return Ok(Value::string(format!("{}{}", self, rhs)));
        }

        match self {
            Value::Number(l) => {
                let r = rhs.to_number()?;
                Ok(match op {
                    Add => Value::Number(l + r),
                    Sub => Value::Number(l - r),
                    Mul => Value::Number(l * r),
                    Div => Value::Number(l / r),
                    Mod => Value::Number(l % r),
                    _ => Value::Boolean(compare(op, l, &r)),
                })
            }
            Value::String(l) if op.is_ordering() => match rhs {
                Value::String(r) => Ok(Value::Boolean(compare(op, l.as_ref(), r.as_ref()))),
                other => Err(EvalError::not_a(other.type_name(), "string")),
            },
            other if op == Add => Err(EvalError::unsupported(other.type_name(), "+")),
            other => Err(EvalError::not_a(other.type_name(), "number")),
        }
    }

    /// Strict equality: structural for primitives, identity for references.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::UserFunction(a), Value::UserFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Lazy(a), Value::Lazy(b)) => a.ptr_eq(b),
            (Value::Cons(a), Value::Cons(b)) => Rc::ptr_eq(a, b),
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn compare<T: PartialOrd + ?Sized>(op: BinaryOperator, l: &T, r: &T) -> bool {
    match op {
        BinaryOperator::Lt => l < r,
        BinaryOperator::LtEq => l <= r,
        BinaryOperator::Gt => l > r,
        BinaryOperator::GtEq => l >= r,
        _ => false,
    }
}

/// Format a number the way the language prints it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Array(elements) => {
                let parts: Vec<String> = elements.borrow().iter().map(|e| e.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Value::UserFunction(func) => {
                write!(f, "function {}", func.name.as_deref().unwrap_or("anonymous"))
            }
            Value::Builtin(func) => write!(f, "function {}", func.name),
            Value::Lazy(lazy) => match lazy.outcome() {
                Some(Ok(value)) => write!(f, "{}", value),
                _ => write!(f, "[lazy]"),
            },
            Value::Nil => write!(f, "nil"),
            Value::Cons(_) => write!(f, "[sequence]"),
            Value::Table(table) => write!(f, "[table {}]", table.columns.join(",")),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Number(n) => write!(f, "Number({})", format_number(*n)),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Object(fields) => f.debug_map().entries(fields.borrow().iter()).finish(),
            Value::Array(elements) => f.debug_list().entries(elements.borrow().iter()).finish(),
            Value::UserFunction(func) => write!(f, "UserFunction({:?})", func.name),
            Value::Builtin(func) => write!(f, "Builtin({})", func.name),
            Value::Lazy(lazy) => write!(f, "{:?}", lazy),
            Value::Nil => write!(f, "Nil"),
            Value::Cons(cell) => f
                .debug_struct("Cons")
                .field("head", &cell.head)
                .field("tail", &cell.tail)
                .finish(),
            Value::Table(table) => write!(f, "{:?}", table),
        }
    }
}

/// Structural comparison for tests and diagnostics. Functions and lazies
/// compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Cons(a), Value::Cons(b)) => Rc::ptr_eq(a, b) || **a == **b,
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b) || **a == **b,
            _ => self.strict_equals(other),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}
