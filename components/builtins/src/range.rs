//! `range(from, to, step = 1)`

use core_types::{EvalError, Lazy, Value};

/// Build the lazy sequence `from, from + step, ...` that continues while
/// `step * n <= step * to`.
///
/// Each cell is produced only when forced, so an unbounded range such as
/// `range(0, Infinity)` is fine as long as the consumer bounds it.
pub fn range(from: f64, to: f64, step: f64) -> Value {
    Value::Lazy(Lazy::new(move |driver, k, _ek| {
        let cell = if step * from <= step * to {
            Value::cons(Value::Number(from), range(from + step, to, step))
        } else {
            Value::Nil
        };
        driver.bounce(&k, cell)
    }))
}

/// The auto-forcing entry point bound as `range`.
pub fn range_builtin(args: &[Value]) -> Result<Value, EvalError> {
    let (from, to, step) = match args {
        [from, to] => (from.to_number()?, to.to_number()?, 1.0),
        [from, to, step] => (from.to_number()?, to.to_number()?, step.to_number()?),
        _ => {
            return Err(EvalError::type_error(format!(
                "range expects 2 or 3 arguments, got {}",
                args.len()
            )))
        }
    };
    if step == 0.0 || step.is_nan() {
        return Err(EvalError::type_error("range step must be a non-zero number"));
    }
    Ok(range(from, to, step))
}
