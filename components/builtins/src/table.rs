//! `table(columns, rows)`

use ast::NodeRef;
use core_types::{cont, Cont, Driver, Env, ErrCont, EvalError, Step, Value};
use interpreter::dispatch::{evaluate_list, force_all, values_cont};
use interpreter::sequence::to_array;
use std::rc::Rc;

/// The deferred entry point bound as `table`.
///
/// `columns` must be an array of strings. `rows` may be an array, a table or
/// a sequence; a sequence has its spine forced, the rows themselves stay as
/// they are.
pub fn table_builtin(driver: &Driver, args: &[NodeRef], env: &Env, k: Cont, ek: ErrCont) -> Step {
    if args.len() != 2 {
        return driver.fail(
            &ek,
            EvalError::type_error(format!("table expects 2 arguments, got {}", args.len())),
        );
    }
    let ek2 = ek.clone();
    evaluate_list(
        driver,
        Rc::from(args),
        env,
        true,
        values_cont(move |d, values| {
            let mut values = values.into_iter();
            let (columns, rows) = match (values.next(), values.next()) {
                (Some(columns), Some(rows)) => (columns, rows),
                _ => return d.fail(&ek2, EvalError::integrity("table arguments went missing")),
            };
            let k = k.clone();
            let ek3 = ek2.clone();
            column_names(
                d,
                columns,
                cont(move |d, columns| {
                    let names = match names_of(&columns) {
                        Ok(names) => names,
                        Err(error) => return d.fail(&ek3, error),
                    };
                    let k = k.clone();
                    let ek4 = ek3.clone();
                    to_array(
                        d,
                        rows.clone(),
                        cont(move |d, rows| match rows {
                            Value::Array(rows) => {
                                let data = rows.borrow().clone();
                                d.bounce(&k, Value::table(names.clone(), data))
                            }
                            other => d.fail(&ek4, EvalError::not_a(other.type_name(), "array")),
                        }),
                        ek3.clone(),
                    )
                }),
                ek2.clone(),
            )
        }),
        ek,
    )
}

/// Force every column name, handing back an array of forced values.
fn column_names(driver: &Driver, columns: Value, k: Cont, ek: ErrCont) -> Step {
    let elements = match &columns {
        Value::Array(elements) => elements.borrow().clone(),
        other => return driver.fail(&ek, EvalError::not_a(other.type_name(), "array")),
    };
    force_all(
        driver,
        elements,
        values_cont(move |d, names| d.bounce(&k, Value::array(names))),
        ek,
    )
}

fn names_of(columns: &Value) -> Result<Vec<String>, EvalError> {
    match columns {
        Value::Array(elements) => elements
            .borrow()
            .iter()
            .map(|name| match name {
                Value::String(s) => Ok(s.to_string()),
                other => Err(EvalError::type_error(format!(
                    "column names must be strings, found {}",
                    other.type_name()
                ))),
            })
            .collect(),
        other => Err(EvalError::not_a(other.type_name(), "array")),
    }
}
