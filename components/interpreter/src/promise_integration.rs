//! Promise integration between async_runtime and the interpreter
//!
//! This is the one asynchronous boundary of evaluation. An asynchronous
//! builtin hands back a [`Promise`]; the current drive loop unwinds, and when
//! the promise settles a microtask on the event loop resumes the continuation
//! on a fresh driver.

use async_runtime::{MicroTask, Promise};
use core_types::{Cont, Driver, ErrCont, EvalError, Step, Value};
use tracing::debug;

/// Suspend until `promise` settles, then resume `k` or `ek` from the host
/// event loop.
pub fn await_promise(
    driver: &Driver,
    name: &str,
    promise: Promise<Value, EvalError>,
    k: Cont,
    ek: ErrCont,
) -> Step {
    let trampoline = driver.trampoline().clone();
    let event_loop = driver.event_loop().clone();
    let name = name.to_string();
    debug!(token = driver.token(), builtin = %name, "suspended on async builtin");

    promise.then(move |outcome| {
        event_loop.enqueue_microtask(MicroTask::new(move || {
            let on_fault = ek.clone();
            trampoline.drive(
                move |d| {
                    debug!(token = d.token(), builtin = %name, ok = outcome.is_ok(), "resuming");
                    match outcome {
                        Ok(value) => d.bounce(&k, value),
                        Err(error) => d.fail(&ek, error),
                    }
                },
                &on_fault,
            );
        }));
    });
    Step::done()
}
