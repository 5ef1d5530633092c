//! Synchronous entry point for evaluating a program.
//!
//! The VM wraps a program in a top-level lazy, forces it on a fresh driver and
//! pumps the event loop until no asynchronous work remains.

use ast::NodeRef;
use core_types::{cont, err_cont, Env, EvalError, Lazy, Step, Trampoline, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

use crate::dispatch::program_lazy;

/// Evaluates programs against one global environment.
#[derive(Clone)]
pub struct VM {
    trampoline: Trampoline,
    env: Env,
}

impl VM {
    /// Create a VM over `env` with its own event loop.
    pub fn new(env: Env) -> Self {
        Self::with_trampoline(Trampoline::default(), env)
    }

    /// Create a VM over `env` that resumes asynchronous work on
    /// `trampoline`'s event loop.
    pub fn with_trampoline(trampoline: Trampoline, env: Env) -> Self {
        VM { trampoline, env }
    }

    /// The trampoline evaluation runs on.
    pub fn trampoline(&self) -> &Trampoline {
        &self.trampoline
    }

    /// The global environment programs are evaluated in.
    pub fn global_env(&self) -> &Env {
        &self.env
    }

    /// Wrap `program` as a lazy without forcing it.
    pub fn prepare(&self, program: &[NodeRef]) -> Lazy {
        program_lazy(program.into(), self.env.clone())
    }

    /// Evaluate `program` to a forced value.
    ///
    /// The top-level result is forced; values nested inside it (sequence
    /// tails, array elements) may still be lazy.
    pub fn execute(&self, program: &[NodeRef]) -> Result<Value, EvalError> {
        let lazy = self.prepare(program);
        let outcome: Rc<RefCell<Option<Result<Value, EvalError>>>> = Rc::new(RefCell::new(None));

        let on_value = {
            let outcome = outcome.clone();
            cont(move |_, value| {
                *outcome.borrow_mut() = Some(Ok(value));
                Step::done()
            })
        };
        let on_error = {
            let outcome = outcome.clone();
            err_cont(move |_, error| {
                *outcome.borrow_mut() = Some(Err(error));
                Step::done()
            })
        };

        let fault = on_error.clone();
        self.trampoline
            .drive(move |d| lazy.force(d, on_value, on_error), &fault);
        let turns = self.trampoline.event_loop().run_until_done();
        debug!(turns, "event loop drained");

        let result = outcome.borrow_mut().take();
        result.unwrap_or_else(|| {
            Err(EvalError::integrity(
                "evaluation suspended with no pending host work",
            ))
        })
    }
}

impl std::fmt::Debug for VM {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VM")
            .field("env_depth", &self.env.depth())
            .finish()
    }
}
