//! Runtime orchestration for the CLI
//!
//! One `Runtime` holds a base environment and a trampoline shared by every
//! program it runs, so declarations made by one program are visible to the
//! next, the way notebook cells share bindings. Each program gets its own
//! [`Evaluation`] and result slot.

use crate::error::{CliError, CliResult};
use async_runtime::{EventLoop, Promise, Task};
use builtins::{new_base_environment, HostCapabilities};
use core_types::{with_stack_for_depth, Env, EvalError, Trampoline, Value};
use notebook::{Evaluation, EvaluationEvent, Phase, RecordingObserver};
use std::rc::Rc;
use tracing::debug;

/// Runs JSON AST programs and collects their events
pub struct Runtime {
    /// Pretty-print rendered events
    pretty: bool,
    /// Prefix for generated slot names
    slot_prefix: String,
    /// Programs run so far
    executed: usize,
    env: Env,
    trampoline: Trampoline,
}

impl Runtime {
    /// Create a runtime with the CLI's host capabilities.
    ///
    /// # Example
    /// ```
    /// use engine_cli::Runtime;
    ///
    /// let mut runtime = Runtime::new();
    /// let events = runtime.execute_string(r#"{"type":"Literal","value":42}"#).unwrap();
    /// assert_eq!(runtime.render(&events[0]).unwrap(), r#"{"event":"done","slot":"out-1","snapshot":42}"#);
    /// ```
    pub fn new() -> Self {
        let trampoline = Trampoline::default();
        let host = host_capabilities(trampoline.event_loop());
        Self::with_host(trampoline, host)
    }

    /// Create a runtime with caller-supplied host capabilities.
    pub fn with_host(trampoline: Trampoline, host: HostCapabilities) -> Self {
        Self {
            pretty: false,
            slot_prefix: "out".to_string(),
            executed: 0,
            env: new_base_environment(host),
            trampoline,
        }
    }

    /// Pretty-print rendered events
    pub fn with_pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    /// Name result slots `<prefix>-1`, `<prefix>-2`, ...
    pub fn with_slot_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.slot_prefix = prefix.into();
        self
    }

    /// Turn pretty printing on or off
    pub fn set_pretty(&mut self, enabled: bool) {
        self.pretty = enabled;
    }

    /// Check if pretty printing is enabled
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    /// Number of programs run so far
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// The shared global scope
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// The event loop asynchronous host functions settle on
    pub fn event_loop(&self) -> &EventLoop {
        self.trampoline.event_loop()
    }

    /// Evaluate the JSON AST stored at `path`.
    ///
    /// # Errors
    /// Returns `CliError` if the file cannot be read or is not a JSON AST
    pub fn execute_file(&mut self, path: &str) -> CliResult<Vec<EvaluationEvent>> {
        let source = std::fs::read_to_string(path)?;
        self.execute_string(&source)
    }

    /// Evaluate a JSON AST and return the events it produced.
    ///
    /// The event loop is pumped until idle. An evaluation still waiting on
    /// host work afterwards contributes only the events seen so far.
    ///
    /// # Errors
    /// Returns `CliError` if `source` is not a JSON AST
    pub fn execute_string(&mut self, source: &str) -> CliResult<Vec<EvaluationEvent>> {
        let program = ast::parse_program(source)?;
        self.executed += 1;
        let slot = format!("{}-{}", self.slot_prefix, self.executed);

        let observer = RecordingObserver::new();
        let evaluation = Evaluation::new(
            slot,
            self.env.clone(),
            self.trampoline.clone(),
            Rc::new(observer.clone()),
        );
        let phase = evaluation.run(&program)?;
        if phase == Phase::Running {
            debug!(
                slot = evaluation.slot(),
                outstanding = evaluation.outstanding(),
                "evaluation still waiting"
            );
        }
        Ok(observer.drain())
    }

    /// Render one event as a JSON line.
    pub fn render(&self, event: &EvaluationEvent) -> CliResult<String> {
        let depth = event.snapshot().map(wire_codec::depth).unwrap_or(0) + 1;
        let text = with_stack_for_depth(depth, || {
            if self.pretty {
                serde_json::to_string_pretty(event)
            } else {
                serde_json::to_string(event)
            }
        })?;
        Ok(text)
    }

    /// Start the interactive session
    ///
    /// # Errors
    /// Returns `CliError` if the line editor fails
    pub fn repl(&mut self) -> CliResult<()> {
        crate::repl::run_repl(self)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("pretty", &self.pretty)
            .field("slot_prefix", &self.slot_prefix)
            .field("executed", &self.executed)
            .finish()
    }
}

/// Turn the final event of a run into a process result.
pub fn outcome(events: &[EvaluationEvent]) -> CliResult<()> {
    match events.last() {
        Some(EvaluationEvent::Error { message, .. }) => Err(CliError::Failed(message.clone())),
        _ => Ok(()),
    }
}

/// Host functions the CLI offers programs.
///
/// `later(value)` hands `value` back from the next event loop turn.
pub fn host_capabilities(event_loop: &EventLoop) -> HostCapabilities {
    let event_loop = event_loop.clone();
    HostCapabilities::new().with_async("later", move |args: &[Value]| {
        let promise: Promise<Value, EvalError> = Promise::new();
        let settle = promise.clone();
        let value = args.first().cloned().unwrap_or(Value::Undefined);
        event_loop.enqueue_task(Task::new(move || {
            settle.resolve(value);
        }));
        promise
    })
}
