//! One expression, driven to completion.
//!
//! The program is wrapped in a top-level lazy and encoded, which yields a
//! single stub. Every stub found in the snapshot gets a watcher that patches
//! the settled value in place by JSON pointer and scans the patch for new
//! stubs. `update` follows each settlement while stubs remain, `done` when
//! none remain, `error` on the first failure.

use ast::NodeRef;
use core_types::{err_cont, Env, EvalError, Step, Trampoline, Value};
use interpreter::program_lazy;
use serde_json::Value as Json;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};
use wire_codec::{deep_clone, find_stubs, patch, release, Settlement, StreamingEncoder};

use crate::event::{EvaluationEvent, EvaluationObserver};

/// Where an evaluation is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started
    Ready,
    /// Stubs outstanding
    Running,
    /// `done` emitted
    Done,
    /// `error` emitted
    Failed,
}

struct EvaluationState {
    slot: String,
    env: Env,
    trampoline: Trampoline,
    observer: Rc<dyn EvaluationObserver>,
    encoder: StreamingEncoder,
    snapshot: RefCell<Json>,
    /// Stub id to JSON pointer; dropped as soon as the stub settles
    outstanding: RefCell<HashMap<u64, String>>,
    phase: Cell<Phase>,
}

/// Drives one program for one result slot.
///
/// # Example
///
/// ```
/// use ast::builder::{binary, num};
/// use ast::BinaryOperator;
/// use core_types::{Env, Trampoline};
/// use notebook::{Evaluation, EvaluationEvent, Phase, RecordingObserver};
/// use serde_json::json;
/// use std::rc::Rc;
///
/// let observer = RecordingObserver::new();
/// let evaluation = Evaluation::new("cell-1", Env::root(), Trampoline::default(), Rc::new(observer.clone()));
/// let phase = evaluation.run(&[binary(BinaryOperator::Add, num(1.0), num(2.0))]).unwrap();
///
/// assert_eq!(phase, Phase::Done);
/// assert_eq!(
///     observer.events(),
///     vec![EvaluationEvent::Done { slot: "cell-1".into(), snapshot: json!(3) }]
/// );
/// ```
pub struct Evaluation {
    state: Rc<EvaluationState>,
}

impl Evaluation {
    /// Prepare an evaluation reporting to `observer`.
    pub fn new(
        slot: impl Into<String>,
        env: Env,
        trampoline: Trampoline,
        observer: Rc<dyn EvaluationObserver>,
    ) -> Self {
        Evaluation {
            state: Rc::new(EvaluationState {
                slot: slot.into(),
                env,
                trampoline,
                observer,
                encoder: StreamingEncoder::new(),
                snapshot: RefCell::new(Json::Null),
                outstanding: RefCell::new(HashMap::new()),
                phase: Cell::new(Phase::Ready),
            }),
        }
    }

    /// Begin evaluating `program`. Work that does not wait on the host runs
    /// before this returns; the rest runs as the event loop is pumped.
    ///
    /// An evaluation handles exactly one program.
    pub fn start(&self, program: &[NodeRef]) -> Result<(), EvalError> {
        let state = &self.state;
        if state.phase.get() != Phase::Ready {
            return Err(EvalError::integrity(format!(
                "evaluation for slot `{}` was already started",
                state.slot
            )));
        }
        state.phase.set(Phase::Running);
        debug!(slot = %state.slot, statements = program.len(), "evaluation started");

        let root = Value::Lazy(program_lazy(program.into(), state.env.clone()));
        let on_fault = {
            let weak = Rc::downgrade(state);
            err_cont(move |_, fault| {
                if let Some(state) = weak.upgrade() {
                    state.fail(fault);
                }
                Step::done()
            })
        };
        let starting = state.clone();
        state.trampoline.drive(
            move |d| {
                match starting.encoder.encode(&root) {
                    Ok(json) => {
                        let stubs = find_stubs(&json, "");
                        *starting.snapshot.borrow_mut() = json;
                        starting.track(stubs);
                        starting.encoder.schedule(d);
                        starting.finish_if_complete();
                    }
                    Err(error) => starting.fail(error),
                }
                Step::done()
            },
            &on_fault,
        );
        Ok(())
    }

    /// [`start`](Self::start), then pump the event loop until it is idle.
    pub fn run(&self, program: &[NodeRef]) -> Result<Phase, EvalError> {
        self.start(program)?;
        self.state.trampoline.event_loop().run_until_done();
        Ok(self.phase())
    }

    /// The result slot.
    pub fn slot(&self) -> &str {
        &self.state.slot
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase.get()
    }

    /// Returns true once `done` or `error` was emitted.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase(), Phase::Done | Phase::Failed)
    }

    /// Stubs still waiting for a value.
    pub fn outstanding(&self) -> usize {
        self.state.outstanding.borrow().len()
    }

    /// The current wire snapshot.
    pub fn snapshot(&self) -> Json {
        deep_clone(&self.state.snapshot.borrow())
    }
}

impl std::fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluation")
            .field("slot", &self.state.slot)
            .field("phase", &self.phase())
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

impl EvaluationState {
    /// Watch each stub found in the snapshot.
    fn track(self: &Rc<Self>, stubs: Vec<(u64, String)>) {
        for (id, pointer) in stubs {
            self.outstanding.borrow_mut().insert(id, pointer);
            let weak: Weak<Self> = Rc::downgrade(self);
            self.encoder.watch(
                id,
                Box::new(move |settlement| {
                    if let Some(state) = weak.upgrade() {
                        state.settled(id, settlement);
                    }
                }),
            );
        }
    }

    fn settled(self: &Rc<Self>, id: u64, settlement: Settlement) {
        if self.phase.get() != Phase::Running {
            return;
        }
        let pointer = match self.outstanding.borrow_mut().remove(&id) {
            Some(pointer) => pointer,
            None => {
                warn!(slot = %self.slot, id, "settlement for an unknown stub");
                return;
            }
        };
        let json = match settlement {
            Settlement::Resolved(json) => json,
            Settlement::Failed(error) => return self.fail(error),
        };

        let stubs = find_stubs(&json, &pointer);
        let patched = patch(&mut self.snapshot.borrow_mut(), &pointer, json);
        if !patched {
            return self.fail(EvalError::integrity(format!(
                "stub {} at `{}` is missing from the snapshot",
                id, pointer
            )));
        }
        self.track(stubs);

        if !self.finish_if_complete() {
            let snapshot = deep_clone(&self.snapshot.borrow());
            self.emit(EvaluationEvent::Update {
                slot: self.slot.clone(),
                snapshot,
            });
        }
    }

    fn finish_if_complete(&self) -> bool {
        if self.phase.get() != Phase::Running || !self.outstanding.borrow().is_empty() {
            return false;
        }
        self.phase.set(Phase::Done);
        let snapshot = deep_clone(&self.snapshot.borrow());
        self.emit(EvaluationEvent::Done {
            slot: self.slot.clone(),
            snapshot,
        });
        true
    }

    fn fail(&self, error: EvalError) {
        if self.phase.get() != Phase::Running {
            return;
        }
        self.phase.set(Phase::Failed);
        self.outstanding.borrow_mut().clear();
        let thrown = match &error {
            EvalError::Thrown(value) => wire_codec::encode(value).ok(),
            _ => None,
        };
        self.emit(EvaluationEvent::Error {
            slot: self.slot.clone(),
            kind: format!("{:?}", error.kind()),
            message: error.to_string(),
            thrown,
        });
    }

    fn emit(&self, event: EvaluationEvent) {
        debug!(
            slot = %self.slot,
            terminal = event.is_terminal(),
            outstanding = self.outstanding.borrow().len(),
            "evaluation event"
        );
        self.observer.on_event(event);
    }
}

impl Drop for EvaluationState {
    fn drop(&mut self) {
        release(self.snapshot.get_mut().take());
    }
}
