//! Evaluation events and their observers.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// A notification about one evaluation slot.
///
/// Snapshots nest one level per sequence cell, so cloning and dropping an
/// event go through [`wire_codec::deep_clone`] and [`wire_codec::release`].
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EvaluationEvent {
    /// A stub settled and others remain
    Update {
        /// Result slot
        slot: String,
        /// Wire snapshot with the settled stubs patched in
        snapshot: serde_json::Value,
    },
    /// No stubs remain
    Done {
        /// Result slot
        slot: String,
        /// Final wire value
        snapshot: serde_json::Value,
    },
    /// The evaluation failed; nothing follows
    Error {
        /// Result slot
        slot: String,
        /// Error taxonomy name
        kind: String,
        /// Human-readable description
        message: String,
        /// Wire form of a thrown value
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thrown: Option<serde_json::Value>,
    },
}

impl EvaluationEvent {
    /// The slot this event belongs to.
    pub fn slot(&self) -> &str {
        match self {
            EvaluationEvent::Update { slot, .. }
            | EvaluationEvent::Done { slot, .. }
            | EvaluationEvent::Error { slot, .. } => slot,
        }
    }

    /// Returns true for `Done` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EvaluationEvent::Update { .. })
    }

    /// The snapshot carried by `Update` and `Done`.
    pub fn snapshot(&self) -> Option<&serde_json::Value> {
        match self {
            EvaluationEvent::Update { snapshot, .. } | EvaluationEvent::Done { snapshot, .. } => {
                Some(snapshot)
            }
            EvaluationEvent::Error { .. } => None,
        }
    }
}

impl Clone for EvaluationEvent {
    fn clone(&self) -> Self {
        match self {
            EvaluationEvent::Update { slot, snapshot } => EvaluationEvent::Update {
                slot: slot.clone(),
                snapshot: wire_codec::deep_clone(snapshot),
            },
            EvaluationEvent::Done { slot, snapshot } => EvaluationEvent::Done {
                slot: slot.clone(),
                snapshot: wire_codec::deep_clone(snapshot),
            },
            EvaluationEvent::Error {
                slot,
                kind,
                message,
                thrown,
            } => EvaluationEvent::Error {
                slot: slot.clone(),
                kind: kind.clone(),
                message: message.clone(),
                thrown: thrown.as_ref().map(wire_codec::deep_clone),
            },
        }
    }
}

impl Drop for EvaluationEvent {
    fn drop(&mut self) {
        match self {
            EvaluationEvent::Update { snapshot, .. } | EvaluationEvent::Done { snapshot, .. } => {
                wire_codec::release(snapshot.take())
            }
            EvaluationEvent::Error { thrown, .. } => {
                if let Some(thrown) = thrown.take() {
                    wire_codec::release(thrown);
                }
            }
        }
    }
}

/// Receives events as an evaluation progresses.
pub trait EvaluationObserver {
    /// Called once per event, in order. The observer owns the event.
    fn on_event(&self, event: EvaluationEvent);
}

impl<F: Fn(EvaluationEvent)> EvaluationObserver for F {
    fn on_event(&self, event: EvaluationEvent) {
        self(event)
    }
}

/// Observer that keeps every event it sees.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<EvaluationEvent>>>,
}

impl RecordingObserver {
    /// An empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events seen so far.
    pub fn events(&self) -> Vec<EvaluationEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return the events seen so far.
    pub fn drain(&self) -> Vec<EvaluationEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// The last event, if any.
    pub fn last(&self) -> Option<EvaluationEvent> {
        self.events.borrow().last().cloned()
    }
}

impl EvaluationObserver for RecordingObserver {
    fn on_event(&self, event: EvaluationEvent) {
        self.events.borrow_mut().push(event);
    }
}
