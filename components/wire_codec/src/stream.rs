//! Streaming encoder: stubs now, their values once they settle.
//!
//! Every unsettled lazy met while encoding gets an id and is forced on the
//! next [`StreamingEncoder::schedule`] call. When it settles, its value is
//! encoded (possibly registering further stubs) and handed to the watcher
//! for that id. A settlement that arrives before its watcher is buffered.

use core_types::{cont, err_cont, Driver, EvalError, Lazy, Step, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

use crate::encode::{encode_with, StubSink};

/// How a stub's lazy settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Encoded value, which may itself contain stubs
    Resolved(serde_json::Value),
    /// The lazy failed
    Failed(EvalError),
}

/// Receives the settlement of one stub.
pub type Watcher = Box<dyn FnOnce(Settlement)>;

#[derive(Default)]
struct StreamState {
    next_id: u64,
    unscheduled: Vec<(u64, Lazy)>,
    watchers: HashMap<u64, Watcher>,
    buffered: HashMap<u64, Settlement>,
    in_flight: usize,
}

struct Registrar<'a> {
    state: &'a mut StreamState,
}

impl StubSink for Registrar<'_> {
    fn stub(&mut self, lazy: &Lazy) -> u64 {
        let id = self.state.next_id;
        self.state.next_id += 1;
        self.state.unscheduled.push((id, lazy.clone()));
        id
    }
}

/// Shared handle to a streaming encoding session.
#[derive(Clone, Default)]
pub struct StreamingEncoder {
    state: Rc<RefCell<StreamState>>,
}

impl StreamingEncoder {
    /// A session with no stubs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `value`, registering each unsettled lazy as a stub.
    pub fn encode(&self, value: &Value) -> Result<serde_json::Value, EvalError> {
        let mut state = self.state.borrow_mut();
        encode_with(value, &mut Registrar { state: &mut state })
    }

    /// Register `watcher` for stub `id`. A buffered settlement is delivered
    /// immediately.
    pub fn watch(&self, id: u64, watcher: Watcher) {
        let buffered = self.state.borrow_mut().buffered.remove(&id);
        match buffered {
            Some(settlement) => {
                trace!(id, "delivering buffered settlement");
                watcher(settlement);
            }
            None => {
                self.state.borrow_mut().watchers.insert(id, watcher);
            }
        }
    }

    /// Queue forcing of every stub registered since the last call on
    /// `driver`.
    pub fn schedule(&self, driver: &Driver) {
        let pending = std::mem::take(&mut self.state.borrow_mut().unscheduled);
        for (id, lazy) in pending {
            self.state.borrow_mut().in_flight += 1;
            let on_value = {
                let stream = self.clone();
                cont(move |d, value| {
                    let settlement = match stream.encode(&value) {
                        Ok(json) => Settlement::Resolved(json),
                        Err(error) => Settlement::Failed(error),
                    };
                    stream.settle(d, id, settlement)
                })
            };
            let on_error = {
                let stream = self.clone();
                err_cont(move |d, error| stream.settle(d, id, Settlement::Failed(error)))
            };
            driver.schedule(lazy.force(driver, on_value, on_error));
        }
    }

    fn settle(&self, driver: &Driver, id: u64, settlement: Settlement) -> Step {
        let watcher = {
            let mut state = self.state.borrow_mut();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.watchers.remove(&id)
        };
        debug!(
            id,
            token = driver.token(),
            ok = matches!(settlement, Settlement::Resolved(_)),
            "stub settled"
        );
        match watcher {
            Some(watcher) => watcher(settlement),
            None => {
                self.state.borrow_mut().buffered.insert(id, settlement);
            }
        }
        // The watcher may have encoded further stubs.
        self.schedule(driver);
        Step::done()
    }

    /// Stubs whose lazy is being forced and has not settled.
    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight
    }

    /// Stubs registered but not yet scheduled.
    pub fn unscheduled(&self) -> usize {
        self.state.borrow().unscheduled.len()
    }
}

impl std::fmt::Debug for StreamingEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("StreamingEncoder")
            .field("next_id", &state.next_id)
            .field("in_flight", &state.in_flight)
            .field("watchers", &state.watchers.len())
            .field("buffered", &state.buffered.len())
            .finish()
    }
}
