//! Whole-document operations on wire JSON that stay off the native stack.
//!
//! A sequence nests one level per cell on the wire, so the snapshot of a
//! long sequence is as deep as the sequence is long. `serde_json` clones,
//! serializes and drops documents recursively; these helpers measure the
//! depth first and run the walk on a stack sized for it, or take the
//! document apart in a loop.

use core_types::{with_stack_for_depth, EvalError};
use serde_json::Value as Json;

/// Nesting depth of `json`; scalars are depth 1.
pub fn depth(json: &Json) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(json, 1)];
    while let Some((node, level)) = pending.pop() {
        deepest = deepest.max(level);
        match node {
            Json::Array(elements) => pending.extend(elements.iter().map(|e| (e, level + 1))),
            Json::Object(map) => pending.extend(map.values().map(|v| (v, level + 1))),
            _ => {}
        }
    }
    deepest
}

/// Run `f`, which walks `json` recursively, on a stack deep enough for it.
pub fn with_stack_for<R>(json: &Json, f: impl FnOnce() -> R) -> R {
    with_stack_for_depth(depth(json), f)
}

/// Clone a document of any depth.
pub fn deep_clone(json: &Json) -> Json {
    with_stack_for(json, || json.clone())
}

/// Drop a document of any depth, one container at a time.
pub fn release(json: Json) {
    let mut pending = vec![json];
    while let Some(node) = pending.pop() {
        match node {
            Json::Array(elements) => pending.extend(elements),
            Json::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

/// Serialize a document of any depth as compact text.
pub fn write(json: &Json) -> Result<String, EvalError> {
    with_stack_for(json, || serde_json::to_string(json))
        .map_err(|e| EvalError::malformed(e.to_string()))
}
