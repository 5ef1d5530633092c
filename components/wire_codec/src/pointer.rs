//! Locating and replacing lazy stubs inside wire JSON.

use serde_json::Value as Json;

use crate::escape::TAG;

/// Append one reference token to a JSON pointer (`~` as `~0`, `/` as `~1`).
pub fn push_token(pointer: &str, token: &str) -> String {
    let mut extended = pointer.to_string();
    append_token(&mut extended, token);
    extended
}

fn append_token(pointer: &mut String, token: &str) {
    pointer.push('/');
    pointer.push_str(&token.replace('~', "~0").replace('/', "~1"));
}

/// The stub id if `json` is a lazy stub.
pub fn stub_id(json: &Json) -> Option<u64> {
    let map = json.as_object()?;
    if map.get(TAG)?.as_str()? != "lazy" {
        return None;
    }
    map.get("id")?.as_u64()
}

/// Every lazy stub in `json` as `(id, pointer)`, with pointers relative to
/// `base`. Stubs are leaves; scanning does not descend into them.
///
/// The walk keeps the tokens of the current path and spells a pointer only
/// for the stubs it finds, so scanning a deep document stays linear.
pub fn find_stubs(json: &Json, base: &str) -> Vec<(u64, String)> {
    let mut found = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut pending: Vec<(&Json, usize, Option<String>)> = vec![(json, 0, None)];
    while let Some((node, level, token)) = pending.pop() {
        path.truncate(level.saturating_sub(1));
        path.extend(token);
        if let Some(id) = stub_id(node) {
            let mut pointer = base.to_string();
            for token in &path {
                append_token(&mut pointer, token);
            }
            found.push((id, pointer));
            continue;
        }
        match node {
            Json::Array(elements) => {
                for (index, element) in elements.iter().enumerate().rev() {
                    pending.push((element, level + 1, Some(index.to_string())));
                }
            }
            Json::Object(map) => {
                for (key, field) in map.iter().rev() {
                    pending.push((field, level + 1, Some(key.clone())));
                }
            }
            _ => {}
        }
    }
    found
}

/// Replace the node at `pointer` with `replacement`. Returns false if the
/// pointer does not resolve.
pub fn patch(document: &mut Json, pointer: &str, replacement: Json) -> bool {
    match document.pointer_mut(pointer) {
        Some(slot) => {
            *slot = replacement;
            true
        }
        None => {
            crate::release(replacement);
            false
        }
    }
}
