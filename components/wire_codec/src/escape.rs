//! Reserved-key escaping.
//!
//! The tag field `!` is reserved, so an object key made only of `!`
//! characters gains one more `!` on the wire and loses it again on decode.

/// The reserved tag field.
pub const TAG: &str = "!";

/// Returns true for a non-empty key made only of `!`.
pub fn is_reserved(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c == '!')
}

/// Escape an object key for the wire.
pub fn escape_key(key: &str) -> String {
    if is_reserved(key) {
        format!("!{}", key)
    } else {
        key.to_string()
    }
}

/// Undo [`escape_key`]. The bare tag `!` is never an escaped key and is
/// returned as `None`.
pub fn unescape_key(key: &str) -> Option<String> {
    if key == TAG {
        None
    } else if is_reserved(key) {
        Some(key[1..].to_string())
    } else {
        Some(key.to_string())
    }
}

/// Order keys so the most-escaped ones are handled first.
pub fn longest_escape_first<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a String> {
    let mut keys: Vec<&String> = keys.collect();
    keys.sort_by_key(|key| {
        let bangs = if is_reserved(key) { key.len() } else { 0 };
        std::cmp::Reverse(bangs)
    });
    keys
}
