//! Wire format for engine values
//!
//! Plain values map onto JSON structurally. Values JSON has no shape for
//! carry a tag field `!`:
//!
//! | value | wire |
//! |---|---|
//! | `undefined` | `{"!":"undefined"}` |
//! | `nil` | `null` |
//! | sequence cell | `{"!":"cons","head":…,"tail":…}` |
//! | table | `{"!":"table","columns":[…],"data":[…]}` |
//! | unsettled lazy | `{"!":"lazy","id":n}` |
//! | function | `{"!":"function","name":…}` |
//! | `NaN`, `±Infinity` | `{"!":"number","value":"NaN"}` |
//!
//! Object keys made only of `!` are escaped with one extra `!`.
//!
//! A sequence nests one level per cell, so wire documents can be as deep as
//! the sequences they carry. Encoding and decoding walk sequence spines in a
//! loop, and [`tree`] holds the helpers for cloning, writing and dropping
//! deep documents.
//!
//! # Example
//!
//! ```
//! use core_types::Value;
//! use std::collections::HashMap;
//!
//! let mut fields = HashMap::new();
//! fields.insert("!".to_string(), Value::Number(1.0));
//! let wire = wire_codec::to_string(&Value::object(fields)).unwrap();
//! assert_eq!(wire, r#"{"!!":1}"#);
//!
//! let back = wire_codec::from_str(&wire).unwrap();
//! assert_eq!(back.get_property(&Value::string("!")).unwrap(), Value::Number(1.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decode;
pub mod encode;
pub mod escape;
pub mod pointer;
pub mod stream;
pub mod tree;

// Re-export main types at crate root
pub use decode::{decode, from_str};
pub use encode::{encode, encode_number, encode_with, to_string, Numbering, StubSink};
pub use escape::{escape_key, unescape_key, TAG};
pub use pointer::{find_stubs, patch, push_token, stub_id};
pub use stream::{Settlement, StreamingEncoder, Watcher};
pub use tree::{deep_clone, depth, release, with_stack_for, write};
