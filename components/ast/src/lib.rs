//! AST contract for the lazy expression engine
//!
//! The text parser lives outside this workspace; it hands programs over as
//! JSON trees whose nodes carry a `type` discriminator. This crate defines
//! those node shapes and a few helpers for building them directly.
//!
//! # Example
//!
//! ```
//! use ast::{parse_program, Node};
//!
//! let program = parse_program(
//!     r#"{"type":"BinaryExpression","operator":"+",
//!         "left":{"type":"Literal","value":1},
//!         "right":{"type":"Literal","value":2}}"#,
//! )
//! .unwrap();
//! assert_eq!(program.len(), 1);
//! assert!(matches!(program[0].as_ref(), Node::BinaryExpression { .. }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod node;

pub use node::{
    parse_program, AssignmentOperator, BinaryOperator, CatchClause, Comprehension, LiteralValue,
    Node, NodeRef, PropertyAssignment, UnaryOperator, VariableDeclaration,
};
