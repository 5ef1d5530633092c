//! Abstract Syntax Tree node definitions
//!
//! Nodes are produced by the external parser and delivered as JSON objects
//! discriminated by their `type` field. Children are reference counted so the
//! evaluator can capture subtrees in deferred computations without copying.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Shared handle to an AST node
pub type NodeRef = Rc<Node>;

/// Expression language AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    /// Literal value
    Literal {
        /// The literal value
        value: LiteralValue,
    },

    /// Variable reference
    Variable {
        /// Variable name
        name: String,
    },

    /// Property access (`base.name` or `base[name]`)
    PropertyAccess {
        /// Object being accessed
        base: NodeRef,
        /// Property expression; `a.b` carries a string literal
        name: NodeRef,
    },

    /// Assignment expression
    AssignmentExpression {
        /// Assignment target (variable or property access)
        left: NodeRef,
        /// Operator
        operator: AssignmentOperator,
        /// Right-hand side
        right: NodeRef,
    },

    /// Binary operation
    BinaryExpression {
        /// Left operand
        left: NodeRef,
        /// Operator
        operator: BinaryOperator,
        /// Right operand
        right: NodeRef,
    },

    /// Unary operation
    UnaryExpression {
        /// Operator
        operator: UnaryOperator,
        /// Operand
        argument: NodeRef,
    },

    /// Conditional expression (ternary)
    ConditionalExpression {
        /// Condition
        test: NodeRef,
        /// Consequent
        consequent: NodeRef,
        /// Alternate
        alternate: NodeRef,
    },

    /// Comma-separated expressions, yielding the last
    SequenceExpression {
        /// Expressions in evaluation order
        expressions: Vec<NodeRef>,
    },

    /// Variable declaration statement
    VariableStatement {
        /// Declarators, bound in source order
        declarations: Vec<VariableDeclaration>,
    },

    /// Function call or method call
    FunctionCall {
        /// Callee expression
        name: NodeRef,
        /// Argument expressions
        arguments: Vec<NodeRef>,
    },

    /// Function literal
    Function {
        /// Optional name, bound in the defining scope
        #[serde(default)]
        name: Option<String>,
        /// Parameter names
        params: Vec<String>,
        /// Body statements
        elements: Vec<NodeRef>,
    },

    /// Try/catch statement
    TryStatement {
        /// Protected block
        block: Vec<NodeRef>,
        /// Catch clause
        #[serde(rename = "catch")]
        handler: CatchClause,
    },

    /// Throw statement
    ThrowStatement {
        /// Thrown expression
        exception: NodeRef,
    },

    /// Object literal
    ObjectLiteral {
        /// Properties in source order
        properties: Vec<PropertyAssignment>,
    },

    /// Array literal
    ArrayLiteral {
        /// Elements in source order
        elements: Vec<NodeRef>,
    },

    /// Single-generator comprehension: `[yield for name in generate if guard]`
    ComprehensionMapExpression(Comprehension),

    /// Comprehension whose `yield` is itself a comprehension (nested generators)
    ComprehensionConcatMapExpression(Comprehension),

    /// Any node kind this engine does not know
    #[serde(other)]
    Unsupported,
}

impl Node {
    /// Returns the `type` discriminator of this node
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Literal { .. } => "Literal",
            Node::Variable { .. } => "Variable",
            Node::PropertyAccess { .. } => "PropertyAccess",
            Node::AssignmentExpression { .. } => "AssignmentExpression",
            Node::BinaryExpression { .. } => "BinaryExpression",
            Node::UnaryExpression { .. } => "UnaryExpression",
            Node::ConditionalExpression { .. } => "ConditionalExpression",
            Node::SequenceExpression { .. } => "SequenceExpression",
            Node::VariableStatement { .. } => "VariableStatement",
            Node::FunctionCall { .. } => "FunctionCall",
            Node::Function { .. } => "Function",
            Node::TryStatement { .. } => "TryStatement",
            Node::ThrowStatement { .. } => "ThrowStatement",
            Node::ObjectLiteral { .. } => "ObjectLiteral",
            Node::ArrayLiteral { .. } => "ArrayLiteral",
            Node::ComprehensionMapExpression(_) => "ComprehensionMapExpression",
            Node::ComprehensionConcatMapExpression(_) => "ComprehensionConcatMapExpression",
            Node::Unsupported => "Unsupported",
        }
    }

    /// Direct child nodes, in source order
    pub fn children(&self) -> Vec<&NodeRef> {
        match self {
            Node::Literal { .. } | Node::Variable { .. } | Node::Unsupported => Vec::new(),
            Node::PropertyAccess { base, name } => vec![base, name],
            Node::AssignmentExpression { left, right, .. }
            | Node::BinaryExpression { left, right, .. } => vec![left, right],
            Node::UnaryExpression { argument, .. } => vec![argument],
            Node::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => vec![test, consequent, alternate],
            Node::SequenceExpression { expressions } => expressions.iter().collect(),
            Node::VariableStatement { declarations } => declarations
                .iter()
                .filter_map(|declaration| declaration.value.as_ref())
                .collect(),
            Node::FunctionCall { name, arguments } => {
                std::iter::once(name).chain(arguments.iter()).collect()
            }
            Node::Function { elements, .. } => elements.iter().collect(),
            Node::TryStatement { block, handler } => {
                block.iter().chain(handler.block.iter()).collect()
            }
            Node::ThrowStatement { exception } => vec![exception],
            Node::ObjectLiteral { properties } => {
                properties.iter().map(|property| &property.value).collect()
            }
            Node::ArrayLiteral { elements } => elements.iter().collect(),
            Node::ComprehensionMapExpression(c) | Node::ComprehensionConcatMapExpression(c) => {
                let mut children = vec![&c.yield_expr, &c.generate];
                children.extend(c.guard.as_ref());
                children
            }
        }
    }

    /// Every `Variable` name mentioned at or below this node, bound or not.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if let Node::Variable { name } = node {
                names.push(name.as_str());
            }
            pending.extend(node.children().into_iter().rev().map(|child| &**child));
        }
        names
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// Boolean literal
    Boolean(bool),
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// `null` on the wire, evaluated as `undefined`
    Undefined,
}

/// A single `name = value` declarator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// Bound name
    pub name: String,
    /// Optional initializer
    #[serde(default)]
    pub value: Option<NodeRef>,
}

/// `catch (identifier) { block }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    /// Name the caught value is bound to
    pub identifier: String,
    /// Handler statements
    pub block: Vec<NodeRef>,
}

/// Object literal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAssignment {
    /// Property key
    pub name: String,
    /// Property value expression
    pub value: NodeRef,
}

/// Shared shape of both comprehension node kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    /// Produced expression (a nested comprehension for the concat-map form)
    #[serde(rename = "yield")]
    pub yield_expr: NodeRef,
    /// Source sequence
    pub generate: NodeRef,
    /// Element name; the implicit `_` when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Optional filter
    #[serde(default)]
    pub guard: Option<NodeRef>,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    /// Addition or string concatenation
    #[serde(rename = "+")]
    Add,
    /// Subtraction
    #[serde(rename = "-")]
    Sub,
    /// Multiplication
    #[serde(rename = "*")]
    Mul,
    /// Division
    #[serde(rename = "/")]
    Div,
    /// Remainder
    #[serde(rename = "%")]
    Mod,
    /// Less than
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal
    #[serde(rename = "<=")]
    LtEq,
    /// Greater than
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal
    #[serde(rename = ">=")]
    GtEq,
    /// Equality
    #[serde(rename = "==", alias = "===")]
    Eq,
    /// Inequality
    #[serde(rename = "!=", alias = "!==")]
    NotEq,
    /// Logical AND of both operands
    #[serde(rename = "&&")]
    And,
    /// Logical OR of both operands
    #[serde(rename = "||")]
    Or,
}

impl BinaryOperator {
    /// Source spelling of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    /// `<`, `<=`, `>` or `>=`
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Lt | BinaryOperator::LtEq | BinaryOperator::Gt | BinaryOperator::GtEq
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Numeric negation
    #[serde(rename = "-")]
    Minus,
    /// Logical NOT
    #[serde(rename = "!")]
    Not,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentOperator {
    /// Simple assignment
    #[serde(rename = "=")]
    Assign,
    /// `+=`
    #[serde(rename = "+=")]
    AddAssign,
    /// `-=`
    #[serde(rename = "-=")]
    SubAssign,
    /// `*=`
    #[serde(rename = "*=")]
    MulAssign,
    /// `/=`
    #[serde(rename = "/=")]
    DivAssign,
    /// `%=`
    #[serde(rename = "%=")]
    ModAssign,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies, `None` for `=`
    pub fn binary(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubAssign => Some(BinaryOperator::Sub),
            AssignmentOperator::MulAssign => Some(BinaryOperator::Mul),
            AssignmentOperator::DivAssign => Some(BinaryOperator::Div),
            AssignmentOperator::ModAssign => Some(BinaryOperator::Mod),
        }
    }
}

/// A parsed program: the statements of one notebook cell
#[derive(Deserialize)]
#[serde(untagged)]
enum ProgramInput {
    Many(Vec<NodeRef>),
    One(NodeRef),
}

/// Parse a JSON program: either an array of statement nodes or a single node.
///
/// # Errors
///
/// Returns the `serde_json` error when the text is not valid JSON or does not
/// match the node contract.
pub fn parse_program(json: &str) -> Result<Vec<NodeRef>, serde_json::Error> {
    let input: ProgramInput = serde_json::from_str(json)?;
    Ok(match input {
        ProgramInput::Many(nodes) => nodes,
        ProgramInput::One(node) => vec![node],
    })
}
