//! Shorthand constructors for building trees by hand.
//!
//! Hosts that embed the engine without the external parser (tests, tools)
//! use these instead of spelling out JSON.

use crate::node::{
    AssignmentOperator, BinaryOperator, CatchClause, Comprehension, LiteralValue, Node, NodeRef,
    PropertyAssignment, UnaryOperator, VariableDeclaration,
};
use std::rc::Rc;

/// Numeric literal
pub fn num(value: f64) -> NodeRef {
    Rc::new(Node::Literal {
        value: LiteralValue::Number(value),
    })
}

/// String literal
pub fn string(value: &str) -> NodeRef {
    Rc::new(Node::Literal {
        value: LiteralValue::String(value.to_string()),
    })
}

/// Boolean literal
pub fn boolean(value: bool) -> NodeRef {
    Rc::new(Node::Literal {
        value: LiteralValue::Boolean(value),
    })
}

/// `undefined` literal
pub fn undefined() -> NodeRef {
    Rc::new(Node::Literal {
        value: LiteralValue::Undefined,
    })
}

/// Variable reference
pub fn var(name: &str) -> NodeRef {
    Rc::new(Node::Variable {
        name: name.to_string(),
    })
}

/// `base.name`
pub fn prop(base: NodeRef, name: &str) -> NodeRef {
    Rc::new(Node::PropertyAccess {
        base,
        name: string(name),
    })
}

/// `base[index]`
pub fn index(base: NodeRef, index: NodeRef) -> NodeRef {
    Rc::new(Node::PropertyAccess { base, name: index })
}

/// `left = right`
pub fn assign(left: NodeRef, right: NodeRef) -> NodeRef {
    compound(AssignmentOperator::Assign, left, right)
}

/// `left op= right`
pub fn compound(operator: AssignmentOperator, left: NodeRef, right: NodeRef) -> NodeRef {
    Rc::new(Node::AssignmentExpression {
        left,
        operator,
        right,
    })
}

/// `left op right`
pub fn binary(operator: BinaryOperator, left: NodeRef, right: NodeRef) -> NodeRef {
    Rc::new(Node::BinaryExpression {
        left,
        operator,
        right,
    })
}

/// `op argument`
pub fn unary(operator: UnaryOperator, argument: NodeRef) -> NodeRef {
    Rc::new(Node::UnaryExpression { operator, argument })
}

/// `test ? consequent : alternate`
pub fn conditional(test: NodeRef, consequent: NodeRef, alternate: NodeRef) -> NodeRef {
    Rc::new(Node::ConditionalExpression {
        test,
        consequent,
        alternate,
    })
}

/// `(a, b, c)`
pub fn sequence(expressions: Vec<NodeRef>) -> NodeRef {
    Rc::new(Node::SequenceExpression { expressions })
}

/// `var a = x, b;`
pub fn declare(declarations: Vec<(&str, Option<NodeRef>)>) -> NodeRef {
    Rc::new(Node::VariableStatement {
        declarations: declarations
            .into_iter()
            .map(|(name, value)| VariableDeclaration {
                name: name.to_string(),
                value,
            })
            .collect(),
    })
}

/// `callee(arguments...)`
pub fn call(callee: NodeRef, arguments: Vec<NodeRef>) -> NodeRef {
    Rc::new(Node::FunctionCall {
        name: callee,
        arguments,
    })
}

/// `base.name(arguments...)`
pub fn method(base: NodeRef, name: &str, arguments: Vec<NodeRef>) -> NodeRef {
    call(prop(base, name), arguments)
}

/// `function name(params) { elements }`
pub fn function(name: Option<&str>, params: &[&str], elements: Vec<NodeRef>) -> NodeRef {
    Rc::new(Node::Function {
        name: name.map(str::to_string),
        params: params.iter().map(|p| p.to_string()).collect(),
        elements,
    })
}

/// `try { block } catch (identifier) { handler }`
pub fn try_catch(block: Vec<NodeRef>, identifier: &str, handler: Vec<NodeRef>) -> NodeRef {
    Rc::new(Node::TryStatement {
        block,
        handler: CatchClause {
            identifier: identifier.to_string(),
            block: handler,
        },
    })
}

/// `throw exception`
pub fn throw(exception: NodeRef) -> NodeRef {
    Rc::new(Node::ThrowStatement { exception })
}

/// `{ name: value, ... }`
pub fn object(properties: Vec<(&str, NodeRef)>) -> NodeRef {
    Rc::new(Node::ObjectLiteral {
        properties: properties
            .into_iter()
            .map(|(name, value)| PropertyAssignment {
                name: name.to_string(),
                value,
            })
            .collect(),
    })
}

/// `[elements...]`
pub fn array(elements: Vec<NodeRef>) -> NodeRef {
    Rc::new(Node::ArrayLiteral { elements })
}

/// `[yield_expr for name in generate if guard]`
pub fn comprehension(
    yield_expr: NodeRef,
    name: Option<&str>,
    generate: NodeRef,
    guard: Option<NodeRef>,
) -> NodeRef {
    Rc::new(Node::ComprehensionMapExpression(Comprehension {
        yield_expr,
        generate,
        name: name.map(str::to_string),
        guard,
    }))
}

/// Outer clause of a nested comprehension; `inner` is the inner comprehension
pub fn concat_comprehension(
    inner: NodeRef,
    name: Option<&str>,
    generate: NodeRef,
    guard: Option<NodeRef>,
) -> NodeRef {
    Rc::new(Node::ComprehensionConcatMapExpression(Comprehension {
        yield_expr: inner,
        generate,
        name: name.map(str::to_string),
        guard,
    }))
}
