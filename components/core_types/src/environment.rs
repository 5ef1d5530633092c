//! Lexical environments.
//!
//! An [`Env`] is a shared handle to one frame; frames link to their parent.
//! Sibling scopes created from the same closure share the parent frame.

use crate::value::ObjectRef;
use crate::{EvalError, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

enum Bindings {
    Local(RefCell<HashMap<String, Value>>),
    /// Properties of an object, visible as variables
    Object(ObjectRef),
}

struct Frame {
    bindings: Bindings,
    parent: Option<Env>,
}

/// A scope in the environment chain.
///
/// # Examples
///
/// ```
/// use core_types::{Env, Value};
///
/// let root = Env::root();
/// root.declare("x", Value::Number(1.0));
///
/// let inner = root.child();
/// inner.assign("x", Value::Number(2.0)).unwrap();
/// assert_eq!(root.lookup("x").unwrap(), Value::Number(2.0));
/// assert!(inner.lookup("y").is_err());
/// ```
#[derive(Clone)]
pub struct Env {
    frame: Rc<Frame>,
}

impl Env {
    /// An empty root scope.
    pub fn root() -> Env {
        Env::with_parent(Bindings::Local(RefCell::new(HashMap::new())), None)
    }

    /// A new empty scope whose parent is `self`.
    pub fn child(&self) -> Env {
        Env::with_parent(
            Bindings::Local(RefCell::new(HashMap::new())),
            Some(self.clone()),
        )
    }

    /// A scope exposing `object`'s properties as variables.
    pub fn object_scope(&self, object: ObjectRef) -> Env {
        Env::with_parent(Bindings::Object(object), Some(self.clone()))
    }

    fn with_parent(bindings: Bindings, parent: Option<Env>) -> Env {
        Env {
            frame: Rc::new(Frame { bindings, parent }),
        }
    }

    /// The parent scope.
    pub fn parent(&self) -> Option<&Env> {
        self.frame.parent.as_ref()
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn declare(&self, name: impl Into<String>, value: Value) {
        match &self.frame.bindings {
            Bindings::Local(vars) => {
                vars.borrow_mut().insert(name.into(), value);
            }
            Bindings::Object(fields) => {
                fields.borrow_mut().insert(name.into(), value);
            }
        }
    }

    fn get_own(&self, name: &str) -> Option<Value> {
        match &self.frame.bindings {
            Bindings::Local(vars) => vars.borrow().get(name).cloned(),
            Bindings::Object(fields) => fields.borrow().get(name).cloned(),
        }
    }

    fn set_own(&self, name: &str, value: Value) -> Result<(), Value> {
        let slot = |map: &mut HashMap<String, Value>, value: Value| match map.get_mut(name) {
            Some(existing) => {
                *existing = value;
                Ok(())
            }
            None => Err(value),
        };
        match &self.frame.bindings {
            Bindings::Local(vars) => slot(&mut *vars.borrow_mut(), value),
            Bindings::Object(fields) => slot(&mut *fields.borrow_mut(), value),
        }
    }

    /// Find `name`, walking outward to the root.
    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.get_own(name) {
                return Ok(value);
            }
            scope = env.parent();
        }
        Err(EvalError::UnboundVariable(name.to_string()))
    }

    /// Overwrite the nearest existing binding of `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), EvalError> {
        let mut scope = Some(self);
        let mut value = value;
        while let Some(env) = scope {
            match env.set_own(name, value) {
                Ok(()) => return Ok(()),
                Err(rejected) => value = rejected,
            }
            scope = env.parent();
        }
        Err(EvalError::UnboundVariable(name.to_string()))
    }

    /// Returns true if `name` is bound anywhere in the chain.
    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Number of frames from this scope to the root, inclusive.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = Some(self);
        while let Some(env) = scope {
            depth += 1;
            scope = env.parent();
        }
        depth
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env").field("depth", &self.depth()).finish()
    }
}
