//! Lexical scope chain.
//!
//! A scope is shared (`Rc`) rather than stack-owned: closures keep the scope
//! they were defined in alive for as long as they can be called.

use crate::function::Function;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Why a binding operation on the chain failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingError {
    /// The name is already bound in this very scope.
    AlreadyDefined,
    /// The name is not bound anywhere in the chain.
    Undefined,
}

#[derive(Default)]
pub struct Scope {
    variables: RefCell<HashMap<String, i32>>,
    functions: RefCell<HashMap<String, Rc<Function>>>,
    parent: Option<Rc<Scope>>,
    interrupt: Cell<Option<i32>>,
}

impl Scope {
    /// A scope with no parent.
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Self> {
        Rc::new(Self {
            parent: Some(Rc::clone(parent)),
            ..Self::default()
        })
    }

    pub fn define(&self, name: &str, value: i32) -> Result<(), BindingError> {
        let mut variables = self.variables.borrow_mut();
        if variables.contains_key(name) {
            return Err(BindingError::AlreadyDefined);
        }
        variables.insert(name.to_string(), value);
        Ok(())
    }

    pub fn define_function(&self, name: &str, function: Function) -> Result<(), BindingError> {
        let mut functions = self.functions.borrow_mut();
        if functions.contains_key(name) {
            return Err(BindingError::AlreadyDefined);
        }
        functions.insert(name.to_string(), Rc::new(function));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        match self.variables.borrow().get(name) {
            Some(value) => Some(*value),
            None => self.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    pub fn function(&self, name: &str) -> Option<Rc<Function>> {
        match self.functions.borrow().get(name) {
            Some(function) => Some(Rc::clone(function)),
            None => self.parent.as_ref().and_then(|parent| parent.function(name)),
        }
    }

    /// Overwrite the nearest binding of `name`.
    pub fn set(&self, name: &str, value: i32) -> Result<(), BindingError> {
        if let Some(slot) = self.variables.borrow_mut().get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.set(name, value),
            None => Err(BindingError::Undefined),
        }
    }

    /// Mark this scope as returning `value`.
    pub fn interrupt(&self, value: i32) {
        self.interrupt.set(Some(value));
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.get().is_some()
    }

    /// The returned value, or 0 when nothing returned.
    pub fn result(&self) -> i32 {
        self.interrupt.get().unwrap_or(0)
    }

    /// Drop the functions defined here.
    ///
    /// Closures point back at the scope holding them, so this is what frees a
    /// scope once the block that owns it has finished.
    pub fn release(&self) {
        self.functions.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_rejects_duplicates_in_same_scope() {
        let scope = Scope::root();
        assert_eq!(scope.define("x", 1), Ok(()));
        assert_eq!(scope.define("x", 2), Err(BindingError::AlreadyDefined));
        assert_eq!(scope.get("x"), Some(1));
    }

    #[test]
    fn child_may_shadow_parent() {
        let root = Scope::root();
        root.define("x", 1).unwrap();
        let child = Scope::child(&root);
        assert_eq!(child.define("x", 2), Ok(()));
        assert_eq!(child.get("x"), Some(2));
        assert_eq!(root.get("x"), Some(1));
    }

    #[test]
    fn set_updates_nearest_binding() {
        let root = Scope::root();
        root.define("x", 1).unwrap();
        let child = Scope::child(&root);
        child.set("x", 5).unwrap();
        assert_eq!(root.get("x"), Some(5));
        assert_eq!(child.set("missing", 1), Err(BindingError::Undefined));
    }

    #[test]
    fn interrupt_records_result() {
        let scope = Scope::root();
        assert!(!scope.is_interrupted());
        assert_eq!(scope.result(), 0);
        scope.interrupt(42);
        assert!(scope.is_interrupted());
        assert_eq!(scope.result(), 42);
    }
}
