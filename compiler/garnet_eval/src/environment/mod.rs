//! Variable scoping for the interpreter.
//!
//! Scopes form a chain through `parent` links. Two kinds exist:
//!
//! - **Opaque** scopes own their variables: program top level, method
//!   bodies, block and lambda bodies. A method scope has no parent, so
//!   nothing from the caller is visible. A block or lambda scope's parent is
//!   the scope captured where its literal was written.
//! - **Transparent** scopes (`if`, loops, `begin`) only group evaluation.
//!   Their parent is always the scope that was current when they were
//!   pushed, and declarations made while one is current land in the nearest
//!   opaque ancestor, so a variable first assigned inside an `if` is still
//!   visible after it.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use garnet_ir::Name;

use crate::value::Value;

/// A single-threaded, shared, mutable scope handle.
///
/// Closures keep the scope they were created in alive through this handle,
/// and every allocation goes through [`LocalScope::new`].
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    #[inline]
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether both handles point at the same scope.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").field(&self.0).finish()
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Whether a scope owns its declarations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Opaque,
    Transparent,
}

/// One scope in the chain.
#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    bindings: FxHashMap<Name, Value>,
    parent: Option<LocalScope<Scope>>,
}

impl Scope {
    /// An opaque scope; `parent` is the lexical parent of a closure body.
    pub fn opaque(parent: Option<LocalScope<Scope>>) -> Self {
        Scope {
            kind: ScopeKind::Opaque,
            bindings: FxHashMap::default(),
            parent,
        }
    }

    pub fn transparent(parent: LocalScope<Scope>) -> Self {
        Scope {
            kind: ScopeKind::Transparent,
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    #[inline]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&LocalScope<Scope>> {
        self.parent.as_ref()
    }

    /// Bind `name` in this scope, replacing any binding it already has here.
    #[inline]
    pub fn define(&mut self, name: Name, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Bind `name` to nil unless this scope already has it.
    #[inline]
    pub fn declare(&mut self, name: Name) {
        self.bindings.entry(name).or_insert(Value::Nil);
    }

    /// Whether this scope itself binds `name`.
    #[inline]
    pub fn binds(&self, name: Name) -> bool {
        self.bindings.contains_key(&name)
    }

    /// Names bound in this scope itself.
    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.bindings.keys().copied()
    }

    /// Look up a variable through the parent chain.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        if let Some(value) = self.bindings.get(&name) {
            return Some(value.clone());
        }
        self.parent
            .as_ref()
            .and_then(|parent| parent.borrow().lookup(name))
    }

    /// Overwrite the nearest existing binding of `name`.
    ///
    /// Returns `false` when no scope in the chain binds it.
    pub fn assign_existing(&mut self, name: Name, value: Value) -> bool {
        if let Some(slot) = self.bindings.get_mut(&name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign_existing(name, value),
            None => false,
        }
    }
}

/// The interpreter's stack of active scopes.
pub struct Environment {
    scopes: Vec<LocalScope<Scope>>,
    top: LocalScope<Scope>,
}

impl Environment {
    /// Create an environment holding only the program's top-level scope.
    pub fn new() -> Self {
        let top = LocalScope::new(Scope::opaque(None));
        Environment {
            scopes: vec![top.clone()],
            top,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Handle to the current scope, for closure capture.
    #[inline]
    pub fn current_scope(&self) -> LocalScope<Scope> {
        self.scopes.last().unwrap_or(&self.top).clone()
    }

    /// The program's top-level scope.
    pub fn top_scope(&self) -> LocalScope<Scope> {
        self.top.clone()
    }

    /// Push a transparent scope (`if`, loop, `begin`).
    #[inline]
    pub fn push_transparent(&mut self) {
        let parent = self.current_scope();
        self.scopes
            .push(LocalScope::new(Scope::transparent(parent)));
    }

    /// Push an opaque scope (method, block or lambda body).
    #[inline]
    pub fn push_opaque(&mut self, lexical_parent: Option<LocalScope<Scope>>) {
        self.scopes.push(LocalScope::new(Scope::opaque(lexical_parent)));
    }

    /// Pop the current scope. The top-level scope is never popped.
    #[inline]
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// The opaque scope that owns declarations made in the current scope.
    fn owner_scope(&self) -> LocalScope<Scope> {
        let mut scope = self.current_scope();
        loop {
            let parent = {
                let inner = scope.borrow();
                if inner.kind() == ScopeKind::Opaque {
                    None
                } else {
                    inner.parent().cloned()
                }
            };
            match parent {
                Some(parent) => scope = parent,
                None => return scope,
            }
        }
    }

    /// Create a nil slot for `name` in the owning scope if it has none.
    pub fn declare(&mut self, name: Name) {
        self.owner_scope().borrow_mut().declare(name);
    }

    /// Bind `name` directly in the owning scope, shadowing outer bindings.
    pub fn define(&mut self, name: Name, value: Value) {
        self.owner_scope().borrow_mut().define(name, value);
    }

    /// Assign to the nearest visible binding, declaring `name` in the owning
    /// scope when nothing in the chain binds it.
    pub fn assign_local(&mut self, name: Name, value: Value) {
        let current = self.current_scope();
        let assigned = current.borrow_mut().assign_existing(name, value.clone());
        if !assigned {
            self.define(name, value);
        }
    }

    #[inline]
    pub fn lookup(&self, name: Name) -> Option<Value> {
        self.scopes
            .last()
            .unwrap_or(&self.top)
            .borrow()
            .lookup(name)
    }

    pub fn is_bound(&self, name: Name) -> bool {
        self.lookup(name).is_some()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
