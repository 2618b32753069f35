//! The two declaration scopes.
//!
//! Each scope is an ordered id -> value mapping. Rebinding an id keeps its
//! display position; removing one shifts later ids up.

use gm_ir::ScopeKind;
use gm_model::ValueId;
use indexmap::IndexMap;

/// One scope's bindings, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    bindings: IndexMap<Box<str>, ValueId>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn lookup(&self, name: &str) -> Option<ValueId> {
        self.bindings.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Binds `name`, returning the value it replaced.
    pub fn bind(&mut self, name: &str, value: ValueId) -> Option<ValueId> {
        self.bindings.insert(name.into(), value)
    }

    pub fn unbind(&mut self, name: &str) -> Option<ValueId> {
        self.bindings.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueId)> {
        self.bindings.iter().map(|(k, v)| (&**k, *v))
    }

    pub fn ids(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.bindings.values().copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

/// Data and model scopes.
///
/// Model-scope lookups fall back to the data scope, exposing observed data to
/// the model. Data-scope lookups never see model declarations.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    data: Scope,
    model: Scope,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn scope(&self, kind: ScopeKind) -> &Scope {
        match kind {
            ScopeKind::Data => &self.data,
            ScopeKind::Model => &self.model,
        }
    }

    pub fn scope_mut(&mut self, kind: ScopeKind) -> &mut Scope {
        match kind {
            ScopeKind::Data => &mut self.data,
            ScopeKind::Model => &mut self.model,
        }
    }

    pub fn lookup(&self, kind: ScopeKind, name: &str) -> Option<ValueId> {
        match kind {
            ScopeKind::Data => self.data.lookup(name),
            ScopeKind::Model => self.model.lookup(name).or_else(|| self.data.lookup(name)),
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.model.clear();
    }
}
