//! Scopes: named override contexts such as a mail account.
//!
//! A scope shadows a fixed set of global variables. Each shadowed variable
//! starts out *unset* and mirrors its parent's live value; once set it holds
//! its own value until reset.

use std::collections::HashMap;

use crate::definition::NativeValue;
use crate::set::VarId;

/// Handle to a scope created by [`ConfigSet::create_scope`](crate::ConfigSet::create_scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-scope instance of a parent variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ScopedVar {
    pub(crate) value: NativeValue,
    pub(crate) is_set: bool,
}

impl ScopedVar {
    /// Returns the scope's own value if set, otherwise the parent's.
    pub(crate) const fn effective(self, parent: NativeValue) -> NativeValue {
        if self.is_set { self.value } else { parent }
    }
}

#[derive(Debug)]
pub(crate) struct Scope {
    pub(crate) name: String,
    /// Shadowed variables, in the order they were requested.
    pub(crate) vars: Vec<(VarId, ScopedVar)>,
}

impl Scope {
    pub(crate) fn get(&self, var: VarId) -> Option<&ScopedVar> {
        self.vars.iter().find(|(id, _)| *id == var).map(|(_, sv)| sv)
    }

    pub(crate) fn get_mut(&mut self, var: VarId) -> Option<&mut ScopedVar> {
        self.vars
            .iter_mut()
            .find(|(id, _)| *id == var)
            .map(|(_, sv)| sv)
    }
}

/// Arena of live scopes. Slots of destroyed scopes are never reused, so a
/// stale [`ScopeId`] can never alias a newer scope.
#[derive(Debug, Default)]
pub(crate) struct Scopes {
    slots: Vec<Option<Scope>>,
    by_name: HashMap<String, ScopeId>,
}

impl Scopes {
    pub(crate) fn lookup(&self, name: &str) -> Option<ScopeId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Inserts a scope whose name is known to be free.
    pub(crate) fn insert(&mut self, name: &str, vars: Vec<VarId>) -> ScopeId {
        let id = ScopeId(self.slots.len());
        let vars = vars
            .into_iter()
            .map(|var| (var, ScopedVar::default()))
            .collect();
        self.slots.push(Some(Scope {
            name: name.to_string(),
            vars,
        }));
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub(crate) fn remove(&mut self, id: ScopeId) -> Option<Scope> {
        let scope = self.slots.get_mut(id.0)?.take()?;
        self.by_name.remove(&scope.name);
        Some(scope)
    }

    /// Live scopes, sorted by name.
    pub(crate) fn iter_sorted(&self) -> Vec<(ScopeId, &Scope)> {
        let mut scopes: Vec<_> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (ScopeId(i), s)))
            .collect();
        scopes.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        scopes
    }
}
