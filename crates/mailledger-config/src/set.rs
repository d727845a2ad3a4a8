//! The configuration registry.
//!
//! [`ConfigSet`] owns every variable definition, the type handlers that
//! interpret them, the scopes that shadow them and the listeners that watch
//! them. All mutations follow the same protocol:
//!
//! 1. resolve the name (following `scope:name` if present),
//! 2. parse and domain-check through the variable's [`TypeHandler`],
//! 3. short-circuit if the value is unchanged,
//! 4. run the variable's validator,
//! 5. write the value,
//! 6. notify listeners.
//!
//! Any failure before step 5 leaves the stored value untouched.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::definition::{
    NativeValue, RegisterFlags, SCOPE_DELIMITER, VariableDef, is_valid_name,
};
use crate::error::{Error, Result};
use crate::listener::{ConfigEvent, EventKind, Listener, Listeners};
use crate::scope::{ScopeId, ScopedVar, Scopes};
use crate::types::{DataType, TypeHandler, builtin_handlers};
use crate::validator::Validation;

/// Index of a registered variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

/// A resolved variable address.
///
/// Obtained from [`ConfigSet::resolve`]; passing it back to an operation
/// skips name parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKey {
    /// A global variable.
    Global(VarId),
    /// A scope's instance of a global variable.
    Scoped {
        /// The scope.
        scope: ScopeId,
        /// The parent variable.
        var: VarId,
    },
}

impl VarKey {
    /// Returns the (parent) variable this key refers to.
    #[must_use]
    pub const fn var(self) -> VarId {
        match self {
            Self::Global(var) | Self::Scoped { var, .. } => var,
        }
    }
}

/// Something that names a variable: a `&str`, a `String` or a [`VarKey`].
pub trait Lookup {
    /// Resolves `self` against `cs`.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if the variable or scope does not exist.
    fn resolve_in(&self, cs: &ConfigSet) -> Result<VarKey>;
}

impl Lookup for str {
    fn resolve_in(&self, cs: &ConfigSet) -> Result<VarKey> {
        cs.resolve(self)
    }
}

impl Lookup for String {
    fn resolve_in(&self, cs: &ConfigSet) -> Result<VarKey> {
        cs.resolve(self)
    }
}

impl Lookup for VarKey {
    fn resolve_in(&self, cs: &ConfigSet) -> Result<VarKey> {
        let var = self.var();
        if var.0 >= cs.vars.len() {
            return Err(Error::UnknownVariable(format!("#{}", var.0)));
        }
        if let Self::Scoped { scope, var } = *self {
            let shadowed = cs
                .scopes
                .get(scope)
                .ok_or_else(|| Error::UnknownScope(scope.to_string()))?
                .get(var)
                .is_some();
            if !shadowed {
                return Err(Error::UnknownVariable(cs.key_name(*self)));
            }
        }
        Ok(*self)
    }
}

/// Outcome of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetStatus {
    /// The value was written.
    Changed,
    /// The value already matched; nothing was validated or notified.
    Unchanged,
    /// The value was written, but the validator attached a caveat.
    Warning(String),
}

impl SetStatus {
    /// Returns true if a new value was written.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Returns the validator's caveat, if any.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Warning(message) => Some(message),
            _ => None,
        }
    }
}

struct Entry {
    def: VariableDef,
    /// Current initial value; starts as `def.initial()`.
    initial: NativeValue,
    /// `None` for variables soft-registered against an unknown type.
    handler: Option<Rc<dyn TypeHandler>>,
}

/// Registry of typed configuration variables.
///
/// Single-threaded: storage cells are shared with their owners through
/// `Rc`, so a `ConfigSet` is neither `Send` nor `Sync`.
#[derive(Default)]
pub struct ConfigSet {
    vars: Vec<Entry>,
    by_name: HashMap<String, VarId>,
    types: HashMap<DataType, Rc<dyn TypeHandler>>,
    pub(crate) scopes: Scopes,
    listeners: Listeners,
}

impl fmt::Debug for ConfigSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.types.keys().copied().collect();
        types.sort();
        f.debug_struct("ConfigSet")
            .field("vars", &self.vars.len())
            .field("types", &types)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl ConfigSet {
    /// Creates an empty registry with no type handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in bool, number and sort handlers.
    #[must_use]
    pub fn with_default_types() -> Self {
        let mut cs = Self::new();
        for handler in builtin_handlers() {
            cs.types.insert(handler.data_type(), Rc::from(handler));
        }
        cs
    }

    /// Registers a type handler.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateType` if a handler for the same type id exists.
    pub fn register_type<H>(&mut self, handler: H) -> Result<()>
    where
        H: TypeHandler + 'static,
    {
        let data_type = handler.data_type();
        if self.types.contains_key(&data_type) {
            return Err(Error::DuplicateType(data_type));
        }
        debug!(%data_type, name = handler.name(), "Registered config type");
        self.types.insert(data_type, Rc::new(handler));
        Ok(())
    }

    /// Registers a batch of variables, seeding each storage with its initial value.
    ///
    /// Either every definition is registered or none is. Unknown types are
    /// an error unless `flags` allows them, in which case the variable is
    /// recorded but every later operation on it fails.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `DuplicateVariable` or `UnknownType`.
    pub fn register(
        &mut self,
        defs: Vec<VariableDef>,
        flags: RegisterFlags,
    ) -> Result<Vec<VarId>> {
        self.check_batch(&defs, flags)?;
        Ok(defs.into_iter().map(|def| self.insert_var(def)).collect())
    }

    fn check_batch(&self, defs: &[VariableDef], flags: RegisterFlags) -> Result<()> {
        let mut batch = HashSet::new();
        for def in defs {
            let name = def.name();
            if !is_valid_name(name) {
                return Err(Error::InvalidName(name.to_string()));
            }
            if self.by_name.contains_key(name) || !batch.insert(name) {
                return Err(Error::DuplicateVariable(name.to_string()));
            }
            let data_type = def.var_type().data_type;
            if !flags.allow_unknown_type && !self.types.contains_key(&data_type) {
                return Err(Error::UnknownType {
                    name: name.to_string(),
                    data_type,
                });
            }
        }
        Ok(())
    }

    fn insert_var(&mut self, def: VariableDef) -> VarId {
        let id = VarId(self.vars.len());
        let data_type = def.var_type().data_type;
        let handler = self.types.get(&data_type).cloned();
        if handler.is_none() {
            warn!(name = def.name(), %data_type, "Registered variable with unknown type");
        }

        def.storage().set(def.initial());
        debug!(name = def.name(), var_type = %def.var_type(), "Registered variable");

        self.by_name.insert(def.name().to_string(), id);
        self.vars.push(Entry {
            initial: def.initial(),
            def,
            handler,
        });
        id
    }

    /// Adds a listener, called after every committed value change.
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: Listener + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Resolves a name to a variable key.
    ///
    /// `scope:name` addresses the scope's instance if the scope shadows
    /// `name`, and the global variable otherwise.
    ///
    /// # Errors
    ///
    /// Returns `UnknownScope` or `UnknownVariable`.
    pub fn resolve(&self, name: &str) -> Result<VarKey> {
        let Some((scope_name, var_name)) = name.split_once(SCOPE_DELIMITER) else {
            return self
                .var_id(name)
                .map(VarKey::Global)
                .ok_or_else(|| Error::UnknownVariable(name.to_string()));
        };

        let scope = self
            .scopes
            .lookup(scope_name)
            .ok_or_else(|| Error::UnknownScope(scope_name.to_string()))?;
        let var = self
            .var_id(var_name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))?;

        let shadowed = self
            .scopes
            .get(scope)
            .is_some_and(|s| s.get(var).is_some());
        Ok(if shadowed {
            VarKey::Scoped { scope, var }
        } else {
            VarKey::Global(var)
        })
    }

    /// Looks up a global variable by name.
    #[must_use]
    pub fn var_id(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    /// Returns a variable's definition.
    #[must_use]
    pub fn definition(&self, id: VarId) -> Option<&VariableDef> {
        self.vars.get(id.0).map(|e| &e.def)
    }

    /// Names of all global variables, in registration order.
    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|e| e.def.name())
    }

    /// Returns the display name of a key: `name` or `scope:name`.
    #[must_use]
    pub fn key_name(&self, key: VarKey) -> String {
        let var = self.vars.get(key.var().0).map_or("?", |e| e.def.name());
        match key {
            VarKey::Global(_) => var.to_string(),
            VarKey::Scoped { scope, .. } => {
                let scope = self.scope_name(scope).unwrap_or("?");
                format!("{scope}{SCOPE_DELIMITER}{var}")
            }
        }
    }

    /// Returns true if `name` is a scoped variable holding its own value.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if the name does not resolve.
    pub fn is_set<K: Lookup + ?Sized>(&self, name: &K) -> Result<bool> {
        Ok(match name.resolve_in(self)? {
            VarKey::Global(_) => false,
            VarKey::Scoped { scope, var } => self.scoped(scope, var).is_some_and(|sv| sv.is_set),
        })
    }

    /// Parses `text` and stores it.
    ///
    /// # Errors
    ///
    /// Returns a resolution, parse, domain or validator error; the stored
    /// value is unchanged.
    pub fn string_set<K: Lookup + ?Sized>(&mut self, name: &K, text: &str) -> Result<SetStatus> {
        let key = name.resolve_in(self)?;
        let handler = self.handler(key.var())?;
        let value = handler.parse(&self.entry(key.var()).def, text)?;
        self.set_value(key, value)
    }

    /// Renders the current value as text.
    ///
    /// # Errors
    ///
    /// Returns a resolution error, or a domain error if the stored value is
    /// not a legal value of the type.
    pub fn string_get<K: Lookup + ?Sized>(&self, name: &K) -> Result<String> {
        let key = name.resolve_in(self)?;
        let handler = self.handler(key.var())?;
        handler.render(&self.entry(key.var()).def, self.current(key))
    }

    /// Stores a native value after checking it lies in the type's domain.
    ///
    /// # Errors
    ///
    /// Returns a resolution, domain or validator error; the stored value is
    /// unchanged.
    pub fn native_set<K: Lookup + ?Sized>(
        &mut self,
        name: &K,
        value: NativeValue,
    ) -> Result<SetStatus> {
        let key = name.resolve_in(self)?;
        self.set_value(key, value)
    }

    /// Returns the current native value.
    ///
    /// # Errors
    ///
    /// Returns a resolution error.
    pub fn native_get<K: Lookup + ?Sized>(&self, name: &K) -> Result<NativeValue> {
        let key = name.resolve_in(self)?;
        self.handler(key.var())?;
        Ok(self.current(key))
    }

    /// Parses `text` and makes it the value [`reset`](Self::reset) restores.
    ///
    /// The current value is not touched and listeners are not notified. A
    /// scoped name addresses its parent's initial value.
    ///
    /// # Errors
    ///
    /// Returns a resolution, parse, domain or validator error.
    pub fn initial_set<K: Lookup + ?Sized>(&mut self, name: &K, text: &str) -> Result<SetStatus> {
        let var = name.resolve_in(self)?.var();
        let handler = self.handler(var)?;
        let entry = self.entry(var);
        let value = handler.parse(&entry.def, text)?;
        if entry.initial == value {
            trace!(name = entry.def.name(), "Initial value unchanged");
            return Ok(SetStatus::Unchanged);
        }

        let def_name = entry.def.name().to_string();
        let status = self.check_validator(var, &def_name, value)?;
        self.vars[var.0].initial = value;
        debug!(name = %def_name, initial = value, "Config initial value set");
        Ok(status)
    }

    /// Renders the initial value as text.
    ///
    /// # Errors
    ///
    /// Returns a resolution or domain error.
    pub fn initial_get<K: Lookup + ?Sized>(&self, name: &K) -> Result<String> {
        let var = name.resolve_in(self)?.var();
        let handler = self.handler(var)?;
        let entry = self.entry(var);
        handler.render(&entry.def, entry.initial)
    }

    /// Restores a variable.
    ///
    /// A global variable goes back to its initial value. A scoped variable
    /// is unset and mirrors its parent's live value again; the validator
    /// sees that live value as the proposed one.
    ///
    /// # Errors
    ///
    /// Returns a resolution, domain or validator error; the variable keeps
    /// its previous state.
    pub fn reset<K: Lookup + ?Sized>(&mut self, name: &K) -> Result<SetStatus> {
        let key = name.resolve_in(self)?;
        let var = key.var();
        let handler = self.handler(var)?;
        let entry = self.entry(var);

        let target = match key {
            VarKey::Global(_) => entry.initial,
            VarKey::Scoped { scope, var } => {
                if !self.scoped(scope, var).is_some_and(|sv| sv.is_set) {
                    trace!(name = %self.key_name(key), "Scoped variable already unset");
                    return Ok(SetStatus::Unchanged);
                }
                entry.def.storage().get()
            }
        };
        handler.validate(&entry.def, target)?;

        let name = self.key_name(key);
        let old = self.current(key);
        if old == target {
            self.unset_scoped(key);
            trace!(name = %name, "Reset value unchanged");
            return Ok(SetStatus::Unchanged);
        }

        let status = self.check_validator(var, &name, target)?;
        match key {
            VarKey::Global(_) => self.entry(var).def.storage().set(target),
            VarKey::Scoped { .. } => self.unset_scoped(key),
        }
        debug!(name = %name, old, new = target, "Config variable reset");
        self.listeners.notify(&ConfigEvent {
            name,
            old,
            new: target,
            kind: EventKind::Reset,
        });
        Ok(status)
    }

    /// Creates a scope shadowing the named global variables.
    ///
    /// Each scoped variable starts unset, mirroring its parent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `DuplicateScope`, or `UnknownVariable` if a
    /// parent is not registered.
    pub fn create_scope(&mut self, name: &str, parents: &[&str]) -> Result<ScopeId> {
        if !is_valid_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }
        if self.scopes.contains_name(name) {
            return Err(Error::DuplicateScope(name.to_string()));
        }

        let mut vars = Vec::with_capacity(parents.len());
        for parent in parents {
            let id = self
                .var_id(parent)
                .ok_or_else(|| Error::UnknownVariable((*parent).to_string()))?;
            if !vars.contains(&id) {
                vars.push(id);
            }
        }

        let count = vars.len();
        let id = self.scopes.insert(name, vars);
        debug!(scope = name, count, "Created config scope");
        Ok(id)
    }

    /// Destroys a scope and its scoped variables. Parents are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `UnknownScope` if the scope was already destroyed.
    pub fn destroy_scope(&mut self, id: ScopeId) -> Result<()> {
        let scope = self
            .scopes
            .remove(id)
            .ok_or_else(|| Error::UnknownScope(id.to_string()))?;
        debug!(scope = %scope.name, "Destroyed config scope");
        Ok(())
    }

    /// Looks up a live scope by name.
    #[must_use]
    pub fn scope_id(&self, name: &str) -> Option<ScopeId> {
        self.scopes.lookup(name)
    }

    /// Returns a live scope's name.
    #[must_use]
    pub fn scope_name(&self, id: ScopeId) -> Option<&str> {
        self.scopes.get(id).map(|s| s.name.as_str())
    }

    /// Returns the current initial value of a variable.
    pub(crate) fn initial_native(&self, var: VarId) -> NativeValue {
        self.entry(var).initial
    }

    fn entry(&self, var: VarId) -> &Entry {
        &self.vars[var.0]
    }

    fn handler(&self, var: VarId) -> Result<Rc<dyn TypeHandler>> {
        let entry = self.entry(var);
        entry.handler.clone().ok_or_else(|| Error::UnknownType {
            name: entry.def.name().to_string(),
            data_type: entry.def.var_type().data_type,
        })
    }

    fn scoped(&self, scope: ScopeId, var: VarId) -> Option<&ScopedVar> {
        self.scopes.get(scope).and_then(|s| s.get(var))
    }

    fn current(&self, key: VarKey) -> NativeValue {
        let parent = self.entry(key.var()).def.storage().get();
        match key {
            VarKey::Global(_) => parent,
            VarKey::Scoped { scope, var } => self
                .scoped(scope, var)
                .map_or(parent, |sv| sv.effective(parent)),
        }
    }

    fn set_value(&mut self, key: VarKey, value: NativeValue) -> Result<SetStatus> {
        let var = key.var();
        self.handler(var)?.validate(&self.entry(var).def, value)?;

        let name = self.key_name(key);
        let old = self.current(key);
        if old == value {
            // An unset scoped variable still stops mirroring its parent.
            self.store(key, value);
            trace!(name = %name, "Value unchanged");
            return Ok(SetStatus::Unchanged);
        }

        let status = self.check_validator(var, &name, value)?;
        self.store(key, value);
        debug!(name = %name, old, new = value, "Config variable set");
        self.listeners.notify(&ConfigEvent {
            name,
            old,
            new: value,
            kind: EventKind::Set,
        });
        Ok(status)
    }

    fn check_validator(&self, var: VarId, name: &str, value: NativeValue) -> Result<SetStatus> {
        let def = &self.entry(var).def;
        let Some(validator) = def.validator() else {
            return Ok(SetStatus::Changed);
        };
        match validator(self, def, value) {
            Validation::Accept => Ok(SetStatus::Changed),
            Validation::Warn(message) => {
                debug!(name, %message, "Validator warning");
                Ok(SetStatus::Warning(message))
            }
            Validation::Reject(message) => Err(Error::Rejected {
                name: name.to_string(),
                message,
            }),
        }
    }

    fn store(&mut self, key: VarKey, value: NativeValue) {
        match key {
            VarKey::Global(var) => self.entry(var).def.storage().set(value),
            VarKey::Scoped { scope, var } => {
                if let Some(sv) = self.scopes.get_mut(scope).and_then(|s| s.get_mut(var)) {
                    *sv = ScopedVar {
                        value,
                        is_set: true,
                    };
                }
            }
        }
    }

    fn unset_scoped(&mut self, key: VarKey) {
        if let VarKey::Scoped { scope, var } = key
            && let Some(sv) = self.scopes.get_mut(scope).and_then(|s| s.get_mut(var))
        {
            *sv = ScopedVar::default();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::definition::{Storage, VarType};
    use crate::error::ErrorKind;
    use crate::types::{NumberType, SortContext, SortKey, SortOrder};

    fn order(key: SortKey) -> NativeValue {
        SortOrder::new(key).to_native()
    }

    fn setup() -> (ConfigSet, Storage, Storage) {
        let sort = Storage::new();
        let timeout = Storage::new();
        let mut cs = ConfigSet::with_default_types();
        cs.register(
            vec![
                VariableDef::new("sort", SortContext::Index.var_type(), &sort)
                    .with_initial(order(SortKey::Date)),
                VariableDef::new(
                    "timeout",
                    VarType::new(DataType::NUMBER, NumberType::NOT_NEGATIVE),
                    &timeout,
                )
                .with_initial(30),
            ],
            RegisterFlags::NONE,
        )
        .unwrap();
        (cs, sort, timeout)
    }

    #[test]
    fn test_register_seeds_storage() {
        let (cs, sort, timeout) = setup();
        assert_eq!(sort.get(), order(SortKey::Date));
        assert_eq!(timeout.get(), 30);
        assert_eq!(cs.var_names().collect::<Vec<_>>(), vec!["sort", "timeout"]);
    }

    #[test]
    fn test_register_is_atomic() {
        let (mut cs, _, _) = setup();
        let storage = Storage::new();
        let err = cs
            .register(
                vec![
                    VariableDef::new("pager_index_lines", VarType::new(DataType::NUMBER, 0), &storage),
                    VariableDef::new("sort", SortContext::Index.var_type(), &storage),
                ],
                RegisterFlags::NONE,
            )
            .unwrap_err();
        assert_eq!(err, Error::DuplicateVariable("sort".into()));
        assert!(cs.var_id("pager_index_lines").is_none());
    }

    #[test]
    fn test_register_rejects_bad_names_and_types() {
        let mut cs = ConfigSet::with_default_types();
        let storage = Storage::new();

        let err = cs
            .register(
                vec![VariableDef::new("a:b", VarType::new(DataType::BOOL, 0), &storage)],
                RegisterFlags::NONE,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registration);

        let twice = vec![
            VariableDef::new("x", VarType::new(DataType::BOOL, 0), &storage),
            VariableDef::new("x", VarType::new(DataType::BOOL, 0), &storage),
        ];
        assert!(matches!(
            cs.register(twice, RegisterFlags::NONE),
            Err(Error::DuplicateVariable(_))
        ));

        let unknown = vec![VariableDef::new("y", VarType::new(DataType(42), 0), &storage)];
        assert!(matches!(
            cs.register(unknown, RegisterFlags::NONE),
            Err(Error::UnknownType { .. })
        ));
    }

    #[test]
    fn test_soft_registered_unknown_type_fails_at_use() {
        let mut cs = ConfigSet::with_default_types();
        let storage = Storage::new();
        cs.register(
            vec![VariableDef::new("mystery", VarType::new(DataType(42), 0), &storage)],
            RegisterFlags::ALLOW_UNKNOWN_TYPE,
        )
        .unwrap();

        assert!(cs.var_id("mystery").is_some());
        assert!(matches!(cs.string_get("mystery"), Err(Error::UnknownType { .. })));
        assert!(matches!(cs.native_set("mystery", 1), Err(Error::UnknownType { .. })));
        assert!(matches!(cs.reset("mystery"), Err(Error::UnknownType { .. })));
    }

    #[test]
    fn test_register_duplicate_type() {
        let mut cs = ConfigSet::with_default_types();
        assert_eq!(
            cs.register_type(NumberType),
            Err(Error::DuplicateType(DataType::NUMBER))
        );
    }

    #[test]
    fn test_string_set_and_get() {
        let (mut cs, sort, _) = setup();
        assert_eq!(cs.string_set("sort", "reverse-size").unwrap(), SetStatus::Changed);
        assert_eq!(sort.get(), SortOrder::new(SortKey::Size).reversed().to_native());
        assert_eq!(cs.string_get("sort").unwrap(), "reverse-size");

        assert_eq!(cs.string_set("sort", "reverse-size").unwrap(), SetStatus::Unchanged);
    }

    #[test]
    fn test_failed_set_keeps_value() {
        let (mut cs, sort, timeout) = setup();
        let before = sort.get();

        let err = cs.string_set("sort", "junk").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(sort.get(), before);

        let err = cs.native_set("sort", -1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert_eq!(sort.get(), before);

        assert!(cs.native_set("timeout", -5).is_err());
        assert_eq!(timeout.get(), 30);
    }

    #[test]
    fn test_unknown_names() {
        let (mut cs, _, _) = setup();
        assert_eq!(
            cs.string_get("nope"),
            Err(Error::UnknownVariable("nope".into()))
        );
        assert_eq!(
            cs.string_set("work:sort", "size"),
            Err(Error::UnknownScope("work".into()))
        );
    }

    #[test]
    fn test_initial_set_does_not_touch_current() {
        let (mut cs, sort, _) = setup();
        let events = Rc::new(RefCell::new(0));
        let count = Rc::clone(&events);
        cs.add_listener(move |_: &ConfigEvent| *count.borrow_mut() += 1);

        assert_eq!(cs.initial_set("sort", "score").unwrap(), SetStatus::Changed);
        assert_eq!(cs.initial_get("sort").unwrap(), "score");
        assert_eq!(sort.get(), order(SortKey::Date));
        assert_eq!(*events.borrow(), 0);

        assert_eq!(cs.reset("sort").unwrap(), SetStatus::Changed);
        assert_eq!(cs.string_get("sort").unwrap(), "score");
        assert_eq!(*events.borrow(), 1);
    }

    #[test]
    fn test_reset_restores_initial() {
        let (mut cs, sort, _) = setup();
        sort.set(order(SortKey::Subject));
        assert_eq!(cs.reset("sort").unwrap(), SetStatus::Changed);
        assert_eq!(sort.get(), order(SortKey::Date));
        assert_eq!(cs.reset("sort").unwrap(), SetStatus::Unchanged);
    }

    #[test]
    fn test_validator_warning_and_rejection() {
        let storage = Storage::new();
        let mut cs = ConfigSet::with_default_types();
        cs.register(
            vec![
                VariableDef::new("sort_aux", SortContext::Aux.var_type(), &storage)
                    .with_initial(order(SortKey::Date))
                    .with_validator(|_, _, value| {
                        if value == order(SortKey::Spam) {
                            Validation::reject("spam sorting disabled")
                        } else if SortOrder::from_native(value).is_some_and(SortOrder::is_last) {
                            Validation::warn("last is slow")
                        } else {
                            Validation::Accept
                        }
                    }),
            ],
            RegisterFlags::NONE,
        )
        .unwrap();

        let status = cs.string_set("sort_aux", "last-size").unwrap();
        assert_eq!(status.warning(), Some("last is slow"));
        assert!(status.is_changed());

        let err = cs.string_set("sort_aux", "spam").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validator);
        assert_eq!(cs.string_get("sort_aux").unwrap(), "last-size");
    }

    #[test]
    fn test_listeners_see_committed_changes_only() {
        let (mut cs, _, _) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        cs.add_listener(move |e: &ConfigEvent| log.borrow_mut().push(e.clone()));

        cs.string_set("sort", "size").unwrap();
        cs.string_set("sort", "size").unwrap();
        let _ = cs.string_set("sort", "junk");
        cs.reset("sort").unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, EventKind::Set);
        assert_eq!(seen[0].old, order(SortKey::Date));
        assert_eq!(seen[0].new, order(SortKey::Size));
        assert_eq!(seen[1].kind, EventKind::Reset);
        assert_eq!(seen[1].new, order(SortKey::Date));
    }

    #[test]
    fn test_scoped_variable_mirrors_until_set() {
        let (mut cs, sort, _) = setup();
        let work = cs.create_scope("work", &["sort"]).unwrap();
        assert!(matches!(cs.resolve("work:sort").unwrap(), VarKey::Scoped { .. }));
        assert!(!cs.is_set("work:sort").unwrap());

        cs.string_set("sort", "size").unwrap();
        assert_eq!(cs.string_get("work:sort").unwrap(), "size");

        cs.string_set("work:sort", "from").unwrap();
        assert!(cs.is_set("work:sort").unwrap());
        assert_eq!(cs.string_get("work:sort").unwrap(), "from");
        assert_eq!(sort.get(), order(SortKey::Size));

        cs.string_set("sort", "to").unwrap();
        assert_eq!(cs.string_get("work:sort").unwrap(), "from");

        assert_eq!(cs.reset("work:sort").unwrap(), SetStatus::Changed);
        assert!(!cs.is_set("work:sort").unwrap());
        assert_eq!(cs.string_get("work:sort").unwrap(), "to");
        assert_eq!(cs.reset("work:sort").unwrap(), SetStatus::Unchanged);

        cs.destroy_scope(work).unwrap();
        assert_eq!(cs.string_get("sort").unwrap(), "to");
        assert!(matches!(cs.resolve("work:sort"), Err(Error::UnknownScope(_))));
        assert_eq!(cs.destroy_scope(work), Err(Error::UnknownScope(work.to_string())));
    }

    #[test]
    fn test_setting_scoped_to_parent_value_pins_it() {
        let (mut cs, _, _) = setup();
        cs.create_scope("work", &["sort"]).unwrap();

        assert_eq!(cs.string_set("work:sort", "date").unwrap(), SetStatus::Unchanged);
        assert!(cs.is_set("work:sort").unwrap());

        cs.string_set("sort", "size").unwrap();
        assert_eq!(cs.string_get("work:sort").unwrap(), "date");
    }

    #[test]
    fn test_unshadowed_scope_name_falls_back_to_global() {
        let (mut cs, _, timeout) = setup();
        cs.create_scope("work", &["sort"]).unwrap();

        assert_eq!(
            cs.resolve("work:timeout").unwrap(),
            VarKey::Global(cs.var_id("timeout").unwrap())
        );
        cs.string_set("work:timeout", "60").unwrap();
        assert_eq!(timeout.get(), 60);
    }

    #[test]
    fn test_create_scope_errors() {
        let (mut cs, _, _) = setup();
        cs.create_scope("work", &["sort", "sort"]).unwrap();
        assert_eq!(
            cs.create_scope("work", &["sort"]),
            Err(Error::DuplicateScope("work".into()))
        );
        assert_eq!(
            cs.create_scope("home", &["nope"]),
            Err(Error::UnknownVariable("nope".into()))
        );
        assert!(cs.scope_id("home").is_none());
        assert_eq!(cs.scopes.get(cs.scope_id("work").unwrap()).unwrap().vars.len(), 1);
    }

    #[test]
    fn test_var_key_lookup() {
        let (mut cs, _, _) = setup();
        let work = cs.create_scope("work", &["sort"]).unwrap();
        let key = cs.resolve("work:sort").unwrap();
        assert_eq!(cs.key_name(key), "work:sort");

        cs.native_set(&key, order(SortKey::Score)).unwrap();
        assert_eq!(cs.native_get(&key).unwrap(), order(SortKey::Score));

        cs.destroy_scope(work).unwrap();
        assert!(matches!(cs.native_get(&key), Err(Error::UnknownScope(_))));
    }

    #[test]
    fn test_debug_summarizes() {
        let (cs, _, _) = setup();
        let debug = format!("{cs:?}");
        assert!(debug.contains("vars: 2"));
    }
}
