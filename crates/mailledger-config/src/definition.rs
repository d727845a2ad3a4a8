//! Variable definitions and their storage.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::set::ConfigSet;
use crate::types::DataType;
use crate::validator::{Validation, Validator};

/// In-memory representation of every setting's value.
pub type NativeValue = i64;

/// Delimiter between scope and variable in a scoped name (`account:sort`).
pub const SCOPE_DELIMITER: char = ':';

/// Value cell owned by the collaborator that registers a variable.
///
/// Clones share the same cell: the registry writes through its clone while
/// the owner reads (or, in tests, overwrites) through theirs.
#[derive(Debug, Clone, Default)]
pub struct Storage(Rc<Cell<NativeValue>>);

impl Storage {
    /// Creates a new cell holding zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value.
    #[must_use]
    pub fn get(&self) -> NativeValue {
        self.0.get()
    }

    /// Overwrites the value without any checks.
    pub fn set(&self, value: NativeValue) {
        self.0.set(value);
    }
}

/// Type of a variable: the handler id plus type-specific subtype bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarType {
    /// Which type handler owns the variable.
    pub data_type: DataType,
    /// Flag bits interpreted by the handler (e.g. which sort table applies).
    pub subtype: u16,
}

impl VarType {
    /// Creates a type from an id and raw subtype bits.
    #[must_use]
    pub const fn new(data_type: DataType, subtype: u16) -> Self {
        Self { data_type, subtype }
    }

    /// Returns true if every bit of `flag` is set in the subtype.
    #[must_use]
    pub const fn has_flag(self, flag: u16) -> bool {
        self.subtype & flag == flag
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subtype == 0 {
            write!(f, "{}", self.data_type)
        } else {
            write!(f, "{}/{:#05x}", self.data_type, self.subtype)
        }
    }
}

/// Options for [`ConfigSet::register`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterFlags {
    /// Accept definitions whose type has no handler; they fail at use time.
    pub allow_unknown_type: bool,
}

impl RegisterFlags {
    /// Fail fast on any unknown type.
    pub const NONE: Self = Self {
        allow_unknown_type: false,
    };

    /// Record definitions with unknown types instead of failing.
    pub const ALLOW_UNKNOWN_TYPE: Self = Self {
        allow_unknown_type: true,
    };
}

/// Descriptor of one named, typed setting.
///
/// Built by the owning module and handed to [`ConfigSet::register`].
///
/// ```ignore
/// let sort = Storage::new();
/// let def = VariableDef::new("sort", SortContext::Index.var_type(), &sort)
///     .with_initial(SortOrder::new(SortKey::Date).to_native());
/// ```
#[derive(Clone)]
pub struct VariableDef {
    name: String,
    var_type: VarType,
    initial: NativeValue,
    storage: Storage,
    validator: Option<Validator>,
}

impl VariableDef {
    /// Creates a definition with an initial value of zero and no validator.
    #[must_use]
    pub fn new(name: impl Into<String>, var_type: VarType, storage: &Storage) -> Self {
        Self {
            name: name.into(),
            var_type,
            initial: 0,
            storage: storage.clone(),
            validator: None,
        }
    }

    /// Sets the initial (default) value.
    #[must_use]
    pub const fn with_initial(mut self, initial: NativeValue) -> Self {
        self.initial = initial;
        self
    }

    /// Attaches a validator run before every value-changing mutation.
    #[must_use]
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ConfigSet, &Self, NativeValue) -> Validation + 'static,
    {
        let validator: Validator = Rc::new(validator);
        self.validator = Some(validator);
        self
    }

    /// Returns the variable's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the variable's type.
    #[must_use]
    pub const fn var_type(&self) -> VarType {
        self.var_type
    }

    /// Returns the initial value supplied at registration.
    #[must_use]
    pub const fn initial(&self) -> NativeValue {
        self.initial
    }

    /// Returns the storage cell.
    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    pub(crate) fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }
}

impl fmt::Debug for VariableDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDef")
            .field("name", &self.name)
            .field("var_type", &self.var_type)
            .field("initial", &self.initial)
            .field("storage", &self.storage.get())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Returns true if `name` may be used for a variable or a scope.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(SCOPE_DELIMITER)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_is_shared() {
        let storage = Storage::new();
        let other = storage.clone();
        other.set(42);
        assert_eq!(storage.get(), 42);
    }

    #[test]
    fn test_def_builder() {
        let storage = Storage::new();
        let def = VariableDef::new("Apple", VarType::new(DataType::SORT, 0), &storage)
            .with_initial(1)
            .with_validator(|_, _, _| Validation::Accept);

        assert_eq!(def.name(), "Apple");
        assert_eq!(def.initial(), 1);
        assert_eq!(def.var_type().data_type, DataType::SORT);
        assert!(def.validator().is_some());
        // Registration, not construction, seeds the storage.
        assert_eq!(storage.get(), 0);
    }

    #[test]
    fn test_var_type_flags() {
        let ty = VarType::new(DataType::NUMBER, 0x040);
        assert!(ty.has_flag(0x040));
        assert!(!ty.has_flag(0x080));
        assert_eq!(ty.to_string(), "number/0x040");
        assert_eq!(VarType::new(DataType::BOOL, 0).to_string(), "bool");
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("sort_aux"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("work:sort"));
    }
}
