//! Per-variable validators.

use std::rc::Rc;

use crate::definition::{NativeValue, VariableDef};
use crate::set::ConfigSet;

/// Outcome of running a variable's validator against a proposed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The value is acceptable.
    Accept,
    /// The value is written, but the caller is told about the caveat.
    Warn(String),
    /// The value is refused; nothing is written.
    Reject(String),
}

impl Validation {
    /// Creates a warning outcome.
    #[must_use]
    pub fn warn(message: impl Into<String>) -> Self {
        Self::Warn(message.into())
    }

    /// Creates a rejection outcome.
    #[must_use]
    pub fn reject(message: impl Into<String>) -> Self {
        Self::Reject(message.into())
    }

    /// Returns true unless the value was rejected.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Reject(_))
    }

    /// Get the attached message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Accept => None,
            Self::Warn(m) | Self::Reject(m) => Some(m),
        }
    }
}

/// Validator callback: `(registry, definition, proposed value) -> outcome`.
///
/// The registry is passed read-only so a validator may consult other
/// variables (e.g. refuse `sort_aux` values that conflict with `sort`).
pub type Validator = Rc<dyn Fn(&ConfigSet, &VariableDef, NativeValue) -> Validation>;
