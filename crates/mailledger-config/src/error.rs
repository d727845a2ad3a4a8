//! Error types for the configuration engine.

use thiserror::Error;

use crate::types::DataType;

/// Errors that can occur in configuration operations.
///
/// No operation that returns one of these has modified any stored value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No variable is registered under this name.
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// The scope part of a scoped name does not exist (or was destroyed).
    #[error("Unknown scope '{0}'")]
    UnknownScope(String),

    /// The variable was soft-registered against a type with no handler.
    #[error("Variable '{name}' has unregistered type {data_type}")]
    UnknownType {
        /// Variable name.
        name: String,
        /// The unregistered type id.
        data_type: DataType,
    },

    /// A variable with this name is already registered.
    #[error("Variable '{0}' is already registered")]
    DuplicateVariable(String),

    /// A scope with this name already exists.
    #[error("Scope '{0}' already exists")]
    DuplicateScope(String),

    /// A handler for this type is already registered.
    #[error("A handler for type {0} is already registered")]
    DuplicateType(DataType),

    /// Variable or scope name is empty or contains the scope delimiter.
    #[error("Invalid name '{0}'")]
    InvalidName(String),

    /// Text does not match the type's grammar.
    #[error("Invalid value '{value}' for '{name}': {reason}")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// The rejected text.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Native value lies outside the type's legal set.
    #[error("Value {value} is out of range for '{name}'")]
    OutOfDomain {
        /// Variable name.
        name: String,
        /// The rejected native value.
        value: i64,
    },

    /// The variable's subtype flags select no valid variant of its type.
    #[error("Invalid subtype {subtype:#05x} for '{name}'")]
    InvalidSubtype {
        /// Variable name.
        name: String,
        /// The offending subtype bits.
        subtype: u16,
    },

    /// The variable's validator declined the new value.
    #[error("Validator rejected '{name}': {message}")]
    Rejected {
        /// Variable name.
        name: String,
        /// Message supplied by the validator.
        message: String,
    },
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Name, scope or type could not be resolved.
    Resolution,
    /// Registration conflict or malformed name.
    Registration,
    /// Text did not parse.
    Parse,
    /// Value outside the type's domain.
    Domain,
    /// Rejected by a validator.
    Validator,
}

impl Error {
    /// Returns the category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownVariable(_) | Self::UnknownScope(_) | Self::UnknownType { .. } => {
                ErrorKind::Resolution
            }
            Self::DuplicateVariable(_)
            | Self::DuplicateScope(_)
            | Self::DuplicateType(_)
            | Self::InvalidName(_) => ErrorKind::Registration,
            Self::InvalidValue { .. } => ErrorKind::Parse,
            Self::OutOfDomain { .. } | Self::InvalidSubtype { .. } => ErrorKind::Domain,
            Self::Rejected { .. } => ErrorKind::Validator,
        }
    }

    pub(crate) fn invalid_value(
        name: &str,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_domain(name: &str, value: i64) -> Self {
        Self::OutOfDomain {
            name: name.to_string(),
            value,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::UnknownVariable("x".into()).kind(),
            ErrorKind::Resolution
        );
        assert_eq!(
            Error::DuplicateScope("fruit".into()).kind(),
            ErrorKind::Registration
        );
        assert_eq!(
            Error::invalid_value("Apple", "junk", "no such sort method").kind(),
            ErrorKind::Parse
        );
        assert_eq!(Error::out_of_domain("Apple", 999).kind(), ErrorKind::Domain);
        assert_eq!(
            Error::Rejected {
                name: "Quince".into(),
                message: "nope".into()
            }
            .kind(),
            ErrorKind::Validator
        );
    }

    #[test]
    fn test_display_messages() {
        let err = Error::invalid_value("Damson", "junk", "no such sort method");
        assert_eq!(
            err.to_string(),
            "Invalid value 'junk' for 'Damson': no such sort method"
        );

        let err = Error::InvalidSubtype {
            name: "Raspberry".into(),
            subtype: 0x240,
        };
        assert_eq!(err.to_string(), "Invalid subtype 0x240 for 'Raspberry'");
    }
}
