//! Configuration types.
//!
//! Each supported type is a [`TypeHandler`]: a converter between the text
//! form users type (`set sort=reverse-date`) and the native value stored in
//! a variable, plus a domain check for values arriving on the native path.

mod boolean;
mod number;
mod sort;

use std::fmt;

pub use boolean::BoolType;
pub use number::NumberType;
pub use sort::{SortContext, SortKey, SortOrder, SortType};

use crate::definition::{NativeValue, VariableDef};
use crate::error::Result;

/// Identifier of a configuration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataType(pub u16);

impl DataType {
    /// Boolean (`yes`/`no`).
    pub const BOOL: Self = Self(1);
    /// Small signed integer.
    pub const NUMBER: Self = Self(2);
    /// Sort order: key plus `reverse`/`last` modifiers.
    pub const SORT: Self = Self(6);

    /// Returns the well-known name of the type, if it has one.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::BOOL => Some("bool"),
            Self::NUMBER => Some("number"),
            Self::SORT => Some("sort"),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "type#{}", self.0),
        }
    }
}

/// Converter and domain check for one configuration type.
///
/// Handlers are stateless; anything variable-specific (such as which name
/// table a sort variable uses) comes from the definition's subtype bits.
pub trait TypeHandler {
    /// The type id this handler serves.
    fn data_type(&self) -> DataType;

    /// Human-readable type name.
    fn name(&self) -> &'static str;

    /// Parses text into a native value in the type's domain.
    ///
    /// # Errors
    ///
    /// Returns a parse or domain error if the text is not a legal value.
    fn parse(&self, def: &VariableDef, text: &str) -> Result<NativeValue>;

    /// Renders a native value back to its canonical text.
    ///
    /// # Errors
    ///
    /// Returns a domain error if the value is outside the type's domain.
    fn render(&self, def: &VariableDef, value: NativeValue) -> Result<String>;

    /// Checks that a native value lies in the type's domain.
    ///
    /// # Errors
    ///
    /// Returns a domain error describing why the value is illegal.
    fn validate(&self, def: &VariableDef, value: NativeValue) -> Result<()>;
}

/// Handlers registered by [`ConfigSet::with_default_types`](crate::ConfigSet::with_default_types).
#[must_use]
pub fn builtin_handlers() -> Vec<Box<dyn TypeHandler>> {
    vec![Box::new(BoolType), Box::new(NumberType), Box::new(SortType)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_display() {
        assert_eq!(DataType::BOOL.to_string(), "bool");
        assert_eq!(DataType::SORT.to_string(), "sort");
        assert_eq!(DataType(99).to_string(), "type#99");
    }

    #[test]
    fn test_builtin_handlers_match_ids() {
        let ids: Vec<_> = builtin_handlers().iter().map(|h| h.data_type()).collect();
        assert_eq!(ids, vec![DataType::BOOL, DataType::NUMBER, DataType::SORT]);
        for handler in builtin_handlers() {
            assert_eq!(Some(handler.name()), handler.data_type().name());
        }
    }
}
