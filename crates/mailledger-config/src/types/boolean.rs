//! Boolean type.

use crate::definition::{NativeValue, VariableDef};
use crate::error::{Error, Result};

use super::{DataType, TypeHandler};

const TRUE_WORDS: &[&str] = &["yes", "y", "true", "on", "1"];
const FALSE_WORDS: &[&str] = &["no", "n", "false", "off", "0"];

/// Handler for [`DataType::BOOL`] variables.
///
/// Accepts the usual spellings case-insensitively; renders `yes`/`no`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolType;

impl TypeHandler for BoolType {
    fn data_type(&self) -> DataType {
        DataType::BOOL
    }

    fn name(&self) -> &'static str {
        "bool"
    }

    fn parse(&self, def: &VariableDef, text: &str) -> Result<NativeValue> {
        let matches = |words: &[&str]| words.iter().any(|w| w.eq_ignore_ascii_case(text));
        if matches(TRUE_WORDS) {
            Ok(1)
        } else if matches(FALSE_WORDS) {
            Ok(0)
        } else {
            Err(Error::invalid_value(def.name(), text, "expected yes or no"))
        }
    }

    fn render(&self, def: &VariableDef, value: NativeValue) -> Result<String> {
        self.validate(def, value)?;
        Ok(if value == 1 { "yes" } else { "no" }.to_string())
    }

    fn validate(&self, def: &VariableDef, value: NativeValue) -> Result<()> {
        match value {
            0 | 1 => Ok(()),
            _ => Err(Error::out_of_domain(def.name(), value)),
        }
    }
}
