//! Number type.

use crate::definition::{NativeValue, VariableDef};
use crate::error::{Error, Result};

use super::{DataType, TypeHandler};

/// Handler for [`DataType::NUMBER`] variables: a signed 16-bit integer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberType;

impl NumberType {
    /// Subtype flag forbidding negative values.
    pub const NOT_NEGATIVE: u16 = 0x040;
}

impl TypeHandler for NumberType {
    fn data_type(&self) -> DataType {
        DataType::NUMBER
    }

    fn name(&self) -> &'static str {
        "number"
    }

    fn parse(&self, def: &VariableDef, text: &str) -> Result<NativeValue> {
        let value = text
            .trim()
            .parse::<i16>()
            .map_err(|e| Error::invalid_value(def.name(), text, e.to_string()))?;
        let value = NativeValue::from(value);
        self.validate(def, value)?;
        Ok(value)
    }

    fn render(&self, def: &VariableDef, value: NativeValue) -> Result<String> {
        self.validate(def, value)?;
        Ok(value.to_string())
    }

    fn validate(&self, def: &VariableDef, value: NativeValue) -> Result<()> {
        let in_range = i16::try_from(value).is_ok();
        let sign_ok = value >= 0 || !def.var_type().has_flag(Self::NOT_NEGATIVE);
        if in_range && sign_ok {
            Ok(())
        } else {
            Err(Error::out_of_domain(def.name(), value))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::definition::{Storage, VarType};
    use crate::error::ErrorKind;

    fn def(subtype: u16) -> VariableDef {
        VariableDef::new("timeout", VarType::new(DataType::NUMBER, subtype), &Storage::new())
    }

    #[test]
    fn test_parse() {
        let d = def(0);
        assert_eq!(NumberType.parse(&d, "42").unwrap(), 42);
        assert_eq!(NumberType.parse(&d, "-7").unwrap(), -7);
        assert_eq!(NumberType.parse(&d, " 10 ").unwrap(), 10);
        assert_eq!(
            NumberType.parse(&d, "forty").unwrap_err().kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            NumberType.parse(&d, "40000").unwrap_err().kind(),
            ErrorKind::Parse
        );
    }

    #[test]
    fn test_not_negative() {
        let d = def(NumberType::NOT_NEGATIVE);
        assert_eq!(
            NumberType.parse(&d, "-1").unwrap_err().kind(),
            ErrorKind::Domain
        );
        assert!(NumberType.validate(&d, 0).is_ok());
        assert!(NumberType.validate(&d, -1).is_err());
    }

    #[test]
    fn test_render_checks_range() {
        let d = def(0);
        assert_eq!(NumberType.render(&d, -3).unwrap(), "-3");
        assert!(NumberType.render(&d, 70_000).is_err());
    }
}
