//! Opaque text units.
//!
//! The unit is stored as text and never interpreted. The empty string is the
//! dimensionless unit. Conversion is only possible between identical units.

use std::fmt;

use super::UnitSystem;
use crate::error::{DimsError, Result};

/// A unit stored as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StringUnit {
    value: String,
}

impl StringUnit {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn dimensionless() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_dimensionless(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for StringUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            f.write_str("dimensionless")
        } else {
            f.write_str(&self.value)
        }
    }
}

/// The string unit system.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringUnits;

impl UnitSystem for StringUnits {
    type Unit = StringUnit;

    fn parse(&self, literal: &str) -> Result<StringUnit> {
        Ok(StringUnit::new(literal.trim()))
    }

    fn dimensionless(&self) -> StringUnit {
        StringUnit::dimensionless()
    }

    fn multiply(&self, a: &StringUnit, b: &StringUnit) -> Result<StringUnit> {
        let unit = if b.is_dimensionless() {
            a.clone()
        } else if a.is_dimensionless() {
            b.clone()
        } else {
            StringUnit::new(format!("({})*({})", a.value, b.value))
        };
        Ok(unit)
    }

    fn divide(&self, a: &StringUnit, b: &StringUnit) -> Result<StringUnit> {
        let unit = if b.is_dimensionless() {
            a.clone()
        } else if a == b {
            StringUnit::dimensionless()
        } else {
            StringUnit::new(format!("({})/({})", a.value, b.value))
        };
        Ok(unit)
    }

    fn get_scale(&self, src: &StringUnit, dst: &StringUnit) -> Result<f64> {
        if src == dst {
            Ok(1.0)
        } else {
            Err(DimsError::units(format!(
                "Cannot convert string unit '{}' to '{}'",
                src, dst
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply() {
        let m = StringUnit::new("m");
        let one = StringUnit::dimensionless();
        assert_eq!(StringUnits.multiply(&m, &one).unwrap(), m);
        assert_eq!(StringUnits.multiply(&one, &m).unwrap(), m);
        assert_eq!(StringUnits.multiply(&m, &m).unwrap().as_str(), "(m)*(m)");
        assert_eq!(StringUnits.multiply(&one, &one).unwrap(), one);
    }

    #[test]
    fn test_divide() {
        let m = StringUnit::new("m");
        let s = StringUnit::new("s");
        assert_eq!(StringUnits.divide(&m, &s).unwrap().as_str(), "(m)/(s)");
        assert!(StringUnits.divide(&m, &m).unwrap().is_dimensionless());
    }

    #[test]
    fn test_get_scale() {
        let m = StringUnit::new("m");
        assert_eq!(StringUnits.get_scale(&m, &m).unwrap(), 1.0);
        assert!(StringUnits.get_scale(&m, &StringUnit::new("mm")).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(StringUnit::dimensionless().to_string(), "dimensionless");
        assert_eq!(StringUnit::new("m").to_string(), "m");
    }
}
