//! Pluggable unit systems.
//!
//! A [`UnitSystem`] owns unit values, their algebra and conversion scales.
//! Every supported system has a variant in the closed [`Unit`] type, so the
//! system owning a unit value is found with a `match` ([`Unit::backend`])
//! rather than by asking the caller to name it.

mod string;
#[cfg(feature = "scaled-units")]
mod scaled;

pub use string::{StringUnit, StringUnits};
#[cfg(feature = "scaled-units")]
pub use scaled::{ScaledUnit, ScaledUnits};

use std::fmt::{self, Debug, Display};
use std::ops::{Div, Mul};

use crate::error::{DimsError, Result};

/// Capability set required of a unit backend.
pub trait UnitSystem {
    type Unit: Clone + PartialEq + Debug + Display;

    /// Builds a unit from a backend-agnostic literal such as `"m"`.
    fn parse(&self, literal: &str) -> Result<Self::Unit>;

    fn dimensionless(&self) -> Self::Unit;

    /// Fails when the product is not representable in this system.
    fn multiply(&self, a: &Self::Unit, b: &Self::Unit) -> Result<Self::Unit>;

    fn divide(&self, a: &Self::Unit, b: &Self::Unit) -> Result<Self::Unit>;

    /// Returns the factor converting a quantity in `src` into `dst`.
    fn get_scale(&self, src: &Self::Unit, dst: &Self::Unit) -> Result<f64>;
}

/// A unit value from one of the supported backends.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    String(StringUnit),
    #[cfg(feature = "scaled-units")]
    Scaled(ScaledUnit),
}

/// The table of supported unit backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitBackend {
    String,
    #[cfg(feature = "scaled-units")]
    Scaled,
}

impl Unit {
    /// Returns the backend owning this unit.
    pub fn backend(&self) -> UnitBackend {
        match self {
            Unit::String(_) => UnitBackend::String,
            #[cfg(feature = "scaled-units")]
            Unit::Scaled(_) => UnitBackend::Scaled,
        }
    }

    /// Multiplies two units of the same backend.
    pub fn multiply(&self, other: &Unit) -> Result<Unit> {
        match (self, other) {
            (Unit::String(a), Unit::String(b)) => StringUnits.multiply(a, b).map(Unit::String),
            #[cfg(feature = "scaled-units")]
            (Unit::Scaled(a), Unit::Scaled(b)) => ScaledUnits.multiply(a, b).map(Unit::Scaled),
            #[allow(unreachable_patterns)]
            _ => Err(mixed_backends(self, other)),
        }
    }

    /// Divides two units of the same backend.
    pub fn divide(&self, other: &Unit) -> Result<Unit> {
        match (self, other) {
            (Unit::String(a), Unit::String(b)) => StringUnits.divide(a, b).map(Unit::String),
            #[cfg(feature = "scaled-units")]
            (Unit::Scaled(a), Unit::Scaled(b)) => ScaledUnits.divide(a, b).map(Unit::Scaled),
            #[allow(unreachable_patterns)]
            _ => Err(mixed_backends(self, other)),
        }
    }

    /// Returns `true` if `self * self == self`.
    ///
    /// Only the dimensionless unit of a backend has this property.
    pub fn is_idempotent(&self) -> bool {
        self.multiply(self).map_or(false, |squared| squared == *self)
    }

    /// Returns the factor converting a quantity in `self` into `dst`.
    pub fn get_scale(&self, dst: &Unit) -> Result<f64> {
        self.backend().get_scale(self, dst)
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::String(u) => Display::fmt(u, f),
            #[cfg(feature = "scaled-units")]
            Unit::Scaled(u) => Display::fmt(u, f),
        }
    }
}

impl From<StringUnit> for Unit {
    fn from(unit: StringUnit) -> Self {
        Unit::String(unit)
    }
}

#[cfg(feature = "scaled-units")]
impl From<ScaledUnit> for Unit {
    fn from(unit: ScaledUnit) -> Self {
        Unit::Scaled(unit)
    }
}

impl Mul for &Unit {
    type Output = Result<Unit>;

    fn mul(self, rhs: &Unit) -> Self::Output {
        self.multiply(rhs)
    }
}

impl Div for &Unit {
    type Output = Result<Unit>;

    fn div(self, rhs: &Unit) -> Self::Output {
        self.divide(rhs)
    }
}

#[cfg(feature = "scaled-units")]
const ALL_BACKENDS: &[UnitBackend] = &[UnitBackend::String, UnitBackend::Scaled];
#[cfg(not(feature = "scaled-units"))]
const ALL_BACKENDS: &[UnitBackend] = &[UnitBackend::String];

impl UnitBackend {
    /// Returns every compiled-in backend.
    pub fn all() -> &'static [UnitBackend] {
        ALL_BACKENDS
    }

    pub fn name(self) -> &'static str {
        match self {
            UnitBackend::String => "string",
            #[cfg(feature = "scaled-units")]
            UnitBackend::Scaled => "scaled",
        }
    }

    /// Builds a unit of this backend from a literal.
    pub fn parse(self, literal: &str) -> Result<Unit> {
        match self {
            UnitBackend::String => StringUnits.parse(literal).map(Unit::String),
            #[cfg(feature = "scaled-units")]
            UnitBackend::Scaled => ScaledUnits.parse(literal).map(Unit::Scaled),
        }
    }

    pub fn dimensionless(self) -> Unit {
        match self {
            UnitBackend::String => Unit::String(StringUnits.dimensionless()),
            #[cfg(feature = "scaled-units")]
            UnitBackend::Scaled => Unit::Scaled(ScaledUnits.dimensionless()),
        }
    }

    /// Returns the canonical form of `unit` in this backend.
    ///
    /// Units owned by another backend are re-parsed from their text.
    pub fn canonical(self, unit: &Unit) -> Result<Unit> {
        if unit.backend() == self {
            Ok(unit.clone())
        } else {
            self.parse(&unit_literal(unit))
        }
    }

    /// Returns the factor converting a quantity in `src` into `dst`.
    pub fn get_scale(self, src: &Unit, dst: &Unit) -> Result<f64> {
        match (self, src, dst) {
            (UnitBackend::String, Unit::String(a), Unit::String(b)) => StringUnits.get_scale(a, b),
            #[cfg(feature = "scaled-units")]
            (UnitBackend::Scaled, Unit::Scaled(a), Unit::Scaled(b)) => ScaledUnits.get_scale(a, b),
            #[allow(unreachable_patterns)]
            _ => Err(mixed_backends(src, dst)),
        }
    }
}

impl Display for UnitBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the backend owning `unit`.
pub fn units_namespace(unit: &Unit) -> UnitBackend {
    unit.backend()
}

/// Unit argument of the creation functions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnitArg {
    /// Dimensionless for numeric dtypes, no unit otherwise.
    #[default]
    Unspecified,
    /// A unit literal parsed by the configured backend.
    Explicit(String),
    /// No unit concept applies.
    None,
}

impl From<&str> for UnitArg {
    fn from(literal: &str) -> Self {
        UnitArg::Explicit(literal.to_string())
    }
}

impl From<String> for UnitArg {
    fn from(literal: String) -> Self {
        UnitArg::Explicit(literal)
    }
}

impl From<Option<&str>> for UnitArg {
    fn from(literal: Option<&str>) -> Self {
        literal.map_or(UnitArg::None, UnitArg::from)
    }
}

fn unit_literal(unit: &Unit) -> String {
    match unit {
        Unit::String(u) => u.as_str().to_string(),
        #[cfg(feature = "scaled-units")]
        Unit::Scaled(u) => u.symbol().to_string(),
    }
}

fn mixed_backends(a: &Unit, b: &Unit) -> DimsError {
    DimsError::units(format!(
        "Cannot combine units from different unit systems: '{}' ({}) and '{}' ({})",
        a,
        a.backend(),
        b,
        b.backend()
    ))
}
