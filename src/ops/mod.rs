//! Operations on dimensioned arrays.
//!
//! Every operation is a free function taking arrays by reference and
//! returning a new array. Elementwise operations go through [`unary`] and
//! [`elemwise_binary`], which pair a values operation with a unit policy from
//! [`unit_policy`].

mod arithmetic;
mod indexing;
mod manipulation;
mod reduction;

pub use arithmetic::*;
pub use indexing::*;
pub use manipulation::*;
pub use reduction::*;

use log::trace;

use crate::{
    align::{broadcast_and_transpose, check_alignment, merge_dims},
    array::DimensionedArray,
    dimension::format_dims,
    engine::ArrayEngine,
    error::Result,
    units::Unit,
};

/// Applies `values_op` to the values and `unit_op` to the unit of `x`.
///
/// `unit_op` is not called when `x` has no unit.
pub fn unary<E, V, U>(x: &DimensionedArray<E>, values_op: V, unit_op: U) -> Result<DimensionedArray<E>>
where
    E: ArrayEngine,
    V: FnOnce(&E) -> Result<E>,
    U: FnOnce(&Unit) -> Result<Unit>,
{
    let unit = x.unit().map(unit_op).transpose()?;
    let values = values_op(x.values())?;
    DimensionedArray::new(x.dims().to_vec(), values, unit)
}

/// Applies a binary operation after aligning `x` and `y` by dim name.
///
/// The result dims are [`merge_dims`] of the operand dims. The result has no
/// unit if neither operand has one; otherwise it is `unit_op(x.unit, y.unit)`,
/// and `unit_op` decides whether a missing unit on one side is acceptable.
///
/// # Errors
///
/// Returns a dimension error if a shared dim has different extents.
pub fn elemwise_binary<E, V, U>(
    x: &DimensionedArray<E>,
    y: &DimensionedArray<E>,
    values_op: V,
    unit_op: U,
) -> Result<DimensionedArray<E>>
where
    E: ArrayEngine,
    V: FnOnce(&E, &E) -> Result<E>,
    U: FnOnce(Option<&Unit>, Option<&Unit>) -> Result<Unit>,
{
    check_alignment(x, y)?;
    let dims = merge_dims(x.dims(), y.dims());
    trace!(
        "aligning {} and {} to {}",
        format_dims(x.dims()),
        format_dims(y.dims()),
        format_dims(&dims)
    );
    let unit = match (x.unit(), y.unit()) {
        (None, None) => None,
        (a, b) => Some(unit_op(a, b)?),
    };
    let lhs = broadcast_and_transpose(x, &dims)?;
    let rhs = broadcast_and_transpose(y, &dims)?;
    DimensionedArray::new(dims, values_op(&lhs, &rhs)?, unit)
}

/// Unit policies of the built-in elementwise operations.
pub mod unit_policy {
    use crate::error::{DimsError, Result};
    use crate::units::Unit;

    /// Keeps the unit unchanged.
    pub fn unchanged(unit: &Unit) -> Result<Unit> {
        Ok(unit.clone())
    }

    /// Requires both operands to carry the same unit.
    pub fn identical(a: Option<&Unit>, b: Option<&Unit>) -> Result<Unit> {
        match (a, b) {
            (Some(a), Some(b)) if a == b => Ok(a.clone()),
            _ => Err(DimsError::units(format!(
                "Units must be identical, got {} and {}",
                describe(a),
                describe(b)
            ))),
        }
    }

    pub fn multiply(a: Option<&Unit>, b: Option<&Unit>) -> Result<Unit> {
        let (a, b) = both(a, b)?;
        a.multiply(b)
    }

    pub fn divide(a: Option<&Unit>, b: Option<&Unit>) -> Result<Unit> {
        let (a, b) = both(a, b)?;
        a.divide(b)
    }

    /// Requires a dimensionless unit, i.e. one with `u * u == u`.
    pub fn dimensionless(unit: &Unit) -> Result<Unit> {
        if unit.is_idempotent() {
            Ok(unit.clone())
        } else {
            Err(DimsError::units(format!("Unit must be dimensionless, got '{}'", unit)))
        }
    }

    fn both<'a>(a: Option<&'a Unit>, b: Option<&'a Unit>) -> Result<(&'a Unit, &'a Unit)> {
        match (a, b) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(DimsError::units(format!(
                "Cannot combine {} with {}",
                describe(a),
                describe(b)
            ))),
        }
    }

    fn describe(unit: Option<&Unit>) -> String {
        unit.map_or_else(|| "no unit".to_string(), |u| format!("'{}'", u))
    }
}
