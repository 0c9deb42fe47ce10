//! Arithmetic operations for dimensioned arrays.

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::{elemwise_binary, unary, unit_policy};
use crate::{array::DimensionedArray, engine::ArrayEngine, error::Result};

/// Element-wise negation. The unit is unchanged.
pub fn neg<E: ArrayEngine>(x: &DimensionedArray<E>) -> Result<DimensionedArray<E>> {
    unary(x, E::neg, unit_policy::unchanged)
}

/// Element-wise exponential. The unit must be dimensionless.
pub fn exp<E: ArrayEngine>(x: &DimensionedArray<E>) -> Result<DimensionedArray<E>> {
    unary(x, E::exp, unit_policy::dimensionless)
}

/// Element-wise addition of two arrays with identical units.
pub fn add<E: ArrayEngine>(
    lhs: &DimensionedArray<E>,
    rhs: &DimensionedArray<E>,
) -> Result<DimensionedArray<E>> {
    elemwise_binary(lhs, rhs, E::add, unit_policy::identical)
}

/// Element-wise subtraction of two arrays with identical units.
pub fn sub<E: ArrayEngine>(
    lhs: &DimensionedArray<E>,
    rhs: &DimensionedArray<E>,
) -> Result<DimensionedArray<E>> {
    elemwise_binary(lhs, rhs, E::sub, unit_policy::identical)
}

/// Element-wise multiplication. Units multiply.
pub fn mul<E: ArrayEngine>(
    lhs: &DimensionedArray<E>,
    rhs: &DimensionedArray<E>,
) -> Result<DimensionedArray<E>> {
    elemwise_binary(lhs, rhs, E::mul, unit_policy::multiply)
}

/// Element-wise true division. Units divide.
pub fn div<E: ArrayEngine>(
    lhs: &DimensionedArray<E>,
    rhs: &DimensionedArray<E>,
) -> Result<DimensionedArray<E>> {
    elemwise_binary(lhs, rhs, E::div, unit_policy::divide)
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident) => {
        impl<'a, E: ArrayEngine> $trait<&'a DimensionedArray<E>> for &'a DimensionedArray<E> {
            type Output = Result<DimensionedArray<E>>;

            fn $method(self, rhs: &'a DimensionedArray<E>) -> Self::Output {
                $method(self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
impl_binary_op!(Div, div);

impl<E: ArrayEngine> Neg for &DimensionedArray<E> {
    type Output = Result<DimensionedArray<E>>;

    fn neg(self) -> Self::Output {
        neg(self)
    }
}
