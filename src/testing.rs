//! Assertions for tests of code built on dimensioned arrays.

use crate::{array::DimensionedArray, engine::ArrayEngine};

/// Asserts that two arrays have the same dims, shape, dtype, unit and values.
///
/// # Panics
///
/// Panics with a message naming the first property that differs.
pub fn assert_identical<E>(a: &DimensionedArray<E>, b: &DimensionedArray<E>)
where
    E: ArrayEngine + PartialEq,
{
    assert_eq!(a.dims(), b.dims(), "dims differ");
    assert_eq!(a.shape(), b.shape(), "shapes differ");
    assert_eq!(a.dtype(), b.dtype(), "dtypes differ");
    assert_eq!(a.unit(), b.unit(), "units differ");
    assert!(a.values() == b.values(), "values differ: {:?} != {:?}", a.values(), b.values());
}
