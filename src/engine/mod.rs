//! Array engine abstraction.
//!
//! This module provides the [`ArrayEngine`] trait, the capability set the
//! named-dimension layer needs from a numeric array backend, and the
//! [`ArrayCreation`] extension used by the creation functions. All axis
//! arguments are positional; the mapping from dim names to axes happens in the
//! callers. An engine may evaluate eagerly or defer work; nothing here forces
//! evaluation.

#[cfg(feature = "ndarray-backend")]
pub mod ndarray;

#[cfg(feature = "ndarray-backend")]
pub use self::ndarray::NdValues;

use std::fmt::{self, Debug};

use crate::error::Result;
use crate::index::AxisIndex;

/// Element type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DType {
    /// Returns `true` for integer and floating types.
    pub fn is_numeric(self) -> bool {
        !matches!(self, DType::Bool)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, DType::Int32 | DType::Int64)
    }

    /// Returns the common type two operands are cast to before a binary op.
    pub fn promote(self, other: DType) -> DType {
        match (self, other) {
            (DType::Int64, DType::Float32) | (DType::Float32, DType::Int64) => DType::Float64,
            (a, b) => a.max(b),
        }
    }

    /// Returns the floating type statistics of this type are computed in.
    pub fn floating(self) -> DType {
        match self {
            DType::Float32 => DType::Float32,
            _ => DType::Float64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Bool => "bool",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

/// Reduction kernels an engine must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    All,
    Any,
    Max,
    Min,
    Sum,
    Mean,
    Prod,
    Std,
    Var,
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reduction::All => "all",
            Reduction::Any => "any",
            Reduction::Max => "max",
            Reduction::Min => "min",
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Prod => "prod",
            Reduction::Std => "std",
            Reduction::Var => "var",
        };
        f.write_str(name)
    }
}

/// Engine-level parameters of a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReduceParams {
    /// Degrees-of-freedom correction for `std` and `var`.
    pub correction: f64,
    /// Accumulator/result type for `sum` and `prod`.
    pub dtype: Option<DType>,
}

/// A trait for numeric array backends.
///
/// Implementations own their storage. Operations return new arrays; only
/// [`ArrayEngine::assign`] writes into existing storage.
pub trait ArrayEngine: Clone + Debug + Sized {
    /// Returns the element type.
    fn dtype(&self) -> DType;

    /// Returns the extent of every axis.
    fn shape(&self) -> Vec<usize>;

    /// Returns the number of axes.
    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Returns the total number of elements.
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// Reinterprets the elements (row-major) with a new shape.
    fn reshape(&self, shape: &[usize]) -> Result<Self>;

    /// Reorders axes; `axes[i]` is the source axis of output axis `i`.
    fn permute_dims(&self, axes: &[usize]) -> Result<Self>;

    /// Inserts a unit-extent axis at `axis`.
    fn expand_dims(&self, axis: usize) -> Result<Self>;

    /// Broadcasts unit-extent axes to `shape` (same rank).
    fn broadcast_to(&self, shape: &[usize]) -> Result<Self>;

    /// Removes the given unit-extent axes.
    fn squeeze(&self, axes: &[usize]) -> Result<Self>;

    /// Joins arrays along an existing axis.
    fn concat(arrays: &[Self], axis: usize) -> Result<Self>;

    /// Joins arrays along a new axis inserted at `axis`.
    fn stack(arrays: &[Self], axis: usize) -> Result<Self>;

    /// Gathers elements along `axis` at the integer positions in `indices`.
    fn take(&self, indices: &Self, axis: usize) -> Result<Self>;

    /// Selects a sub-array; one key entry per axis, indexed axes are dropped.
    fn slice(&self, key: &[AxisIndex]) -> Result<Self>;

    /// Writes `value` into the sub-array selected by `key`.
    ///
    /// `value` has the rank of the selection, with unit-extent axes where it
    /// is broadcast.
    fn assign(&mut self, key: &[AxisIndex], value: &Self) -> Result<()>;

    fn neg(&self) -> Result<Self>;

    fn exp(&self) -> Result<Self>;

    /// Elementwise binary ops. Operands have equal rank and their extents
    /// agree or are 1.
    fn add(&self, other: &Self) -> Result<Self>;

    fn sub(&self, other: &Self) -> Result<Self>;

    fn mul(&self, other: &Self) -> Result<Self>;

    fn div(&self, other: &Self) -> Result<Self>;

    /// Multiplies every element by a scalar.
    fn scale(&self, factor: f64) -> Result<Self>;

    /// Reduces over `axes`, removing them from the result.
    fn reduce(&self, op: Reduction, axes: &[usize], params: &ReduceParams) -> Result<Self>;

    /// Casts to `dtype`. With `copy == false` an array already of that type
    /// may be returned without copying.
    fn astype(&self, dtype: DType, copy: bool) -> Result<Self>;
}

/// Constructors an engine offers to the creation functions.
pub trait ArrayCreation: ArrayEngine {
    fn arange(start: f64, stop: f64, step: f64, dtype: Option<DType>) -> Result<Self>;

    fn linspace(start: f64, stop: f64, num: usize, dtype: Option<DType>) -> Result<Self>;

    fn full(shape: &[usize], fill: f64, dtype: DType) -> Result<Self>;

    fn zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::full(shape, 0.0, dtype)
    }

    fn ones(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::full(shape, 1.0, dtype)
    }

    /// Allocates an array whose contents are unspecified.
    fn empty(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::zeros(shape, dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promote() {
        assert_eq!(DType::Int32.promote(DType::Int64), DType::Int64);
        assert_eq!(DType::Int64.promote(DType::Float32), DType::Float64);
        assert_eq!(DType::Float32.promote(DType::Int32), DType::Float32);
        assert_eq!(DType::Bool.promote(DType::Int32), DType::Int32);
        assert_eq!(DType::Float64.promote(DType::Float32), DType::Float64);
    }

    #[test]
    fn test_dtype_kinds() {
        assert!(!DType::Bool.is_numeric());
        assert!(DType::Int32.is_numeric());
        assert!(DType::Float32.is_floating());
        assert!(DType::Int64.is_integer());
        assert_eq!(DType::Int32.floating(), DType::Float64);
    }
}
