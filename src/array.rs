//! The named-dimension array type.
//!
//! A [`DimensionedArray`] pairs engine values with a dim name per axis and an
//! optional unit. Operations never mutate an array; they build a new one. The
//! only exception is [`DimensionedArray::set`], which writes into the value
//! storage and leaves dims and unit alone.

use log::debug;

use crate::{
    dimension::{validate_dims, Dim, Dims, Sizes},
    engine::{ArrayEngine, DType},
    error::{DimsError, Result},
    units::{Unit, UnitBackend},
};

/// An array with named dims and an optional unit.
///
/// # Type Parameters
///
/// * `E`: The array engine owning the numeric values.
///
/// `unit == None` means no unit concept applies, which is distinct from a
/// dimensionless unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionedArray<E: ArrayEngine> {
    values: E,
    dims: Dims,
    unit: Option<Unit>,
}

impl<E: ArrayEngine> DimensionedArray<E> {
    /// Creates a new array.
    ///
    /// # Errors
    ///
    /// Returns a dimension error if the number of dims differs from the rank
    /// of `values` or if a dim name repeats.
    pub fn new<D>(dims: D, values: E, unit: Option<Unit>) -> Result<Self>
    where
        D: IntoIterator,
        D::Item: Into<Dim>,
    {
        let dims: Dims = dims.into_iter().map(Into::into).collect();
        validate_dims(&dims, values.ndim())?;
        Ok(Self { values, dims, unit })
    }

    pub fn values(&self) -> &E {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut E {
        &mut self.values
    }

    pub fn into_values(self) -> E {
        self.values
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// Returns the sole dim of a 1-D array.
    ///
    /// # Errors
    ///
    /// Returns a dimension error for any other rank.
    pub fn dim(&self) -> Result<&Dim> {
        match self.dims.as_slice() {
            [dim] => Ok(dim),
            _ => Err(DimsError::dimension(format!(
                "Expected 1 dimension, got {}",
                self.dims.len()
            ))),
        }
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.values.shape()
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn size(&self) -> usize {
        self.values.size()
    }

    /// Returns the dim-to-extent mapping, in dims order.
    pub fn sizes(&self) -> Sizes {
        Sizes::from_pairs(self.dims.iter().cloned().zip(self.values.shape()))
    }

    /// Returns the backend owning this array's unit, if it has one.
    pub fn units_namespace(&self) -> Option<UnitBackend> {
        self.unit.as_ref().map(Unit::backend)
    }

    /// Returns a copy with the same values and dims but a different unit.
    pub fn with_unit(&self, unit: Option<Unit>) -> Self {
        Self {
            values: self.values.clone(),
            dims: self.dims.clone(),
            unit,
        }
    }

    /// Casts the values to `dtype`, keeping dims and unit.
    pub fn astype(&self, dtype: DType, copy: bool) -> Result<Self> {
        Ok(Self {
            values: self.values.astype(dtype, copy)?,
            dims: self.dims.clone(),
            unit: self.unit.clone(),
        })
    }

    /// Converts to a different dtype, unit, or both.
    ///
    /// `unit` is a literal parsed by the backend of the current unit. When
    /// both are given, the conversion into the more general representation
    /// runs first, and only that first step honors `copy`. The result always
    /// has the requested dtype, even when scaling widened an integer array to
    /// float64 on the way.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if neither `dtype` nor `unit` is given,
    /// and a units error if the array has no unit or the units are
    /// incompatible.
    pub fn to(&self, dtype: Option<DType>, unit: Option<&str>, copy: bool) -> Result<Self> {
        match (dtype, unit) {
            (None, None) => Err(DimsError::invalid_input("Must provide dtype or unit or both")),
            (Some(dtype), None) => self.astype(dtype, copy),
            (None, Some(unit)) => self.to_unit(unit, copy),
            (Some(dtype), Some(unit)) => {
                if converts_dtype_first(self.dtype(), dtype) {
                    debug!("to: converting dtype {} -> {} before unit", self.dtype(), dtype);
                    self.astype(dtype, copy)?.to_unit(unit, false)?.astype(dtype, false)
                } else {
                    debug!("to: converting unit before dtype {} -> {}", self.dtype(), dtype);
                    self.to_unit(unit, copy)?.astype(dtype, false)
                }
            }
        }
    }

    fn to_unit(&self, literal: &str, copy: bool) -> Result<Self> {
        let current = self.unit.as_ref().ok_or_else(|| {
            DimsError::units(format!(
                "Cannot convert an array without a unit to '{}'",
                literal
            ))
        })?;
        let target = current.backend().parse(literal)?;
        let scale = current.get_scale(&target)?;
        let values = if scale != 1.0 {
            self.values.scale(scale)?
        } else if copy {
            self.values.astype(self.dtype(), true)?
        } else {
            self.values.clone()
        };
        Ok(Self {
            values,
            dims: self.dims.clone(),
            unit: Some(target),
        })
    }
}

/// Decides whether `to` converts the dtype before the unit.
///
/// The wider or more general representation is produced first so that the
/// scale multiplication does not run at reduced precision.
fn converts_dtype_first(src: DType, dst: DType) -> bool {
    match (src, dst) {
        (_, DType::Float64) => true,
        (DType::Float64, _) => false,
        (_, DType::Float32) => true,
        (DType::Float32, _) => false,
        (DType::Int64, DType::Int32) => false,
        _ => true,
    }
}
