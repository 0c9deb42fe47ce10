//! Factories pairing an array engine with a unit backend.

use std::marker::PhantomData;

use log::trace;

use crate::{
    array::DimensionedArray,
    dimension::Dim,
    engine::{ArrayCreation, DType},
    error::{DimsError, Result},
    units::{Unit, UnitArg, UnitBackend},
};

/// Creates dimensioned arrays backed by the engine `E`.
///
/// Units given as literals are parsed by the configured backend. With
/// [`UnitArg::Unspecified`] numeric arrays are dimensionless and bool arrays
/// have no unit.
///
/// # Examples
///
/// ```
/// use dimarray::{CreationFunctions, DType, NdValues, UnitBackend};
///
/// let dms = CreationFunctions::<NdValues>::new(Some(UnitBackend::String));
/// let x = dms.arange("x", 0.0, 4.0, 1.0, None, "m").unwrap();
/// assert_eq!(x.shape(), vec![4]);
/// assert_eq!(x.dtype(), DType::Int64);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CreationFunctions<E: ArrayCreation> {
    units: Option<UnitBackend>,
    marker: PhantomData<E>,
}

impl<E: ArrayCreation> CreationFunctions<E> {
    pub fn new(units: Option<UnitBackend>) -> Self {
        Self {
            units,
            marker: PhantomData,
        }
    }

    /// Returns the configured unit backend.
    pub fn units(&self) -> Option<UnitBackend> {
        self.units
    }

    fn resolve_unit(&self, unit: UnitArg, dtype: DType) -> Result<Option<Unit>> {
        match (unit, self.units) {
            (UnitArg::None, _) => Ok(None),
            (UnitArg::Unspecified, Some(backend)) if dtype.is_numeric() => {
                Ok(Some(backend.dimensionless()))
            }
            (UnitArg::Unspecified, _) => Ok(None),
            (UnitArg::Explicit(literal), Some(backend)) => backend.parse(&literal).map(Some),
            (UnitArg::Explicit(literal), None) => Err(DimsError::units(format!(
                "Cannot create unit '{}' without a unit backend",
                literal
            ))),
        }
    }

    fn build(&self, dims: Vec<Dim>, values: E, unit: UnitArg) -> Result<DimensionedArray<E>> {
        let unit = self.resolve_unit(unit, values.dtype())?;
        trace!("creating {} array with unit {:?}", values.dtype(), unit);
        DimensionedArray::new(dims, values, unit)
    }

    /// Evenly spaced values in `[start, stop)` along `dim`.
    ///
    /// The dtype defaults to int64 when all bounds are integral and float64
    /// otherwise.
    pub fn arange(
        &self,
        dim: impl Into<Dim>,
        start: f64,
        stop: f64,
        step: f64,
        dtype: Option<DType>,
        unit: impl Into<UnitArg>,
    ) -> Result<DimensionedArray<E>> {
        let values = E::arange(start, stop, step, dtype)?;
        self.build(vec![dim.into()], values, unit.into())
    }

    /// `num` evenly spaced values from `start` to `stop` inclusive along `dim`.
    pub fn linspace(
        &self,
        dim: impl Into<Dim>,
        start: f64,
        stop: f64,
        num: usize,
        dtype: Option<DType>,
        unit: impl Into<UnitArg>,
    ) -> Result<DimensionedArray<E>> {
        let values = E::linspace(start, stop, num, dtype)?;
        self.build(vec![dim.into()], values, unit.into())
    }

    /// Wraps existing engine values.
    pub fn asarray<D>(&self, dims: D, values: E, unit: impl Into<UnitArg>) -> Result<DimensionedArray<E>>
    where
        D: IntoIterator,
        D::Item: Into<Dim>,
    {
        self.build(dims.into_iter().map(Into::into).collect(), values, unit.into())
    }

    pub fn empty<D>(
        &self,
        dims: D,
        shape: &[usize],
        dtype: DType,
        unit: impl Into<UnitArg>,
    ) -> Result<DimensionedArray<E>>
    where
        D: IntoIterator,
        D::Item: Into<Dim>,
    {
        let values = E::empty(shape, dtype)?;
        self.build(dims.into_iter().map(Into::into).collect(), values, unit.into())
    }

    pub fn zeros<D>(
        &self,
        dims: D,
        shape: &[usize],
        dtype: DType,
        unit: impl Into<UnitArg>,
    ) -> Result<DimensionedArray<E>>
    where
        D: IntoIterator,
        D::Item: Into<Dim>,
    {
        let values = E::zeros(shape, dtype)?;
        self.build(dims.into_iter().map(Into::into).collect(), values, unit.into())
    }

    pub fn ones<D>(
        &self,
        dims: D,
        shape: &[usize],
        dtype: DType,
        unit: impl Into<UnitArg>,
    ) -> Result<DimensionedArray<E>>
    where
        D: IntoIterator,
        D::Item: Into<Dim>,
    {
        let values = E::ones(shape, dtype)?;
        self.build(dims.into_iter().map(Into::into).collect(), values, unit.into())
    }

    /// An array of `shape` filled with `fill`.
    pub fn full<D>(
        &self,
        dims: D,
        shape: &[usize],
        fill: f64,
        dtype: DType,
        unit: impl Into<UnitArg>,
    ) -> Result<DimensionedArray<E>>
    where
        D: IntoIterator,
        D::Item: Into<Dim>,
    {
        let values = E::full(shape, fill, dtype)?;
        self.build(dims.into_iter().map(Into::into).collect(), values, unit.into())
    }
}

#[cfg(all(test, feature = "ndarray-backend"))]
mod tests {
    use super::*;
    use crate::engine::NdValues;

    fn dms() -> CreationFunctions<NdValues> {
        CreationFunctions::new(Some(UnitBackend::String))
    }

    #[test]
    fn test_default_unit_depends_on_dtype() {
        let x = dms().zeros(["x"], &[3], DType::Float64, UnitArg::Unspecified).unwrap();
        assert_eq!(x.unit(), Some(&UnitBackend::String.dimensionless()));

        let b = dms().zeros(["x"], &[3], DType::Bool, UnitArg::Unspecified).unwrap();
        assert_eq!(b.unit(), None);
    }

    #[test]
    fn test_explicit_and_missing_units() {
        let x = dms().ones(["x", "y"], &[2, 2], DType::Int32, "m").unwrap();
        assert_eq!(x.unit(), Some(&UnitBackend::String.parse("m").unwrap()));
        assert_eq!(x.values().to_vec::<i32>().unwrap(), vec![1; 4]);

        let none = dms().ones(["x"], &[2], DType::Int32, UnitArg::None).unwrap();
        assert_eq!(none.unit(), None);
    }

    #[test]
    fn test_explicit_unit_without_backend_fails() {
        let dms = CreationFunctions::<NdValues>::new(None);
        assert!(dms.zeros(["x"], &[1], DType::Float64, "m").unwrap_err().is_units_error());
        assert_eq!(dms.zeros(["x"], &[1], DType::Float64, UnitArg::Unspecified).unwrap().unit(), None);
    }

    #[test]
    fn test_ranges() {
        let x = dms().linspace("x", 0.0, 1.0, 5, None, UnitArg::Unspecified).unwrap();
        assert_eq!(x.values().to_vec::<f64>().unwrap(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        let y = dms().arange("y", 0.0, 1.0, 0.5, None, "s").unwrap();
        assert_eq!(y.dtype(), DType::Float64);
        assert_eq!(y.shape(), vec![2]);
    }

    #[test]
    fn test_asarray_and_full() {
        let values = NdValues::from(vec![1.0, 2.0]);
        let a = dms().asarray(["x"], values, UnitArg::None).unwrap();
        assert_eq!(a.dims(), &[Dim::from("x")]);
        assert!(dms().asarray(["x", "y"], NdValues::from(vec![1.0]), UnitArg::None).is_err());

        let f = dms().full(["x"], &[2], 7.5, DType::Float32, UnitArg::None).unwrap();
        assert_eq!(f.values().to_vec::<f32>().unwrap(), vec![7.5, 7.5]);
    }
}
