//! Reduction operations for dimensioned arrays.
//!
//! Reductions select dims by name and always drop them from the result. Each
//! reduction transforms the unit by its own policy: logical reductions reject
//! units, `prod` requires a dimensionless unit, `var` squares the unit and the
//! rest keep it.

use log::trace;

use crate::{
    array::DimensionedArray,
    dimension::{axis_of, ensure_unique, format_dims, DimArg, Dims},
    engine::{ArrayEngine, DType, ReduceParams, Reduction},
    error::{DimsError, Result},
    units::Unit,
};

/// Options shared by all reductions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReduceOptions {
    /// Keeping reduced dims is not supported; `true` is rejected.
    pub keepdims: bool,
    /// Degrees-of-freedom correction for `std` and `var`.
    pub correction: f64,
    /// Accumulator type for `sum` and `prod`.
    pub dtype: Option<DType>,
}

/// Maps a dim selection to axis indices and the dims that remain.
///
/// Axes are returned in the order the dims appear in `x`.
///
/// # Errors
///
/// Returns a dimension error for unknown or repeated dims.
pub fn axis_dims_for_reduce<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    dim: &DimArg,
) -> Result<(Vec<usize>, Dims)> {
    let selected = dim.resolve(x.dims());
    ensure_unique(&selected)?;
    for d in &selected {
        axis_of(x.dims(), d)?;
    }
    let (axes, dims): (Vec<usize>, Dims) = x
        .dims()
        .iter()
        .enumerate()
        .filter(|(_, d)| selected.contains(d))
        .map(|(axis, d)| (axis, d.clone()))
        .unzip();
    let remaining = x.dims().iter().filter(|d| !dims.contains(d)).cloned().collect();
    Ok((axes, remaining))
}

/// Applies the unit policy of `op` to the input unit.
fn reduced_unit(op: Reduction, unit: Option<&Unit>) -> Result<Option<Unit>> {
    match (op, unit) {
        (_, None) => Ok(None),
        (Reduction::All | Reduction::Any, Some(unit)) => Err(DimsError::units(format!(
            "Unit is not supported for logical operation `{}`, got '{}'",
            op, unit
        ))),
        (Reduction::Prod, Some(unit)) if !unit.is_idempotent() => Err(DimsError::units(format!(
            "Unit must be idempotent for `prod`, got '{}'",
            unit
        ))),
        (Reduction::Var, Some(unit)) => unit.multiply(unit).map(Some),
        (_, Some(unit)) => Ok(Some(unit.clone())),
    }
}

/// Reduces `x` over the selected dims with `op`.
///
/// # Errors
///
/// Returns an invalid-input error if `keepdims` is requested, a dimension
/// error for unknown dims and a units error if the unit policy of `op`
/// rejects the unit.
pub fn reduce<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    op: Reduction,
    dim: impl Into<DimArg>,
    options: &ReduceOptions,
) -> Result<DimensionedArray<E>> {
    if options.keepdims {
        return Err(DimsError::invalid_input("keepdims is not supported"));
    }
    let unit = reduced_unit(op, x.unit())?;
    let (axes, dims) = axis_dims_for_reduce(x, &dim.into())?;
    trace!("{} over axes {:?}, keeping {}", op, axes, format_dims(&dims));
    let params = ReduceParams {
        correction: options.correction,
        dtype: options.dtype,
    };
    DimensionedArray::new(dims, x.values().reduce(op, &axes, &params)?, unit)
}

/// Logical AND over the selected dims. The array must have no unit.
pub fn all<E: ArrayEngine>(x: &DimensionedArray<E>, dim: impl Into<DimArg>) -> Result<DimensionedArray<E>> {
    reduce(x, Reduction::All, dim, &ReduceOptions::default())
}

/// Logical OR over the selected dims. The array must have no unit.
pub fn any<E: ArrayEngine>(x: &DimensionedArray<E>, dim: impl Into<DimArg>) -> Result<DimensionedArray<E>> {
    reduce(x, Reduction::Any, dim, &ReduceOptions::default())
}

pub fn max<E: ArrayEngine>(x: &DimensionedArray<E>, dim: impl Into<DimArg>) -> Result<DimensionedArray<E>> {
    reduce(x, Reduction::Max, dim, &ReduceOptions::default())
}

pub fn min<E: ArrayEngine>(x: &DimensionedArray<E>, dim: impl Into<DimArg>) -> Result<DimensionedArray<E>> {
    reduce(x, Reduction::Min, dim, &ReduceOptions::default())
}

pub fn mean<E: ArrayEngine>(x: &DimensionedArray<E>, dim: impl Into<DimArg>) -> Result<DimensionedArray<E>> {
    reduce(x, Reduction::Mean, dim, &ReduceOptions::default())
}

/// Sum over the selected dims, accumulating in `dtype` if given.
pub fn sum<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    dim: impl Into<DimArg>,
    dtype: Option<DType>,
) -> Result<DimensionedArray<E>> {
    let options = ReduceOptions {
        dtype,
        ..ReduceOptions::default()
    };
    reduce(x, Reduction::Sum, dim, &options)
}

/// Product over the selected dims. The unit must satisfy `u * u == u`.
pub fn prod<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    dim: impl Into<DimArg>,
    dtype: Option<DType>,
) -> Result<DimensionedArray<E>> {
    let options = ReduceOptions {
        dtype,
        ..ReduceOptions::default()
    };
    reduce(x, Reduction::Prod, dim, &options)
}

/// Standard deviation with `correction` degrees of freedom removed.
pub fn std<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    dim: impl Into<DimArg>,
    correction: f64,
) -> Result<DimensionedArray<E>> {
    let options = ReduceOptions {
        correction,
        ..ReduceOptions::default()
    };
    reduce(x, Reduction::Std, dim, &options)
}

/// Variance with `correction` degrees of freedom removed. The unit is squared.
pub fn var<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    dim: impl Into<DimArg>,
    correction: f64,
) -> Result<DimensionedArray<E>> {
    let options = ReduceOptions {
        correction,
        ..ReduceOptions::default()
    };
    reduce(x, Reduction::Var, dim, &options)
}

#[cfg(all(test, feature = "ndarray-backend"))]
mod tests {
    use super::*;
    use crate::dimension::Dim;
    use crate::engine::NdValues;
    use crate::units::{StringUnit, UnitBackend};
    use approx::assert_relative_eq;

    fn floats(names: &[&str], shape: &[usize], unit: Option<&str>) -> DimensionedArray<NdValues> {
        let n: usize = shape.iter().product();
        let values = NdValues::from_shape_vec(shape, (0..n).map(|i| i as f64).collect()).unwrap();
        let unit = unit.map(|u| UnitBackend::String.parse(u).unwrap());
        DimensionedArray::new(names.iter().copied(), values, unit).unwrap()
    }

    fn flags(unit: Option<&str>) -> DimensionedArray<NdValues> {
        let values =
            NdValues::from_shape_vec(&[2, 3], vec![true, false, true, true, true, true]).unwrap();
        let unit = unit.map(|u| UnitBackend::String.parse(u).unwrap());
        DimensionedArray::new(["x", "y"], values, unit).unwrap()
    }

    #[test]
    fn test_axis_dims_for_reduce() {
        let x = floats(&["x", "y", "z"], &[2, 3, 4], None);
        let (axes, dims) = axis_dims_for_reduce(&x, &DimArg::from(["z", "x"])).unwrap();
        assert_eq!(axes, vec![0, 2]);
        assert_eq!(dims, vec![Dim::from("y")]);

        let (axes, dims) = axis_dims_for_reduce(&x, &DimArg::All).unwrap();
        assert_eq!(axes, vec![0, 1, 2]);
        assert!(dims.is_empty());

        let (axes, dims) = axis_dims_for_reduce(&x, &DimArg::Dims(vec![])).unwrap();
        assert_eq!(axes, vec![0, 1, 2]);
        assert!(dims.is_empty());

        assert!(axis_dims_for_reduce(&x, &DimArg::from("w")).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_all_drops_dim() {
        let out = all(&flags(None), "x").unwrap();
        assert_eq!(out.dims(), &[Dim::from("y")]);
        assert_eq!(out.values().to_vec::<bool>().unwrap(), vec![true, false, true]);
        assert_eq!(out.unit(), None);

        assert!(any(&flags(None), DimArg::All).unwrap().values().to_vec::<bool>().unwrap()[0]);
    }

    #[test]
    fn test_logical_reductions_reject_units() {
        assert!(all(&flags(Some("m")), "x").unwrap_err().is_units_error());
        assert!(any(&flags(Some("")), "x").unwrap_err().is_units_error());
    }

    #[test]
    fn test_sum_keeps_unit() {
        let x = floats(&["x", "y"], &[2, 3], Some("m"));
        let out = sum(&x, "y", None).unwrap();
        assert_eq!(out.values().to_vec::<f64>().unwrap(), vec![3.0, 12.0]);
        assert_eq!(out.unit(), x.unit());

        let out = max(&x, DimArg::All).unwrap();
        assert!(out.dims().is_empty());
        assert_eq!(out.values().to_vec::<f64>().unwrap(), vec![5.0]);
        assert_eq!(min(&x, "x").unwrap().values().to_vec::<f64>().unwrap(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_var_squares_unit() {
        let x = floats(&["x"], &[4], Some("m"));
        let out = var(&x, "x", 0.0).unwrap();
        assert_eq!(out.unit(), Some(&Unit::String(StringUnit::new("(m)*(m)"))));
        assert_relative_eq!(out.values().to_vec::<f64>().unwrap()[0], 1.25);

        let bare = floats(&["x"], &[4], None);
        assert_eq!(var(&bare, "x", 1.0).unwrap().unit(), None);
        let sample = std(&bare, "x", 1.0).unwrap();
        assert_relative_eq!(sample.values().to_vec::<f64>().unwrap()[0], (5.0f64 / 3.0).sqrt());
    }

    #[test]
    fn test_prod_requires_idempotent_unit() {
        let x = floats(&["x"], &[3], Some("m"));
        let err = prod(&x, "x", None).unwrap_err();
        assert!(err.is_units_error());
        assert!(err.to_string().contains("idempotent"));

        let y = floats(&["x"], &[3], Some(""));
        assert_eq!(prod(&y, "x", None).unwrap().values().to_vec::<f64>().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_keepdims_rejected() {
        let x = floats(&["x"], &[3], None);
        let options = ReduceOptions {
            keepdims: true,
            ..ReduceOptions::default()
        };
        let err = reduce(&x, Reduction::Sum, "x", &options).unwrap_err();
        assert!(matches!(err, DimsError::InvalidInput(_)));
    }

    #[test]
    fn test_mean_over_several_dims() {
        let x = floats(&["x", "y", "z"], &[2, 3, 2], None);
        let out = mean(&x, ["x", "z"]).unwrap();
        assert_eq!(out.dims(), &[Dim::from("y")]);
        assert_eq!(out.values().to_vec::<f64>().unwrap(), vec![3.5, 5.5, 7.5]);
    }
}
