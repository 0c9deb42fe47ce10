//! Integration tests for reductions over named dims.
#![cfg(feature = "ndarray-backend")]

use approx::assert_relative_eq;
use dimarray::{ops, DType, Dim, DimArg, DimensionedArray, NdValues, ReduceOptions, Reduction, UnitBackend};
use proptest::prelude::*;

fn array(names: &[&str], shape: &[usize], data: Vec<f64>, unit: &str) -> DimensionedArray<NdValues> {
    let values = NdValues::from_shape_vec(shape, data).unwrap();
    let unit = UnitBackend::String.parse(unit).unwrap();
    DimensionedArray::new(names.iter().copied(), values, Some(unit)).unwrap()
}

#[test]
fn test_sum_over_named_dims_ignores_position() {
    let x = array(&["x", "y"], &[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], "kg");
    let t = ops::permute_dims(&x, ["y", "x"]).unwrap();

    let a = ops::sum(&x, "x", None).unwrap();
    let b = ops::sum(&t, "x", None).unwrap();
    dimarray::testing::assert_identical(&a, &b);
    assert_eq!(a.values().to_vec::<f64>().unwrap(), vec![5.0, 7.0, 9.0]);
}

#[test]
fn test_sum_of_integers_accumulates_in_int64() {
    let values = NdValues::from_shape_vec(&[3], vec![i32::MAX, 1, 1]).unwrap();
    let x = DimensionedArray::new(["x"], values, None).unwrap();
    let total = ops::sum(&x, DimArg::All, None).unwrap();
    assert_eq!(total.dtype(), DType::Int64);
    assert_eq!(total.values().to_vec::<i64>().unwrap(), vec![i32::MAX as i64 + 2]);

    let narrow = ops::sum(&x, DimArg::All, Some(DType::Float32)).unwrap();
    assert_eq!(narrow.dtype(), DType::Float32);
}

#[test]
fn test_mean_and_std_of_float32_stay_float32() {
    let values = NdValues::from_shape_vec(&[4], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
    let x = DimensionedArray::new(["t"], values, None).unwrap();
    let m = ops::mean(&x, "t").unwrap();
    assert_eq!(m.dtype(), DType::Float32);
    assert_relative_eq!(m.values().to_vec::<f32>().unwrap()[0], 2.5);

    let s = ops::std(&x, "t", 0.0).unwrap();
    assert_relative_eq!(s.values().to_vec::<f32>().unwrap()[0], 1.25f32.sqrt(), epsilon = 1e-6);
}

#[test]
fn test_reduce_with_options() {
    let x = array(&["x", "y"], &[2, 2], vec![1.0, 2.0, 3.0, 4.0], "");
    let options = ReduceOptions {
        dtype: Some(DType::Float64),
        ..ReduceOptions::default()
    };
    let p = ops::reduce(&x, Reduction::Prod, ["x", "y"], &options).unwrap();
    assert!(p.dims().is_empty());
    assert_eq!(p.values().to_vec::<f64>().unwrap(), vec![24.0]);
}

#[test]
fn test_empty_selection_reduces_every_dim() {
    let x = array(&["x", "y"], &[2, 2], vec![1.0, 2.0, 3.0, 4.0], "m");
    let total = ops::sum(&x, DimArg::Dims(vec![]), None).unwrap();
    assert!(total.dims().is_empty());
    assert_eq!(total.values().to_vec::<f64>().unwrap(), vec![10.0]);
    dimarray::testing::assert_identical(&total, &ops::sum(&x, DimArg::All, None).unwrap());

    let m = ops::max(&x, DimArg::Dims(vec![])).unwrap();
    assert_eq!(m.values().to_vec::<f64>().unwrap(), vec![4.0]);
}

#[test]
fn test_unknown_and_repeated_dims_fail() {
    let x = array(&["x", "y"], &[1, 2], vec![1.0, 2.0], "m");
    assert!(ops::max(&x, "z").unwrap_err().is_dimension_error());
    assert!(ops::min(&x, DimArg::from(vec![Dim::from("x"), Dim::from("x")]))
        .unwrap_err()
        .is_dimension_error());
}

proptest! {
    #[test]
    fn prop_sum_over_all_dims_matches_stepwise(data in prop::collection::vec(-100i64..100, 12)) {
        let values = NdValues::from_shape_vec(&[3, 4], data.clone()).unwrap();
        let x = DimensionedArray::new(["x", "y"], values, None).unwrap();

        let total = ops::sum(&x, DimArg::All, None).unwrap();
        let stepwise = ops::sum(&ops::sum(&x, "y", None).unwrap(), "x", None).unwrap();
        prop_assert_eq!(total.values().to_vec::<i64>().unwrap(), vec![data.iter().sum::<i64>()]);
        prop_assert_eq!(total.values(), stepwise.values());
    }

    #[test]
    fn prop_var_is_square_of_std(data in prop::collection::vec(-1e3f64..1e3, 2..20)) {
        let n = data.len();
        let x = array(&["x"], &[n], data, "m");
        let v = ops::var(&x, "x", 1.0).unwrap().values().to_vec::<f64>().unwrap()[0];
        let s = ops::std(&x, "x", 1.0).unwrap().values().to_vec::<f64>().unwrap()[0];
        prop_assert!((v - s * s).abs() <= 1e-9 * v.abs().max(1.0));
    }
}
