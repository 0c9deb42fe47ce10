//! Integration tests for unit conversion and unit backends.
#![cfg(all(feature = "ndarray-backend", feature = "scaled-units"))]

use approx::assert_relative_eq;
use dimarray::testing::assert_identical;
use dimarray::{ops, CreationFunctions, DType, DimensionedArray, NdValues, Unit, UnitArg, UnitBackend};
use proptest::prelude::*;

fn scaled() -> CreationFunctions<NdValues> {
    CreationFunctions::new(Some(UnitBackend::Scaled))
}

#[test]
fn test_to_converts_between_scaled_units() {
    let x = scaled().full(["x"], &[3], 1.5, DType::Float64, "km").unwrap();
    let y = x.to(None, Some("m"), false).unwrap();
    assert_eq!(y.unit(), Some(&UnitBackend::Scaled.parse("m").unwrap()));
    for v in y.values().to_vec::<f64>().unwrap() {
        assert_relative_eq!(v, 1500.0);
    }

    let h = scaled().full(["t"], &[1], 2.0, DType::Float64, "h").unwrap();
    let s = h.to(None, Some("s"), false).unwrap();
    assert_relative_eq!(s.values().to_vec::<f64>().unwrap()[0], 7200.0);
}

#[test]
fn test_to_rejects_incompatible_or_missing_units() {
    let x = scaled().ones(["x"], &[2], DType::Float64, "m").unwrap();
    assert!(x.to(None, Some("s"), false).unwrap_err().is_units_error());

    let bare = scaled().ones(["x"], &[2], DType::Float64, UnitArg::None).unwrap();
    assert!(bare.to(None, Some("m"), false).unwrap_err().is_units_error());
    assert!(x.to(None, None, false).is_err());
}

#[test]
fn test_integer_scaling_yields_float64() {
    let x = scaled().full(["x"], &[2], 3.0, DType::Int64, "m").unwrap();
    let mm = x.to(None, Some("mm"), false).unwrap();
    assert_eq!(mm.dtype(), DType::Float64);
    assert_relative_eq!(mm.values().to_vec::<f64>().unwrap()[0], 3000.0);

    let same = x.to(None, Some("m"), true).unwrap();
    assert_eq!(same.dtype(), DType::Int64);
}

#[test]
fn test_derived_units_compose() {
    let d = scaled().full(["x"], &[1], 100.0, DType::Float64, "m").unwrap();
    let t = scaled().full(["x"], &[1], 20.0, DType::Float64, "s").unwrap();
    let v = ops::div(&d, &t).unwrap();
    assert_eq!(v.unit(), Some(&UnitBackend::Scaled.parse("m/s").unwrap()));

    let kmh = v.to(None, Some("km/h"), false).unwrap();
    assert_relative_eq!(kmh.values().to_vec::<f64>().unwrap()[0], 18.0, epsilon = 1e-9);

    let ratio = ops::div(&d, &d).unwrap();
    assert!(ratio.unit().map_or(false, Unit::is_idempotent));
    assert!(ops::exp(&ratio).is_ok());
}

#[test]
fn test_string_units_only_convert_to_themselves() {
    let dms = CreationFunctions::<NdValues>::new(Some(UnitBackend::String));
    let x = dms.ones(["x"], &[2], DType::Float32, "m").unwrap();
    let same = x.to(None, Some("m"), false).unwrap();
    assert_identical(&same, &x);
    assert!(x.to(None, Some("mm"), false).unwrap_err().is_units_error());
}

#[test]
fn test_mixed_backends_do_not_combine() {
    let a = scaled().ones(["x"], &[2], DType::Float64, "m").unwrap();
    let b = CreationFunctions::<NdValues>::new(Some(UnitBackend::String))
        .ones(["x"], &[2], DType::Float64, "m")
        .unwrap();
    assert!(ops::mul(&a, &b).unwrap_err().is_units_error());
}

fn dtypes() -> impl Strategy<Value = DType> {
    prop_oneof![
        Just(DType::Int32),
        Just(DType::Int64),
        Just(DType::Float32),
        Just(DType::Float64),
    ]
}

fn start(dtype: DType, unit: &str) -> DimensionedArray<NdValues> {
    scaled().full(["x"], &[4], 2.0, dtype, unit).unwrap()
}

/// Whether `to` casts before scaling, mirroring the documented order.
fn casts_first(src: DType, dst: DType) -> bool {
    match (src, dst) {
        (_, DType::Float64) => true,
        (DType::Float64, _) => false,
        (_, DType::Float32) => true,
        (DType::Float32, _) => false,
        (DType::Int64, DType::Int32) => false,
        _ => true,
    }
}

#[test]
fn test_to_with_both_keeps_integer_target() {
    let x = start(DType::Int32, "m");
    let y = x.to(Some(DType::Int64), Some("mm"), true).unwrap();
    assert_eq!(y.dtype(), DType::Int64);
    assert_eq!(y.values().to_vec::<i64>().unwrap(), vec![2000; 4]);
}

proptest! {
    #[test]
    fn prop_to_matches_policy_ordering(
        src in dtypes(),
        dst in dtypes(),
        unit in prop::sample::select(vec!["mm", "cm", "m", "km"]),
    ) {
        let x = start(src, "m");
        let combined = x.to(Some(dst), Some(unit), false).unwrap();
        prop_assert_eq!(combined.dtype(), dst);
        prop_assert_eq!(combined.unit(), Some(&UnitBackend::Scaled.parse(unit).unwrap()));

        let expected = if casts_first(src, dst) {
            x.astype(dst, false).unwrap().to(None, Some(unit), false).unwrap().astype(dst, false).unwrap()
        } else {
            x.to(None, Some(unit), false).unwrap().astype(dst, false).unwrap()
        };
        prop_assert_eq!(combined.values(), expected.values());
    }
}
