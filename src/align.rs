//! Name-driven alignment of operands.
//!
//! Operands are matched by dim name, never by position. A dim missing from an
//! operand is inserted as a unit-extent axis; a dim present in both operands
//! must have the same extent on both sides, including when one extent is 1.

use log::{debug, trace};

use crate::{
    array::DimensionedArray,
    dimension::{format_dims, Dim, Dims, Sizes},
    engine::ArrayEngine,
    error::{DimsError, Result},
};

/// Merges the dims of two operands.
///
/// The result is `a` followed by the dims of `b` not in `a`, so the order of
/// the left operand wins and the operation is not commutative.
pub fn merge_dims(a: &[Dim], b: &[Dim]) -> Dims {
    let mut merged = a.to_vec();
    merged.extend(b.iter().filter(|dim| !a.contains(dim)).cloned());
    merged
}

/// Returns the values of `array` laid out in the order of `dims`.
///
/// Dims of `dims` absent from the array become unit-extent axes, inserted at
/// the front before all axes are permuted into place.
///
/// # Errors
///
/// Returns a dimension error if the array has a dim that `dims` lacks.
pub fn broadcast_and_transpose<E: ArrayEngine>(
    array: &DimensionedArray<E>,
    dims: &[Dim],
) -> Result<E> {
    if let Some(extra) = array.dims().iter().find(|dim| !dims.contains(dim)) {
        return Err(DimsError::dimension(format!(
            "Cannot transpose {} to {}: dimension '{}' is not in the target",
            format_dims(array.dims()),
            format_dims(dims),
            extra
        )));
    }

    let missing: Dims = dims
        .iter()
        .filter(|dim| !array.dims().contains(dim))
        .cloned()
        .collect();
    let mut values = array.values().clone();
    for _ in &missing {
        values = values.expand_dims(0)?;
    }
    if !missing.is_empty() {
        debug!("inserted unit axes for {}", format_dims(&missing));
    }

    let mut current = missing;
    current.extend_from_slice(array.dims());
    let axes: Vec<usize> = dims
        .iter()
        .map(|dim| current.iter().position(|d| d == dim).unwrap_or_default())
        .collect();
    if axes.iter().enumerate().all(|(i, &axis)| i == axis) {
        return Ok(values);
    }
    trace!("permuting {} to {} with axes {:?}", format_dims(&current), format_dims(dims), axes);
    values.permute_dims(&axes)
}

/// Checks that dims shared by `x` and `y` have identical extents.
///
/// # Errors
///
/// Returns a dimension error naming the first mismatching dim and both
/// extents. Extents of 1 are not broadcast; the message says so.
pub fn check_alignment<E: ArrayEngine, F: ArrayEngine>(
    x: &DimensionedArray<E>,
    y: &DimensionedArray<F>,
) -> Result<()> {
    check_sizes(&x.sizes(), &y.sizes())
}

/// Compares the extents of dims present in both mappings.
pub(crate) fn check_sizes(x: &Sizes, y: &Sizes) -> Result<()> {
    for (dim, a) in x.iter() {
        let b = match y.get(dim) {
            Ok(b) => b,
            Err(_) => continue,
        };
        if a != b {
            let mut msg = format!("Sizes of dimension '{}' do not match: {} != {}.", dim, a, b);
            if a == 1 || b == 1 {
                msg.push_str(" Note: dimensions of size 1 are never broadcast.");
            }
            return Err(DimsError::dimension(msg));
        }
    }
    Ok(())
}

#[cfg(all(test, feature = "ndarray-backend"))]
mod tests {
    use super::*;
    use crate::engine::NdValues;

    fn dims(names: &[&str]) -> Dims {
        names.iter().map(|n| Dim::from(*n)).collect()
    }

    fn iota(names: &[&str], shape: &[usize]) -> DimensionedArray<NdValues> {
        let n: usize = shape.iter().product();
        let values = NdValues::from_shape_vec(shape, (0..n as i64).collect()).unwrap();
        DimensionedArray::new(names.iter().copied(), values, None).unwrap()
    }

    #[test]
    fn test_merge_dims_is_left_biased() {
        assert_eq!(merge_dims(&dims(&["x", "y"]), &dims(&["y", "z"])), dims(&["x", "y", "z"]));
        assert_eq!(merge_dims(&dims(&["y", "z"]), &dims(&["x", "y"])), dims(&["y", "z", "x"]));
        assert_eq!(merge_dims(&[], &dims(&["x"])), dims(&["x"]));
    }

    #[test]
    fn test_broadcast_and_transpose() {
        let a = iota(&["y", "x"], &[3, 2]);
        let values = broadcast_and_transpose(&a, &dims(&["x", "z", "y"])).unwrap();
        assert_eq!(values.shape(), vec![2, 1, 3]);
        assert_eq!(values.to_vec::<i64>().unwrap(), vec![0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_broadcast_and_transpose_several_missing() {
        let a = iota(&["x"], &[2]);
        let values = broadcast_and_transpose(&a, &dims(&["u", "x", "w"])).unwrap();
        assert_eq!(values.shape(), vec![1, 2, 1]);
    }

    #[test]
    fn test_broadcast_and_transpose_rejects_extra_dims() {
        let a = iota(&["x", "y"], &[2, 3]);
        let err = broadcast_and_transpose(&a, &dims(&["x"])).unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_check_alignment() {
        let a = iota(&["x", "y"], &[2, 3]);
        let b = iota(&["y", "z"], &[3, 4]);
        assert!(check_alignment(&a, &b).is_ok());

        let c = iota(&["y"], &[1]);
        let err = check_alignment(&a, &c).unwrap_err();
        let msg = err.to_string();
        assert!(err.is_dimension_error());
        assert!(msg.contains("3 != 1"));
        assert!(msg.contains("never broadcast"));

        let d = iota(&["y"], &[2]);
        let msg = check_alignment(&a, &d).unwrap_err().to_string();
        assert!(msg.contains("'y'"));
        assert!(!msg.contains("never broadcast"));
    }
}
