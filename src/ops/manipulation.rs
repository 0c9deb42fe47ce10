//! Structural manipulation of dimensioned arrays.
//!
//! Every function re-derives the dims of its result by name. Operations that
//! only make sense with positional axes are rejected, pointing to the named
//! alternative.

use log::trace;

use crate::{
    array::DimensionedArray,
    dimension::{axis_of, ensure_unique, format_dims, Dim, DimArg, Dims, Sizes},
    engine::ArrayEngine,
    error::{DimsError, Result},
};

/// Fails unless all arrays share the dims and unit of the first one.
fn check_same_dims_and_unit<'a, E: ArrayEngine>(
    arrays: &'a [DimensionedArray<E>],
    what: &str,
) -> Result<&'a DimensionedArray<E>> {
    let first = arrays
        .first()
        .ok_or_else(|| DimsError::invalid_input(format!("`{}` needs at least one array", what)))?;
    for array in &arrays[1..] {
        if array.dims() != first.dims() {
            return Err(DimsError::dimension(format!(
                "All arrays must have the same dims, got {} and {}",
                format_dims(first.dims()),
                format_dims(array.dims())
            )));
        }
        if array.unit() != first.unit() {
            return Err(DimsError::units("All arrays must have the same unit"));
        }
    }
    Ok(first)
}

/// Concatenates arrays along an existing dim.
///
/// With [`DimArg::All`] or an empty selection the arrays must be 1-D and their sole dim is used.
///
/// # Errors
///
/// Returns a dimension error if the arrays differ in dims or the dim is
/// unknown, and a units error if they differ in unit.
pub fn concat<E: ArrayEngine>(
    arrays: &[DimensionedArray<E>],
    dim: impl Into<DimArg>,
) -> Result<DimensionedArray<E>> {
    let first = check_same_dims_and_unit(arrays, "concat")?;
    let dim = match dim.into().explicit() {
        None => first.dim()?.clone(),
        Some(mut dims) if dims.len() == 1 => dims.remove(0),
        Some(dims) => {
            return Err(DimsError::invalid_input(format!(
                "`concat` takes a single dim, got {}",
                format_dims(&dims)
            )))
        }
    };
    let axis = axis_of(first.dims(), &dim)?;
    let values: Vec<E> = arrays.iter().map(|a| a.values().clone()).collect();
    DimensionedArray::new(first.dims().to_vec(), E::concat(&values, axis)?, first.unit().cloned())
}

/// Stacks arrays along a new dim inserted at `axis`.
///
/// A negative `axis` counts from the end of the result, so `-1` appends.
///
/// # Errors
///
/// Returns a dimension error if `dim` already exists or the arrays differ in
/// dims, and a units error if they differ in unit.
pub fn stack<E: ArrayEngine>(
    arrays: &[DimensionedArray<E>],
    dim: impl Into<Dim>,
    axis: isize,
) -> Result<DimensionedArray<E>> {
    let dim = dim.into();
    let first = check_same_dims_and_unit(arrays, "stack")?;
    if first.dims().contains(&dim) {
        return Err(DimsError::dimension(format!(
            "Dimension '{}' already exists, did you mean to use `concat`?",
            dim
        )));
    }
    let ndim = first.ndim() as isize;
    let position = if axis >= 0 { axis } else { ndim + 1 + axis };
    if position < 0 || position > ndim {
        return Err(DimsError::invalid_input(format!(
            "Axis {} is out of bounds for stacking arrays of dimension {}",
            axis, ndim
        )));
    }
    let position = position as usize;
    let mut dims = first.dims().to_vec();
    dims.insert(position, dim);
    let values: Vec<E> = arrays.iter().map(|a| a.values().clone()).collect();
    DimensionedArray::new(dims, E::stack(&values, position)?, first.unit().cloned())
}

/// Merges contiguous dims into one.
///
/// `dims` selects the dims to merge, all dims by default, and must appear in
/// the array in the same contiguous order. The new dim is named `to`, or the
/// merged names joined by `_`.
///
/// # Errors
///
/// Returns a dimension error for unknown dims, for dims that are not
/// contiguous and ordered, or if `to` collides with a dim that is kept.
pub fn flatten<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    dims: impl Into<DimArg>,
    to: Option<Dim>,
) -> Result<DimensionedArray<E>> {
    let selected = dims.into().resolve(x.dims());
    let first = selected
        .first()
        .ok_or_else(|| DimsError::invalid_input("`flatten` needs at least one dim"))?;
    if let Some(unknown) = selected.iter().find(|d| !x.dims().contains(d)) {
        return Err(DimsError::dimension(format!(
            "All dims must be in the array, '{}' is not in {}",
            unknown,
            format_dims(x.dims())
        )));
    }
    let start = axis_of(x.dims(), first)?;
    let end = start + selected.len();
    if end > x.ndim() || x.dims()[start..end] != selected[..] {
        return Err(DimsError::dimension(format!(
            "Dimensions must be contiguous and ordered, got {} for array with dims {}",
            format_dims(&selected),
            format_dims(x.dims())
        )));
    }
    let to = to.unwrap_or_else(|| {
        let names: Vec<&str> = selected.iter().map(Dim::as_str).collect();
        Dim::from(names.join("_"))
    });
    let preserved: Dims = x.dims()[..start].iter().chain(&x.dims()[end..]).cloned().collect();
    if preserved.contains(&to) {
        return Err(DimsError::dimension(format!(
            "Output dim '{}' must not be in preserved dims {}",
            to,
            format_dims(&preserved)
        )));
    }

    let shape = x.shape();
    let mut new_shape = shape[..start].to_vec();
    new_shape.push(shape[start..end].iter().product());
    new_shape.extend_from_slice(&shape[end..]);
    let mut new_dims = x.dims()[..start].to_vec();
    new_dims.push(to);
    new_dims.extend_from_slice(&x.dims()[end..]);
    trace!("flatten {} -> {}", format_dims(x.dims()), format_dims(&new_dims));
    DimensionedArray::new(new_dims, x.values().reshape(&new_shape)?, x.unit().cloned())
}

/// Splits one dim into several, in the order of `sizes`.
///
/// # Errors
///
/// Returns a dimension error if `dim` is unknown or the new dims collide with
/// others, and a reshape error if the extents do not multiply to the extent
/// of `dim`.
pub fn fold<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    dim: impl Into<Dim>,
    sizes: &Sizes,
) -> Result<DimensionedArray<E>> {
    let dim = dim.into();
    let axis = x
        .dims()
        .iter()
        .position(|d| *d == dim)
        .ok_or_else(|| DimsError::dimension(format!("Dimension '{}' not found", dim)))?;
    let mut new_dims = x.dims()[..axis].to_vec();
    new_dims.extend(sizes.dims());
    new_dims.extend_from_slice(&x.dims()[axis + 1..]);
    ensure_unique(&new_dims)?;

    let shape = x.shape();
    let mut new_shape = shape[..axis].to_vec();
    new_shape.extend(sizes.shape());
    new_shape.extend_from_slice(&shape[axis + 1..]);
    trace!("fold '{}' into {}", dim, sizes);
    DimensionedArray::new(new_dims, x.values().reshape(&new_shape)?, x.unit().cloned())
}

/// Reorders the dims of `x`.
///
/// # Errors
///
/// Returns a dimension error unless `dims` is a reordering of the dims of `x`.
pub fn permute_dims<E, D>(x: &DimensionedArray<E>, dims: D) -> Result<DimensionedArray<E>>
where
    E: ArrayEngine,
    D: IntoIterator,
    D::Item: Into<Dim>,
{
    let dims: Dims = dims.into_iter().map(Into::into).collect();
    let is_permutation = dims.len() == x.ndim()
        && ensure_unique(&dims).is_ok()
        && dims.iter().all(|d| x.dims().contains(d));
    if !is_permutation {
        return Err(DimsError::dimension(format!(
            "Expected a permutation of {}, got {}",
            format_dims(x.dims()),
            format_dims(&dims)
        )));
    }
    let axes = dims
        .iter()
        .map(|d| axis_of(x.dims(), d))
        .collect::<Result<Vec<_>>>()?;
    DimensionedArray::new(dims, x.values().permute_dims(&axes)?, x.unit().cloned())
}

/// Removes dims of extent 1.
///
/// With [`DimArg::All`] or an empty selection every dim of extent 1 is
/// removed.
///
/// # Errors
///
/// Returns a dimension error if a selected dim is unknown or its extent is
/// not 1.
pub fn squeeze<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    dim: impl Into<DimArg>,
) -> Result<DimensionedArray<E>> {
    let sizes = x.sizes();
    let selected: Dims = match dim.into().explicit() {
        None => sizes.iter().filter(|(_, s)| *s == 1).map(|(d, _)| d.clone()).collect(),
        Some(dims) => {
            ensure_unique(&dims)?;
            for d in &dims {
                let extent = sizes.get(d)?;
                if extent != 1 {
                    return Err(DimsError::dimension(format!(
                        "Cannot squeeze dimension '{}' of size {}",
                        d, extent
                    )));
                }
            }
            dims
        }
    };
    let axes = selected
        .iter()
        .map(|d| axis_of(x.dims(), d))
        .collect::<Result<Vec<_>>>()?;
    let dims: Dims = x.dims().iter().filter(|d| !selected.contains(d)).cloned().collect();
    DimensionedArray::new(dims, x.values().squeeze(&axes)?, x.unit().cloned())
}

/// Adds new leading dims with the given extents, in the order of `sizes`.
///
/// Values are repeated along the new dims. Existing dims of extent 1 are
/// left alone; use [`permute_dims`] to move the new dims elsewhere.
///
/// # Errors
///
/// Returns a dimension error if a new dim already exists.
pub fn expand_dims<E: ArrayEngine>(x: &DimensionedArray<E>, sizes: &Sizes) -> Result<DimensionedArray<E>> {
    if let Some((dim, _)) = sizes.iter().find(|(d, _)| x.dims().contains(d)) {
        return Err(DimsError::dimension(format!(
            "Dimension '{}' already exists in {}",
            dim,
            format_dims(x.dims())
        )));
    }
    let mut values = x.values().clone();
    for _ in 0..sizes.len() {
        values = values.expand_dims(0)?;
    }
    let mut shape = sizes.shape();
    shape.extend(x.shape());
    let mut dims = sizes.dims();
    dims.extend_from_slice(x.dims());
    DimensionedArray::new(dims, values.broadcast_to(&shape)?, x.unit().cloned())
}

/// Not supported: positional reshapes lose dim names. Use [`fold`] and
/// [`flatten`].
pub fn reshape<E: ArrayEngine>(_x: &DimensionedArray<E>, _shape: &[usize]) -> Result<DimensionedArray<E>> {
    Err(DimsError::not_implemented(
        "`reshape` is not supported, use `fold` and `flatten` instead",
    ))
}

/// Not supported: use [`expand_dims`].
pub fn broadcast_to<E: ArrayEngine>(
    _x: &DimensionedArray<E>,
    _shape: &[usize],
) -> Result<DimensionedArray<E>> {
    Err(DimsError::not_implemented(
        "`broadcast_to` is not supported, use `expand_dims` instead",
    ))
}

/// Not supported: use [`permute_dims`].
pub fn moveaxis<E: ArrayEngine>(
    _x: &DimensionedArray<E>,
    _source: isize,
    _destination: isize,
) -> Result<DimensionedArray<E>> {
    Err(DimsError::not_implemented(
        "`moveaxis` is not supported, use `permute_dims` instead",
    ))
}
