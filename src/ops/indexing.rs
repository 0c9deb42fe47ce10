use log::trace;

use crate::{
    array::DimensionedArray,
    dimension::format_dims,
    engine::ArrayEngine,
    error::{DimsError, Result},
};

/// Gathers elements of `x` along the dim of the 1-D `indices` array.
///
/// The result keeps the dims and unit of `x`; the extent of the indexed dim
/// becomes the number of indices.
///
/// # Errors
///
/// Returns a dimension error if `indices` is not 1-D or if its dim is not a
/// dim of `x`.
pub fn take<E: ArrayEngine>(
    x: &DimensionedArray<E>,
    indices: &DimensionedArray<E>,
) -> Result<DimensionedArray<E>> {
    if indices.ndim() != 1 {
        return Err(DimsError::dimension(format!(
            "Number of dimensions must be 1, got indices with dims {}",
            format_dims(indices.dims())
        )));
    }
    let dim = indices.dim()?;
    let axis = x.dims().iter().position(|d| d == dim).ok_or_else(|| {
        DimsError::dimension(format!(
            "Indices dimension '{}' not in data dimensions {}",
            dim,
            format_dims(x.dims())
        ))
    })?;
    trace!("take along '{}' (axis {})", dim, axis);
    let values = x.values().take(indices.values(), axis)?;
    DimensionedArray::new(x.dims().to_vec(), values, x.unit().cloned())
}
