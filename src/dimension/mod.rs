//! Named dimensions.
//!
//! This module provides the [`Dim`] name type, the ordered [`Dims`] sequence
//! attached to every array, and the derived [`Sizes`] mapping. Dims never
//! contain duplicates and always agree with the rank of the values they label.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{DimsError, Result};

pub mod sizes;

pub use sizes::Sizes;

/// The name of a single axis.
///
/// Cloning is cheap; the name is shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dim(Arc<str>);

impl Dim {
    /// Creates a new dim from a name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Dim {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Dim {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Dim {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Dim {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&Dim> for Dim {
    fn from(dim: &Dim) -> Self {
        dim.clone()
    }
}

impl PartialEq<str> for Dim {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Dim {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Ordered, duplicate-free sequence of dims naming all axes of an array.
pub type Dims = Vec<Dim>;

/// Selection of dims for reductions and `squeeze`.
///
/// `All` selects every dim of the operand, and so does an empty `Dims`. A
/// single dim is a one-element selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DimArg {
    #[default]
    All,
    Dims(Dims),
}

impl DimArg {
    /// Resolves the selection against the dims of an operand.
    pub fn resolve(&self, dims: &[Dim]) -> Dims {
        match self {
            DimArg::Dims(selected) if !selected.is_empty() => selected.clone(),
            _ => dims.to_vec(),
        }
    }

    /// Returns the explicit dims, or `None` when every dim is selected.
    pub fn explicit(self) -> Option<Dims> {
        match self {
            DimArg::Dims(selected) if !selected.is_empty() => Some(selected),
            _ => None,
        }
    }
}

impl From<&str> for DimArg {
    fn from(dim: &str) -> Self {
        DimArg::Dims(vec![Dim::from(dim)])
    }
}

impl From<Dim> for DimArg {
    fn from(dim: Dim) -> Self {
        DimArg::Dims(vec![dim])
    }
}

impl From<&Dim> for DimArg {
    fn from(dim: &Dim) -> Self {
        DimArg::Dims(vec![dim.clone()])
    }
}

impl From<Dims> for DimArg {
    fn from(dims: Dims) -> Self {
        DimArg::Dims(dims)
    }
}

impl From<&[Dim]> for DimArg {
    fn from(dims: &[Dim]) -> Self {
        DimArg::Dims(dims.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for DimArg {
    fn from(dims: [&str; N]) -> Self {
        DimArg::Dims(dims.iter().map(|d| Dim::from(*d)).collect())
    }
}

/// Formats dims as a tuple, e.g. `('x', 'y')`.
pub fn format_dims(dims: &[Dim]) -> String {
    let inner: Vec<String> = dims.iter().map(|d| format!("'{}'", d)).collect();
    if inner.len() == 1 {
        format!("({},)", inner[0])
    } else {
        format!("({})", inner.join(", "))
    }
}

/// Validates dims against the rank of the values they label.
///
/// # Errors
///
/// Returns a dimension error if the lengths differ or if a name repeats.
pub fn validate_dims(dims: &[Dim], ndim: usize) -> Result<()> {
    if dims.len() != ndim {
        return Err(DimsError::dimension(format!(
            "Number of dimensions ({}) does not match number of dims ({})",
            ndim,
            dims.len()
        )));
    }
    ensure_unique(dims)
}

/// Fails with a dimension error if `dims` contains a repeated name.
pub fn ensure_unique(dims: &[Dim]) -> Result<()> {
    let mut seen = HashSet::with_capacity(dims.len());
    for dim in dims {
        if !seen.insert(dim) {
            return Err(DimsError::dimension(format!(
                "Duplicate dimensions: dims must be unique, got {}",
                format_dims(dims)
            )));
        }
    }
    Ok(())
}

/// Returns the axis index of `dim` within `dims`.
pub fn axis_of(dims: &[Dim], dim: &Dim) -> Result<usize> {
    dims.iter().position(|d| d == dim).ok_or_else(|| {
        DimsError::dimension(format!(
            "Dimension '{}' not found in {}",
            dim,
            format_dims(dims)
        ))
    })
}
