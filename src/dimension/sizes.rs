//! Dim-to-extent mapping.

use std::fmt;

use super::{validate_dims, Dim, Dims};
use crate::error::{DimsError, Result};

/// Ordered mapping from [`Dim`] to extent.
///
/// Iteration follows insertion order. Inserting an existing dim replaces its
/// extent in place, so the mapping never holds the same dim twice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sizes {
    entries: Vec<(Dim, usize)>,
}

impl Sizes {
    /// Builds the sizes of an array from its dims and shape.
    pub fn new(dims: &[Dim], shape: &[usize]) -> Result<Self> {
        validate_dims(dims, shape.len())?;
        Ok(Self {
            entries: dims.iter().cloned().zip(shape.iter().copied()).collect(),
        })
    }

    /// Builds a mapping from `(dim, extent)` pairs.
    pub fn from_pairs<D, I>(pairs: I) -> Self
    where
        D: Into<Dim>,
        I: IntoIterator<Item = (D, usize)>,
    {
        let mut sizes = Self::default();
        for (dim, size) in pairs {
            sizes.insert(dim, size);
        }
        sizes
    }

    /// Inserts or replaces the extent of `dim`.
    pub fn insert(&mut self, dim: impl Into<Dim>, size: usize) {
        let dim = dim.into();
        match self.entries.iter_mut().find(|(d, _)| *d == dim) {
            Some(entry) => entry.1 = size,
            None => self.entries.push((dim, size)),
        }
    }

    /// Returns the extent of `dim`.
    ///
    /// # Errors
    ///
    /// Returns a dimension error if `dim` is not in the mapping.
    pub fn get(&self, dim: &Dim) -> Result<usize> {
        self.entries
            .iter()
            .find(|(d, _)| d == dim)
            .map(|(_, s)| *s)
            .ok_or_else(|| DimsError::dimension(format!("Dimension '{}' not found", dim)))
    }

    pub fn contains(&self, dim: &Dim) -> bool {
        self.entries.iter().any(|(d, _)| d == dim)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dims(&self) -> Dims {
        self.entries.iter().map(|(d, _)| d.clone()).collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.entries.iter().map(|(_, s)| *s).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dim, usize)> {
        self.entries.iter().map(|(d, s)| (d, *s))
    }
}

impl fmt::Display for Sizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (dim, size)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {}", dim, size)?;
        }
        write!(f, "}}")
    }
}

impl<D: Into<Dim>> FromIterator<(D, usize)> for Sizes {
    fn from_iter<I: IntoIterator<Item = (D, usize)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_from_dims_and_shape() {
        let dims = vec![Dim::from("x"), Dim::from("y")];
        let sizes = Sizes::new(&dims, &[2, 3]).unwrap();
        assert_eq!(sizes.get(&Dim::from("x")).unwrap(), 2);
        assert_eq!(sizes.get(&Dim::from("y")).unwrap(), 3);
        assert_eq!(sizes.dims(), dims);
        assert_eq!(sizes.shape(), vec![2, 3]);
        assert!(sizes.get(&Dim::from("z")).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_sizes_length_mismatch() {
        let dims = vec![Dim::from("x")];
        assert!(Sizes::new(&dims, &[2, 3]).is_err());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut sizes = Sizes::from_pairs([("x", 2), ("y", 3)]);
        sizes.insert("x", 5);
        assert_eq!(sizes.dims(), vec![Dim::from("x"), Dim::from("y")]);
        assert_eq!(sizes.shape(), vec![5, 3]);
    }

    #[test]
    fn test_display() {
        let sizes = Sizes::from_pairs([("x", 2), ("y", 3)]);
        assert_eq!(sizes.to_string(), "{'x': 2, 'y': 3}");
    }
}
