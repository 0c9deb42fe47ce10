//! Indexed reads and writes by dim name.
//!
//! A key either names dims (`[("x", 0), ("y", (1..3).into())]`), or is a single
//! index/slice for a 1-D array, or is [`IndexKey::Ellipsis`] selecting
//! everything. Dims keyed with a plain index are dropped; dims keyed with a
//! slice, and dims missing from the key, are kept.

pub mod slice;

pub use slice::{AxisIndex, SliceRange};

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use log::trace;

use crate::{
    align::{broadcast_and_transpose, check_sizes},
    array::DimensionedArray,
    dimension::{ensure_unique, format_dims, Dim, Dims, Sizes},
    engine::ArrayEngine,
    error::{DimsError, Result},
};

/// Key of [`DimensionedArray::get`] and [`DimensionedArray::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKey {
    /// Selects the whole array.
    Ellipsis,
    /// Index or slice of a 1-D array.
    Single(AxisIndex),
    /// Index or slice per named dim.
    ByDim(Vec<(Dim, AxisIndex)>),
}

impl From<AxisIndex> for IndexKey {
    fn from(index: AxisIndex) -> Self {
        IndexKey::Single(index)
    }
}

macro_rules! impl_index_key_single {
    ($($t:ty),*) => {
        $(
            impl From<$t> for IndexKey {
                fn from(index: $t) -> Self {
                    IndexKey::Single(AxisIndex::from(index))
                }
            }
        )*
    };
}

impl_index_key_single!(
    SliceRange,
    RangeFull,
    i32,
    isize,
    usize,
    Range<i32>,
    Range<usize>,
    RangeFrom<i32>,
    RangeFrom<usize>,
    RangeTo<i32>,
    RangeTo<usize>
);

impl<D, A> From<Vec<(D, A)>> for IndexKey
where
    D: Into<Dim>,
    A: Into<AxisIndex>,
{
    fn from(entries: Vec<(D, A)>) -> Self {
        IndexKey::ByDim(entries.into_iter().map(|(d, a)| (d.into(), a.into())).collect())
    }
}

impl<D, A, const N: usize> From<[(D, A); N]> for IndexKey
where
    D: Into<Dim>,
    A: Into<AxisIndex>,
{
    fn from(entries: [(D, A); N]) -> Self {
        IndexKey::ByDim(entries.into_iter().map(|(d, a)| (d.into(), a.into())).collect())
    }
}

impl<E: ArrayEngine> DimensionedArray<E> {
    /// Returns the sub-array selected by `key`.
    ///
    /// # Errors
    ///
    /// Returns a dimension error for a single index on an array that is not
    /// 1-D or for unknown dims, and an index error for out-of-bounds indices.
    pub fn get(&self, key: impl Into<IndexKey>) -> Result<Self> {
        let key = self.axis_keys(&key.into())?;
        let dims = kept_dims(self.dims(), &key);
        trace!("get {} -> {}", format_dims(self.dims()), format_dims(&dims));
        DimensionedArray::new(dims, self.values().slice(&key)?, self.unit().cloned())
    }

    /// Writes `value` into the sub-array selected by `key`.
    ///
    /// `value` may lack dims of the selection, in which case it is broadcast
    /// along them. Dims of the array and unit are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a dimension error if `value` has dims the selection lacks or if
    /// shared extents differ, and a units error if the units differ. Nothing
    /// is written on error.
    pub fn set(&mut self, key: impl Into<IndexKey>, value: &DimensionedArray<E>) -> Result<()> {
        let key = self.axis_keys(&key.into())?;
        let target = selection_sizes(self.dims(), &self.shape(), &key)?;
        let target_dims = target.dims();

        let extra: Dims = value
            .dims()
            .iter()
            .filter(|dim| !target.contains(dim))
            .cloned()
            .collect();
        if !extra.is_empty() {
            return Err(DimsError::dimension(format!(
                "Value has extra dimensions {} not in {}",
                format_dims(&extra),
                format_dims(&target_dims)
            )));
        }
        check_sizes(&target, &value.sizes())?;
        if self.unit() != value.unit() {
            return Err(DimsError::units(format!(
                "Units must be identical, got {} and {}",
                describe_unit(self.unit()),
                describe_unit(value.unit())
            )));
        }

        let source = broadcast_and_transpose(value, &target_dims)?;
        let source = source.astype(self.dtype(), false)?;
        self.values_mut().assign(&key, &source)
    }

    /// Resolves a key into one entry per axis.
    fn axis_keys(&self, key: &IndexKey) -> Result<Vec<AxisIndex>> {
        match key {
            IndexKey::Ellipsis => Ok(vec![AxisIndex::from(..); self.ndim()]),
            IndexKey::Single(index) => {
                if self.ndim() != 1 {
                    return Err(DimsError::dimension(format!(
                        "Only 1-D arrays can be indexed without dims, got dims {}",
                        format_dims(self.dims())
                    )));
                }
                Ok(vec![index.clone()])
            }
            IndexKey::ByDim(entries) => {
                let named: Dims = entries.iter().map(|(dim, _)| dim.clone()).collect();
                ensure_unique(&named)?;
                let unknown: Dims = named
                    .iter()
                    .filter(|dim| !self.dims().contains(dim))
                    .cloned()
                    .collect();
                if !unknown.is_empty() {
                    return Err(DimsError::dimension(format!(
                        "Unknown dimensions: {}",
                        format_dims(&unknown)
                    )));
                }
                Ok(self
                    .dims()
                    .iter()
                    .map(|dim| {
                        entries
                            .iter()
                            .find(|(d, _)| d == dim)
                            .map_or_else(|| AxisIndex::from(..), |(_, index)| index.clone())
                    })
                    .collect())
            }
        }
    }
}

fn kept_dims(dims: &[Dim], key: &[AxisIndex]) -> Dims {
    dims.iter()
        .zip(key)
        .filter(|(_, index)| !index.is_index())
        .map(|(dim, _)| dim.clone())
        .collect()
}

/// Sizes of the sub-array selected by `key`.
fn selection_sizes(dims: &[Dim], shape: &[usize], key: &[AxisIndex]) -> Result<Sizes> {
    let mut sizes = Sizes::default();
    for (axis, ((dim, &len), index)) in dims.iter().zip(shape).zip(key).enumerate() {
        match index {
            AxisIndex::Index(i) => {
                AxisIndex::normalize_index(*i, len, axis)?;
            }
            AxisIndex::Slice(range) => sizes.insert(dim.clone(), range.len_for(len)?),
        }
    }
    Ok(sizes)
}

fn describe_unit(unit: Option<&crate::units::Unit>) -> String {
    unit.map_or_else(|| "None".to_string(), |u| format!("'{}'", u))
}
