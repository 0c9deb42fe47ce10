//! Per-axis index and slice keys.
//!
//! Indices and slice bounds follow the usual negative-from-the-end convention.
//! Slice bounds are clamped to the axis extent; plain indices must be in
//! bounds.

use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};

use crate::error::{DimsError, Result};

/// A strided range used for slicing one axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceRange {
    start: Option<isize>,
    end: Option<isize>,
    step: usize,
}

impl SliceRange {
    /// Creates a new slice range.
    ///
    /// * `start` - inclusive start; `None` means the beginning of the axis.
    /// * `end` - exclusive end; `None` means the end of the axis.
    /// * `step` - stride between selected elements, must be positive.
    pub fn new(start: Option<isize>, end: Option<isize>, step: usize) -> Self {
        Self { start, end, step }
    }

    /// Creates a slice range that selects every element.
    pub fn all() -> Self {
        Self::new(None, None, 1)
    }

    /// Returns a copy of this range with a different step.
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn start(&self) -> Option<isize> {
        self.start
    }

    pub fn end(&self) -> Option<isize> {
        self.end
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Resolves the range against an axis of length `len`.
    ///
    /// Returns `(start, end, step)` with `0 <= start <= end <= len`.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is zero.
    pub fn resolve(&self, len: usize) -> Result<(usize, usize, usize)> {
        if self.step == 0 {
            return Err(DimsError::invalid_input("Slice step cannot be zero"));
        }
        let clamp = |bound: isize| -> usize {
            if bound < 0 {
                (len as isize + bound).max(0) as usize
            } else {
                (bound as usize).min(len)
            }
        };
        let start = self.start.map_or(0, clamp);
        let end = self.end.map_or(len, clamp).max(start);
        Ok((start, end, self.step))
    }

    /// Returns the number of elements selected from an axis of length `len`.
    pub fn len_for(&self, len: usize) -> Result<usize> {
        let (start, end, step) = self.resolve(len)?;
        Ok((end - start + step - 1) / step)
    }
}

impl Default for SliceRange {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for SliceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{}", start)?;
        }
        write!(f, ":")?;
        if let Some(end) = self.end {
            write!(f, "{}", end)?;
        }
        if self.step != 1 {
            write!(f, ":{}", self.step)?;
        }
        Ok(())
    }
}

/// Key for a single axis: a plain index drops the axis, a slice keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AxisIndex {
    Index(isize),
    Slice(SliceRange),
}

impl AxisIndex {
    pub fn is_index(&self) -> bool {
        matches!(self, AxisIndex::Index(_))
    }

    /// Normalizes a plain index against an axis of length `len`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds.
    pub fn normalize_index(index: isize, len: usize, axis: usize) -> Result<usize> {
        let resolved = if index < 0 { len as isize + index } else { index };
        if resolved < 0 || resolved as usize >= len {
            return Err(DimsError::index_out_of_bounds(index, len, axis));
        }
        Ok(resolved as usize)
    }
}

impl fmt::Display for AxisIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisIndex::Index(i) => write!(f, "{}", i),
            AxisIndex::Slice(s) => write!(f, "{}", s),
        }
    }
}

impl From<SliceRange> for AxisIndex {
    fn from(range: SliceRange) -> Self {
        AxisIndex::Slice(range)
    }
}

impl From<RangeFull> for AxisIndex {
    fn from(_: RangeFull) -> Self {
        AxisIndex::Slice(SliceRange::all())
    }
}

macro_rules! impl_axis_index_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AxisIndex {
                fn from(index: $t) -> Self {
                    AxisIndex::Index(index as isize)
                }
            }

            impl From<Range<$t>> for AxisIndex {
                fn from(range: Range<$t>) -> Self {
                    AxisIndex::Slice(SliceRange::new(
                        Some(range.start as isize),
                        Some(range.end as isize),
                        1,
                    ))
                }
            }

            impl From<RangeFrom<$t>> for AxisIndex {
                fn from(range: RangeFrom<$t>) -> Self {
                    AxisIndex::Slice(SliceRange::new(Some(range.start as isize), None, 1))
                }
            }

            impl From<RangeTo<$t>> for AxisIndex {
                fn from(range: RangeTo<$t>) -> Self {
                    AxisIndex::Slice(SliceRange::new(None, Some(range.end as isize), 1))
                }
            }

            impl From<RangeInclusive<$t>> for AxisIndex {
                fn from(range: RangeInclusive<$t>) -> Self {
                    let end = *range.end() as isize;
                    // -1 as an inclusive end means "through the last element"
                    let end = if end == -1 { None } else { Some(end + 1) };
                    AxisIndex::Slice(SliceRange::new(Some(*range.start() as isize), end, 1))
                }
            }
        )*
    };
}

impl_axis_index_from_int!(i32, i64, isize, usize);
