//! Macros for writing dims and sizes literals.

/// Creates a [`Dims`](crate::dimension::Dims) vector from names.
///
/// # Examples
/// ```
/// use dimarray::*;
///
/// let d = dims!["x", "y"];
/// assert_eq!(d.len(), 2);
/// assert_eq!(d[1], "y");
/// ```
#[macro_export]
macro_rules! dims {
    ($($dim:expr),* $(,)?) => {
        {
            let dims: $crate::dimension::Dims = vec![$($crate::dimension::Dim::from($dim)),*];
            dims
        }
    };
}

/// Creates an ordered [`Sizes`](crate::dimension::Sizes) mapping.
///
/// # Examples
/// ```
/// use dimarray::*;
///
/// let s = sizes!{"x" => 2, "y" => 3};
/// assert_eq!(s.shape(), vec![2, 3]);
/// assert_eq!(s.to_string(), "{'x': 2, 'y': 3}");
/// ```
#[macro_export]
macro_rules! sizes {
    ($($dim:expr => $size:expr),* $(,)?) => {
        {
            let pairs: ::std::vec::Vec<($crate::dimension::Dim, usize)> =
                vec![$(($crate::dimension::Dim::from($dim), $size)),*];
            $crate::dimension::Sizes::from_pairs(pairs)
        }
    };
}
