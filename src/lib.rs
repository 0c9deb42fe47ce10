//! Named-dimension arrays with optional physical units.
//!
//! A [`DimensionedArray`] attaches a name to every axis of an engine array
//! and optionally a [`Unit`]. Operands are aligned by dim name instead of by
//! position: a dim missing from one operand is broadcast, while dims present
//! on both sides must agree exactly in extent, including extent 1.
//!
//! The numeric work is delegated to an [`ArrayEngine`]; the bundled
//! [`NdValues`] engine is built on `ndarray`. Units come from one of the
//! backends in [`UnitBackend`].
//!
//! # Examples
//!
//! ```
//! use dimarray::{ops, CreationFunctions, DType, Dim, NdValues, UnitBackend};
//!
//! let dms = CreationFunctions::<NdValues>::new(Some(UnitBackend::String));
//! let a = dms.ones(["x", "y"], &[2, 3], DType::Float64, "m").unwrap();
//! let b = dms.ones(["y", "z"], &[3, 4], DType::Float64, "m").unwrap();
//!
//! let c = (&a + &b).unwrap();
//! assert_eq!(c.shape(), vec![2, 3, 4]);
//!
//! let total = ops::sum(&c, ["x", "z"], None).unwrap();
//! assert_eq!(total.dims(), &[Dim::from("y")]);
//! ```

pub mod align;
pub mod array;
pub mod creation;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod index;
mod macros;
pub mod ops;
pub mod testing;
pub mod units;

pub use align::{broadcast_and_transpose, check_alignment, merge_dims};
pub use array::DimensionedArray;
pub use creation::CreationFunctions;
pub use dimension::{Dim, DimArg, Dims, Sizes};
pub use engine::{ArrayCreation, ArrayEngine, DType, Reduction};
pub use error::{DimsError, Result};
pub use index::{AxisIndex, IndexKey, SliceRange};
pub use ops::ReduceOptions;
pub use units::{StringUnit, Unit, UnitArg, UnitBackend, UnitSystem};

#[cfg(feature = "ndarray-backend")]
pub use engine::NdValues;
#[cfg(feature = "scaled-units")]
pub use units::ScaledUnit;
