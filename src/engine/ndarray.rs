//! Reference array engine backed by the `ndarray` crate.
//!
//! [`NdValues`] is a dtype-tagged shared array. Clones share storage, so
//! structural operations (permute, slice, unit-axis insertion) are views; a
//! write through [`ArrayEngine::assign`] copies first if the storage is shared.

use ndarray::{ArcArray, ArrayD, ArrayView1, ArrayViewD, Axis, IxDyn, Slice, Zip};
use num_traits::{AsPrimitive, One, Zero};
use std::fmt;

use super::{ArrayCreation, ArrayEngine, DType, ReduceParams, Reduction};
use crate::error::{DimsError, Result};
use crate::index::AxisIndex;

/// Shared, dynamically-ranked `ndarray` array.
pub type Shared<T> = ArcArray<T, IxDyn>;

/// A dtype-tagged `ndarray` array.
#[derive(Debug, Clone, PartialEq)]
pub enum NdValues {
    Bool(Shared<bool>),
    Int32(Shared<i32>),
    Int64(Shared<i64>),
    Float32(Shared<f32>),
    Float64(Shared<f64>),
}

/// Element types storable in [`NdValues`].
pub trait Element: Copy + PartialOrd + fmt::Debug + Send + Sync + 'static {
    const DTYPE: DType;

    fn wrap(array: Shared<Self>) -> NdValues;

    fn extract(values: &NdValues) -> Option<&Shared<Self>>;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const DTYPE: DType = DType::$variant;

            fn wrap(array: Shared<Self>) -> NdValues {
                NdValues::$variant(array)
            }

            fn extract(values: &NdValues) -> Option<&Shared<Self>> {
                match values {
                    NdValues::$variant(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Bool);
impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(f32, Float32);
impl_element!(f64, Float64);

/// Arithmetic on numeric elements. Integer ops wrap on overflow.
trait Numeric: Element + Zero + One {
    fn plus(self, other: Self) -> Self;
    fn minus(self, other: Self) -> Self;
    fn times(self, other: Self) -> Self;
    fn negated(self) -> Self;
}

macro_rules! impl_numeric_int {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                fn plus(self, other: Self) -> Self { self.wrapping_add(other) }
                fn minus(self, other: Self) -> Self { self.wrapping_sub(other) }
                fn times(self, other: Self) -> Self { self.wrapping_mul(other) }
                fn negated(self) -> Self { self.wrapping_neg() }
            }
        )*
    };
}

macro_rules! impl_numeric_float {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                fn plus(self, other: Self) -> Self { self + other }
                fn minus(self, other: Self) -> Self { self - other }
                fn times(self, other: Self) -> Self { self * other }
                fn negated(self) -> Self { -self }
            }
        )*
    };
}

impl_numeric_int!(i32, i64);
impl_numeric_float!(f32, f64);

/// Applies `$body` to the array of any variant and rewraps in the same variant.
macro_rules! map_any {
    ($values:expr, $a:ident => $body:expr) => {
        match $values {
            NdValues::Bool($a) => NdValues::Bool($body),
            NdValues::Int32($a) => NdValues::Int32($body),
            NdValues::Int64($a) => NdValues::Int64($body),
            NdValues::Float32($a) => NdValues::Float32($body),
            NdValues::Float64($a) => NdValues::Float64($body),
        }
    };
}

/// Evaluates `$body` against the array of any variant.
macro_rules! with_any {
    ($values:expr, $a:ident => $body:expr) => {
        match $values {
            NdValues::Bool($a) => $body,
            NdValues::Int32($a) => $body,
            NdValues::Int64($a) => $body,
            NdValues::Float32($a) => $body,
            NdValues::Float64($a) => $body,
        }
    };
}

/// Like `map_any!` but rejects bool arrays.
macro_rules! map_numeric {
    ($values:expr, $what:expr, $a:ident => $body:expr) => {
        match $values {
            NdValues::Bool(_) => return Err(unsupported_for_bool($what)),
            NdValues::Int32($a) => NdValues::Int32($body),
            NdValues::Int64($a) => NdValues::Int64($body),
            NdValues::Float32($a) => NdValues::Float32($body),
            NdValues::Float64($a) => NdValues::Float64($body),
        }
    };
}

impl NdValues {
    /// Creates an array from a flat row-major buffer.
    pub fn from_shape_vec<T: Element>(shape: &[usize], data: Vec<T>) -> Result<Self> {
        let len = data.len();
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(|a| T::wrap(a.into_shared()))
            .map_err(|_| DimsError::reshape_error(len, shape.to_vec()))
    }

    /// Creates a zero-dimensional array.
    pub fn scalar<T: Element>(value: T) -> Self {
        T::wrap(ArrayD::from_elem(IxDyn(&[]), value).into_shared())
    }

    /// Returns the underlying array if it holds elements of type `T`.
    pub fn as_array<T: Element>(&self) -> Option<&Shared<T>> {
        T::extract(self)
    }

    /// Returns the elements in logical row-major order if they are of type `T`.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        T::extract(self).map(|a| a.iter().copied().collect())
    }

    /// Returns the elements converted to `f64` in logical row-major order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            NdValues::Bool(a) => a.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect(),
            NdValues::Int32(a) => a.iter().map(|&x| x as f64).collect(),
            NdValues::Int64(a) => a.iter().map(|&x| x as f64).collect(),
            NdValues::Float32(a) => a.iter().map(|&x| x as f64).collect(),
            NdValues::Float64(a) => a.iter().copied().collect(),
        }
    }

    fn float64(&self) -> Result<Shared<f64>> {
        match self.astype(DType::Float64, false)? {
            NdValues::Float64(a) => Ok(a),
            other => Err(dtype_mismatch("cast", DType::Float64, other.dtype())),
        }
    }

    fn binary<I, F>(&self, other: &Self, what: &str, int_op: I, float_op: F) -> Result<Self>
    where
        I: Fn(i64, i64) -> i64 + Copy,
        F: Fn(f64, f64) -> f64 + Copy,
    {
        let dtype = self.dtype().promote(other.dtype());
        if dtype == DType::Bool {
            return Err(unsupported_for_bool(what));
        }
        let lhs = self.astype(dtype, false)?;
        let rhs = other.astype(dtype, false)?;
        // integers go through i64 and truncate back, which wraps on overflow
        Ok(match (&lhs, &rhs) {
            (NdValues::Int32(a), NdValues::Int32(b)) => {
                NdValues::Int32(zip_map(a, b, |x, y| int_op(x as i64, y as i64) as i32)?)
            }
            (NdValues::Int64(a), NdValues::Int64(b)) => NdValues::Int64(zip_map(a, b, int_op)?),
            (NdValues::Float32(a), NdValues::Float32(b)) => {
                NdValues::Float32(zip_map(a, b, |x, y| float_op(x as f64, y as f64) as f32)?)
            }
            (NdValues::Float64(a), NdValues::Float64(b)) => NdValues::Float64(zip_map(a, b, float_op)?),
            (l, r) => return Err(dtype_mismatch(what, l.dtype(), r.dtype())),
        })
    }
}

impl From<Vec<f64>> for NdValues {
    fn from(data: Vec<f64>) -> Self {
        NdValues::Float64(ndarray::Array1::from(data).into_dyn().into_shared())
    }
}

macro_rules! impl_from_array {
    ($($t:ty),*) => {
        $(
            impl From<ArrayD<$t>> for NdValues {
                fn from(array: ArrayD<$t>) -> Self {
                    <$t as Element>::wrap(array.into_shared())
                }
            }

            impl From<Shared<$t>> for NdValues {
                fn from(array: Shared<$t>) -> Self {
                    <$t as Element>::wrap(array)
                }
            }
        )*
    };
}

impl_from_array!(bool, i32, i64, f32, f64);

fn unsupported_for_bool(what: &str) -> DimsError {
    DimsError::invalid_operation(format!("`{}` is not supported for bool arrays", what))
}

fn dtype_mismatch(what: &str, a: DType, b: DType) -> DimsError {
    DimsError::invalid_operation(format!("`{}` got mismatched dtypes {} and {}", what, a, b))
}

fn check_axis(axis: usize, ndim: usize) -> Result<()> {
    if axis >= ndim {
        return Err(DimsError::invalid_operation(format!(
            "Invalid axis: {} for array of dimension {}",
            axis, ndim
        )));
    }
    Ok(())
}

fn check_permutation(axes: &[usize], ndim: usize) -> Result<()> {
    let mut seen = vec![false; ndim];
    if axes.len() != ndim {
        return Err(DimsError::invalid_operation(format!(
            "Invalid axes: {:?} for array of dimension {}",
            axes, ndim
        )));
    }
    for &axis in axes {
        check_axis(axis, ndim)?;
        if seen[axis] {
            return Err(DimsError::invalid_operation(format!("Duplicate axis: {}", axis)));
        }
        seen[axis] = true;
    }
    Ok(())
}

/// Largest element count `arange` will allocate.
const MAX_ARANGE_LEN: f64 = (1u64 << 32) as f64;

fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    if a.len() != b.len() {
        return Err(DimsError::invalid_operation(format!(
            "Incompatible shapes for operation: {:?} and {:?}",
            a, b
        )));
    }
    a.iter()
        .zip(b)
        .map(|(&x, &y)| match (x, y) {
            (x, y) if x == y => Ok(x),
            (1, y) => Ok(y),
            (x, 1) => Ok(x),
            _ => Err(DimsError::invalid_operation(format!(
                "Incompatible shapes for operation: {:?} and {:?}",
                a, b
            ))),
        })
        .collect()
}

fn zip_map<T, U, F>(a: &Shared<T>, b: &Shared<T>, f: F) -> Result<Shared<U>>
where
    T: Copy,
    F: Fn(T, T) -> U,
{
    let shape = broadcast_shape(a.shape(), b.shape())?;
    let incompatible = || {
        DimsError::invalid_operation(format!(
            "Broadcast error: cannot broadcast {:?} and {:?}",
            a.shape(),
            b.shape()
        ))
    };
    let av = a.broadcast(IxDyn(&shape)).ok_or_else(incompatible)?;
    let bv = b.broadcast(IxDyn(&shape)).ok_or_else(incompatible)?;
    Ok(Zip::from(&av)
        .and(&bv)
        .map_collect(|&x, &y| f(x, y))
        .into_shared())
}

fn reshape_array<T: Clone>(a: &Shared<T>, shape: &[usize]) -> Result<Shared<T>> {
    let size: usize = shape.iter().product();
    if size != a.len() {
        return Err(DimsError::reshape_error(a.len(), shape.to_vec()));
    }
    a.as_standard_layout()
        .into_owned()
        .into_shape(IxDyn(shape))
        .map(|r| r.into_shared())
        .map_err(|_| DimsError::reshape_error(size, shape.to_vec()))
}

fn squeeze_array<T: Clone>(a: &Shared<T>, axes: &[usize]) -> Result<Shared<T>> {
    let mut sorted = axes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let mut out = a.clone();
    for &axis in sorted.iter().rev() {
        check_axis(axis, a.ndim())?;
        if a.len_of(Axis(axis)) != 1 {
            return Err(DimsError::invalid_operation(format!(
                "Cannot squeeze axis {} of extent {}",
                axis,
                a.len_of(Axis(axis))
            )));
        }
        out = out.index_axis_move(Axis(axis), 0);
    }
    Ok(out)
}

// `ArcArray` cannot hold the zero strides of a broadcast view, so only a
// no-op broadcast shares storage; repeated axes are copied.
fn broadcast_array<T: Clone>(a: &Shared<T>, shape: &[usize]) -> Result<Shared<T>> {
    if a.shape() == shape {
        return Ok(a.clone());
    }
    broadcast_shape(a.shape(), shape)
        .ok()
        .filter(|s| s.as_slice() == shape)
        .and_then(|_| a.broadcast(IxDyn(shape)))
        .map(|v| v.to_owned().into_shared())
        .ok_or_else(|| {
            DimsError::invalid_operation(format!(
                "Broadcast error: cannot broadcast array of shape {:?} to {:?}",
                a.shape(),
                shape
            ))
        })
}

fn take_array<T: Clone>(a: &Shared<T>, indices: &[i64], axis: usize) -> Result<Shared<T>> {
    check_axis(axis, a.ndim())?;
    let len = a.len_of(Axis(axis));
    let positions = indices
        .iter()
        .map(|&i| AxisIndex::normalize_index(i as isize, len, axis))
        .collect::<Result<Vec<usize>>>()?;
    Ok(a.select(Axis(axis), &positions).into_shared())
}

fn select_view<'a, T>(mut view: ArrayViewD<'a, T>, key: &[AxisIndex]) -> Result<ArrayViewD<'a, T>> {
    if key.len() != view.ndim() {
        return Err(DimsError::invalid_input(format!(
            "Index key has {} entries for array of dimension {}",
            key.len(),
            view.ndim()
        )));
    }
    for (axis, entry) in key.iter().enumerate().rev() {
        let len = view.len_of(Axis(axis));
        match entry {
            AxisIndex::Index(i) => {
                let i = AxisIndex::normalize_index(*i, len, axis)?;
                view = view.index_axis_move(Axis(axis), i);
            }
            AxisIndex::Slice(range) => {
                let (start, end, step) = range.resolve(len)?;
                view.slice_axis_inplace(
                    Axis(axis),
                    Slice::new(start as isize, Some(end as isize), step as isize),
                );
            }
        }
    }
    Ok(view)
}

fn assign_array<T: Clone>(a: &mut Shared<T>, key: &[AxisIndex], value: &Shared<T>) -> Result<()> {
    // validate against a read-only view before touching (and unsharing) storage
    let target_shape = select_view(a.view(), key)?.shape().to_vec();
    let source = value.broadcast(IxDyn(&target_shape)).ok_or_else(|| {
        DimsError::invalid_operation(format!(
            "Broadcast error: cannot broadcast array of shape {:?} to {:?}",
            value.shape(),
            target_shape
        ))
    })?;
    let mut target = a.view_mut();
    for (axis, entry) in key.iter().enumerate().rev() {
        let len = target.len_of(Axis(axis));
        match entry {
            AxisIndex::Index(i) => {
                let i = AxisIndex::normalize_index(*i, len, axis)?;
                target = target.index_axis_move(Axis(axis), i);
            }
            AxisIndex::Slice(range) => {
                let (start, end, step) = range.resolve(len)?;
                target.slice_axis_inplace(
                    Axis(axis),
                    Slice::new(start as isize, Some(end as isize), step as isize),
                );
            }
        }
    }
    target.assign(&source);
    Ok(())
}

/// Moves `axes` to the end and merges them into one trailing axis.
fn collapse_axes<T: Clone>(a: &Shared<T>, axes: &[usize]) -> Result<ArrayD<T>> {
    let ndim = a.ndim();
    let mut seen = vec![false; ndim];
    for &axis in axes {
        check_axis(axis, ndim)?;
        if seen[axis] {
            return Err(DimsError::invalid_operation(format!("Duplicate axis: {}", axis)));
        }
        seen[axis] = true;
    }
    let kept: Vec<usize> = (0..ndim).filter(|ax| !seen[*ax]).collect();
    let mut order = kept.clone();
    order.extend_from_slice(axes);
    let mut shape: Vec<usize> = kept.iter().map(|&ax| a.len_of(Axis(ax))).collect();
    shape.push(axes.iter().map(|&ax| a.len_of(Axis(ax))).product());
    let size = a.len();
    a.view()
        .permuted_axes(order)
        .as_standard_layout()
        .into_owned()
        .into_shape(IxDyn(&shape))
        .map_err(|_| DimsError::reshape_error(size, shape.clone()))
}

fn reduce_lanes<T, U, F>(a: &Shared<T>, axes: &[usize], f: F) -> Result<Shared<U>>
where
    T: Clone,
    F: FnMut(ArrayView1<'_, T>) -> U,
{
    let collapsed = collapse_axes(a, axes)?;
    let last = Axis(collapsed.ndim() - 1);
    Ok(collapsed.map_axis(last, f).into_shared())
}

fn is_nan<T: PartialOrd>(x: &T) -> bool {
    x.partial_cmp(x).is_none()
}

fn extreme<T: Element>(a: &Shared<T>, axes: &[usize], op: Reduction) -> Result<Shared<T>> {
    if axes.iter().any(|&ax| ax < a.ndim() && a.len_of(Axis(ax)) == 0) {
        return Err(DimsError::invalid_operation(format!(
            "zero-size array to reduction operation `{}` which has no identity",
            op
        )));
    }
    let pick_max = op == Reduction::Max;
    reduce_lanes(a, axes, |lane| {
        lane.iter().skip(1).fold(lane[0], |acc, &x| {
            if is_nan(&acc) {
                acc
            } else if is_nan(&x) || (pick_max && x > acc) || (!pick_max && x < acc) {
                x
            } else {
                acc
            }
        })
    })
}

fn sum_lanes<T: Numeric>(a: &Shared<T>, axes: &[usize]) -> Result<Shared<T>> {
    reduce_lanes(a, axes, |lane| lane.iter().fold(T::zero(), |acc, &x| acc.plus(x)))
}

fn prod_lanes<T: Numeric>(a: &Shared<T>, axes: &[usize]) -> Result<Shared<T>> {
    reduce_lanes(a, axes, |lane| lane.iter().fold(T::one(), |acc, &x| acc.times(x)))
}

fn moment_lanes(a: &Shared<f64>, axes: &[usize], op: Reduction, correction: f64) -> Result<Shared<f64>> {
    reduce_lanes(a, axes, |lane| {
        let n = lane.len() as f64;
        let mean = lane.iter().sum::<f64>() / n;
        if op == Reduction::Mean {
            return mean;
        }
        let var = lane.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (n - correction);
        if op == Reduction::Std {
            var.sqrt()
        } else {
            var
        }
    })
}

fn cast_numeric<S>(a: &Shared<S>, dtype: DType) -> NdValues
where
    S: Copy + Zero + PartialEq + 'static,
    S: AsPrimitive<i32> + AsPrimitive<i64> + AsPrimitive<f32> + AsPrimitive<f64>,
{
    match dtype {
        DType::Bool => NdValues::Bool(a.mapv(|x| x != S::zero()).into_shared()),
        DType::Int32 => NdValues::Int32(a.mapv(<S as AsPrimitive<i32>>::as_).into_shared()),
        DType::Int64 => NdValues::Int64(a.mapv(<S as AsPrimitive<i64>>::as_).into_shared()),
        DType::Float32 => NdValues::Float32(a.mapv(<S as AsPrimitive<f32>>::as_).into_shared()),
        DType::Float64 => NdValues::Float64(a.mapv(<S as AsPrimitive<f64>>::as_).into_shared()),
    }
}

fn cast_bool(a: &Shared<bool>, dtype: DType) -> NdValues {
    match dtype {
        DType::Bool => NdValues::Bool(a.clone()),
        DType::Int32 => NdValues::Int32(a.mapv(i32::from).into_shared()),
        DType::Int64 => NdValues::Int64(a.mapv(i64::from).into_shared()),
        DType::Float32 => NdValues::Float32(a.mapv(|x| if x { 1.0 } else { 0.0 }).into_shared()),
        DType::Float64 => NdValues::Float64(a.mapv(|x| if x { 1.0 } else { 0.0 }).into_shared()),
    }
}

fn float_map<F>(values: &NdValues, what: &str, f: F) -> Result<NdValues>
where
    F: Fn(f64) -> f64,
{
    match values {
        NdValues::Bool(_) => Err(unsupported_for_bool(what)),
        NdValues::Float32(a) => Ok(NdValues::Float32(a.mapv(|x| f(x as f64) as f32).into_shared())),
        other => Ok(NdValues::Float64(other.float64()?.mapv(f).into_shared())),
    }
}

impl ArrayEngine for NdValues {
    fn dtype(&self) -> DType {
        match self {
            NdValues::Bool(_) => DType::Bool,
            NdValues::Int32(_) => DType::Int32,
            NdValues::Int64(_) => DType::Int64,
            NdValues::Float32(_) => DType::Float32,
            NdValues::Float64(_) => DType::Float64,
        }
    }

    fn shape(&self) -> Vec<usize> {
        with_any!(self, a => a.shape().to_vec())
    }

    fn ndim(&self) -> usize {
        with_any!(self, a => a.ndim())
    }

    fn size(&self) -> usize {
        with_any!(self, a => a.len())
    }

    fn reshape(&self, shape: &[usize]) -> Result<Self> {
        Ok(map_any!(self, a => reshape_array(a, shape)?))
    }

    fn permute_dims(&self, axes: &[usize]) -> Result<Self> {
        check_permutation(axes, self.ndim())?;
        Ok(map_any!(self, a => a.clone().permuted_axes(axes.to_vec())))
    }

    fn expand_dims(&self, axis: usize) -> Result<Self> {
        if axis > self.ndim() {
            return Err(DimsError::invalid_operation(format!(
                "Invalid axis: {} for inserting into array of dimension {}",
                axis,
                self.ndim()
            )));
        }
        Ok(map_any!(self, a => a.clone().insert_axis(Axis(axis))))
    }

    fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        Ok(map_any!(self, a => broadcast_array(a, shape)?))
    }

    fn squeeze(&self, axes: &[usize]) -> Result<Self> {
        Ok(map_any!(self, a => squeeze_array(a, axes)?))
    }

    fn concat(arrays: &[Self], axis: usize) -> Result<Self> {
        join(arrays, axis, false)
    }

    fn stack(arrays: &[Self], axis: usize) -> Result<Self> {
        join(arrays, axis, true)
    }

    fn take(&self, indices: &Self, axis: usize) -> Result<Self> {
        if !indices.dtype().is_integer() {
            return Err(DimsError::invalid_input(format!(
                "Indices must be integers, got {}",
                indices.dtype()
            )));
        }
        let positions = match indices.astype(DType::Int64, false)? {
            NdValues::Int64(a) => a.iter().copied().collect::<Vec<i64>>(),
            other => return Err(dtype_mismatch("take", DType::Int64, other.dtype())),
        };
        Ok(map_any!(self, a => take_array(a, &positions, axis)?))
    }

    fn slice(&self, key: &[AxisIndex]) -> Result<Self> {
        // the selection stays a view into the shared storage
        Ok(map_any!(self, a => slice_shared(a.clone(), key)?))
    }

    fn assign(&mut self, key: &[AxisIndex], value: &Self) -> Result<()> {
        let value = value.astype(self.dtype(), false)?;
        match (self, &value) {
            (NdValues::Bool(a), NdValues::Bool(v)) => assign_array(a, key, v),
            (NdValues::Int32(a), NdValues::Int32(v)) => assign_array(a, key, v),
            (NdValues::Int64(a), NdValues::Int64(v)) => assign_array(a, key, v),
            (NdValues::Float32(a), NdValues::Float32(v)) => assign_array(a, key, v),
            (NdValues::Float64(a), NdValues::Float64(v)) => assign_array(a, key, v),
            (a, v) => Err(dtype_mismatch("assign", a.dtype(), v.dtype())),
        }
    }

    fn neg(&self) -> Result<Self> {
        Ok(map_numeric!(self, "neg", a => a.mapv(Numeric::negated).into_shared()))
    }

    fn exp(&self) -> Result<Self> {
        float_map(self, "exp", f64::exp)
    }

    fn add(&self, other: &Self) -> Result<Self> {
        self.binary(other, "add", i64::wrapping_add, |x, y| x + y)
    }

    fn sub(&self, other: &Self) -> Result<Self> {
        self.binary(other, "sub", i64::wrapping_sub, |x, y| x - y)
    }

    fn mul(&self, other: &Self) -> Result<Self> {
        self.binary(other, "mul", i64::wrapping_mul, |x, y| x * y)
    }

    fn div(&self, other: &Self) -> Result<Self> {
        // true division: integer operands are promoted to float
        let dtype = self.dtype().promote(other.dtype());
        if dtype == DType::Bool {
            return Err(unsupported_for_bool("div"));
        }
        let dtype = if dtype.is_floating() { dtype } else { DType::Float64 };
        let lhs = self.astype(dtype, false)?;
        let rhs = other.astype(dtype, false)?;
        match (&lhs, &rhs) {
            (NdValues::Float32(a), NdValues::Float32(b)) => Ok(NdValues::Float32(zip_map(a, b, |x, y| x / y)?)),
            (NdValues::Float64(a), NdValues::Float64(b)) => Ok(NdValues::Float64(zip_map(a, b, |x, y| x / y)?)),
            (l, r) => Err(dtype_mismatch("div", l.dtype(), r.dtype())),
        }
    }

    fn scale(&self, factor: f64) -> Result<Self> {
        float_map(self, "scale", |x| x * factor)
    }

    fn reduce(&self, op: Reduction, axes: &[usize], params: &ReduceParams) -> Result<Self> {
        match op {
            Reduction::All | Reduction::Any => match self.astype(DType::Bool, false)? {
                NdValues::Bool(a) => {
                    let out = if op == Reduction::All {
                        reduce_lanes(&a, axes, |lane| lane.iter().all(|&x| x))?
                    } else {
                        reduce_lanes(&a, axes, |lane| lane.iter().any(|&x| x))?
                    };
                    Ok(NdValues::Bool(out))
                }
                other => Err(dtype_mismatch("reduce", DType::Bool, other.dtype())),
            },
            Reduction::Max | Reduction::Min => Ok(map_any!(self, a => extreme(a, axes, op)?)),
            Reduction::Sum | Reduction::Prod => {
                let dtype = match (params.dtype, self.dtype()) {
                    (Some(dtype), _) => dtype,
                    (None, DType::Bool) | (None, DType::Int32) => DType::Int64,
                    (None, dtype) => dtype,
                };
                let values = self.astype(dtype, false)?;
                Ok(if op == Reduction::Sum {
                    map_numeric!(&values, "sum", a => sum_lanes(a, axes)?)
                } else {
                    map_numeric!(&values, "prod", a => prod_lanes(a, axes)?)
                })
            }
            Reduction::Mean | Reduction::Std | Reduction::Var => {
                if self.dtype() == DType::Bool {
                    return Err(unsupported_for_bool(&op.to_string()));
                }
                let out = NdValues::Float64(moment_lanes(&self.float64()?, axes, op, params.correction)?);
                out.astype(self.dtype().floating(), false)
            }
        }
    }

    fn astype(&self, dtype: DType, copy: bool) -> Result<Self> {
        if self.dtype() == dtype {
            return Ok(if copy {
                map_any!(self, a => a.to_owned().into_shared())
            } else {
                self.clone()
            });
        }
        Ok(match self {
            NdValues::Bool(a) => cast_bool(a, dtype),
            NdValues::Int32(a) => cast_numeric(a, dtype),
            NdValues::Int64(a) => cast_numeric(a, dtype),
            NdValues::Float32(a) => cast_numeric(a, dtype),
            NdValues::Float64(a) => cast_numeric(a, dtype),
        })
    }
}

fn slice_shared<T: Clone>(mut out: Shared<T>, key: &[AxisIndex]) -> Result<Shared<T>> {
    if key.len() != out.ndim() {
        return Err(DimsError::invalid_input(format!(
            "Index key has {} entries for array of dimension {}",
            key.len(),
            out.ndim()
        )));
    }
    for (axis, entry) in key.iter().enumerate().rev() {
        let len = out.len_of(Axis(axis));
        match entry {
            AxisIndex::Index(i) => {
                let i = AxisIndex::normalize_index(*i, len, axis)?;
                out = out.index_axis_move(Axis(axis), i);
            }
            AxisIndex::Slice(range) => {
                let (start, end, step) = range.resolve(len)?;
                out.slice_axis_inplace(
                    Axis(axis),
                    Slice::new(start as isize, Some(end as isize), step as isize),
                );
            }
        }
    }
    Ok(out)
}

fn join(arrays: &[NdValues], axis: usize, new_axis: bool) -> Result<NdValues> {
    let what = if new_axis { "stack" } else { "concat" };
    let first = arrays
        .first()
        .ok_or_else(|| DimsError::invalid_input(format!("`{}` needs at least one array", what)))?;
    let dtype = arrays.iter().fold(first.dtype(), |acc, v| acc.promote(v.dtype()));
    let ndim = first.ndim();
    let limit = if new_axis { ndim + 1 } else { ndim };
    check_axis(axis, limit)?;
    let cast = arrays
        .iter()
        .map(|v| v.astype(dtype, false))
        .collect::<Result<Vec<_>>>()?;
    Ok(match dtype {
        DType::Bool => NdValues::Bool(join_typed::<bool>(&cast, axis, new_axis)?),
        DType::Int32 => NdValues::Int32(join_typed::<i32>(&cast, axis, new_axis)?),
        DType::Int64 => NdValues::Int64(join_typed::<i64>(&cast, axis, new_axis)?),
        DType::Float32 => NdValues::Float32(join_typed::<f32>(&cast, axis, new_axis)?),
        DType::Float64 => NdValues::Float64(join_typed::<f64>(&cast, axis, new_axis)?),
    })
}

fn join_typed<T: Element>(arrays: &[NdValues], axis: usize, new_axis: bool) -> Result<Shared<T>> {
    let views = arrays
        .iter()
        .map(|v| {
            T::extract(v)
                .map(|a| a.view())
                .ok_or_else(|| dtype_mismatch("join", T::DTYPE, v.dtype()))
        })
        .collect::<Result<Vec<_>>>()?;
    let joined = if new_axis {
        ndarray::stack(Axis(axis), &views)
    } else {
        ndarray::concatenate(Axis(axis), &views)
    };
    joined.map(|a| a.into_shared()).map_err(|e| {
        DimsError::invalid_operation(format!("Cannot join arrays along axis {}: {}", axis, e))
    })
}

impl ArrayCreation for NdValues {
    fn arange(start: f64, stop: f64, step: f64, dtype: Option<DType>) -> Result<Self> {
        if step == 0.0 || !step.is_finite() {
            return Err(DimsError::invalid_input("arange step must be finite and non-zero"));
        }
        let count = ((stop - start) / step).ceil();
        if !count.is_finite() || count > MAX_ARANGE_LEN {
            return Err(DimsError::invalid_input(format!(
                "arange({}, {}, {}) needs a finite element count of at most {}",
                start, stop, step, MAX_ARANGE_LEN
            )));
        }
        let count = count.max(0.0) as usize;
        let data: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();
        let integral = [start, stop, step].iter().all(|v| v.fract() == 0.0);
        let dtype = dtype.unwrap_or(if integral { DType::Int64 } else { DType::Float64 });
        NdValues::from_shape_vec(&[count], data)?.astype(dtype, false)
    }

    fn linspace(start: f64, stop: f64, num: usize, dtype: Option<DType>) -> Result<Self> {
        let data: Vec<f64> = match num {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (stop - start) / (num - 1) as f64;
                (0..num)
                    .map(|i| if i == num - 1 { stop } else { start + i as f64 * step })
                    .collect()
            }
        };
        NdValues::from_shape_vec(&[num], data)?.astype(dtype.unwrap_or(DType::Float64), false)
    }

    fn full(shape: &[usize], fill: f64, dtype: DType) -> Result<Self> {
        let values = NdValues::Float64(ArrayD::from_elem(IxDyn(shape), fill).into_shared());
        values.astype(dtype, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SliceRange;
    use approx::assert_relative_eq;

    fn iota(shape: &[usize]) -> NdValues {
        let n: usize = shape.iter().product();
        NdValues::from_shape_vec(shape, (0..n as i64).collect()).unwrap()
    }

    #[test]
    fn test_shape_and_dtype() {
        let a = iota(&[2, 3]);
        assert_eq!(a.shape(), vec![2, 3]);
        assert_eq!(a.ndim(), 2);
        assert_eq!(a.size(), 6);
        assert_eq!(a.dtype(), DType::Int64);
    }

    #[test]
    fn test_permute_and_expand() {
        let a = iota(&[2, 3]);
        let p = a.permute_dims(&[1, 0]).unwrap();
        assert_eq!(p.shape(), vec![3, 2]);
        assert_eq!(p.to_vec::<i64>().unwrap(), vec![0, 3, 1, 4, 2, 5]);
        assert!(a.permute_dims(&[0, 0]).is_err());

        let e = a.expand_dims(0).unwrap();
        assert_eq!(e.shape(), vec![1, 2, 3]);
        assert!(a.expand_dims(3).is_err());
    }

    #[test]
    fn test_reshape() {
        let a = iota(&[2, 3]).permute_dims(&[1, 0]).unwrap();
        let r = a.reshape(&[6]).unwrap();
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![0, 3, 1, 4, 2, 5]);
        assert!(a.reshape(&[4]).is_err());
    }

    #[test]
    fn test_binary_broadcasts_unit_axes() {
        let a = iota(&[2, 1]);
        let b = iota(&[1, 3]);
        let c = a.add(&b).unwrap();
        assert_eq!(c.shape(), vec![2, 3]);
        assert_eq!(c.to_vec::<i64>().unwrap(), vec![0, 1, 2, 1, 2, 3]);
        assert!(iota(&[2]).add(&iota(&[3])).is_err());
    }

    #[test]
    fn test_binary_promotes() {
        let a = iota(&[2]);
        let b = NdValues::from(vec![0.5, 0.5]);
        let c = a.mul(&b).unwrap();
        assert_eq!(c.dtype(), DType::Float64);
        assert_eq!(c.to_vec::<f64>().unwrap(), vec![0.0, 0.5]);

        let d = iota(&[2]).div(&iota(&[2])).unwrap();
        assert_eq!(d.dtype(), DType::Float64);
    }

    #[test]
    fn test_bool_arithmetic_rejected() {
        let a = NdValues::from_shape_vec(&[2], vec![true, false]).unwrap();
        assert!(a.neg().is_err());
        assert!(a.add(&a).is_err());
    }

    #[test]
    fn test_slice_and_assign() {
        let a = iota(&[2, 3]);
        let row = a.slice(&[AxisIndex::Index(1), AxisIndex::Slice(SliceRange::all())]).unwrap();
        assert_eq!(row.to_vec::<i64>().unwrap(), vec![3, 4, 5]);

        let cols = a
            .slice(&[AxisIndex::Slice(SliceRange::all()), AxisIndex::Slice(SliceRange::new(Some(-2), None, 1))])
            .unwrap();
        assert_eq!(cols.shape(), vec![2, 2]);
        assert_eq!(cols.to_vec::<i64>().unwrap(), vec![1, 2, 4, 5]);

        let mut b = a.clone();
        let value = NdValues::from_shape_vec(&[1], vec![9i64]).unwrap();
        b.assign(&[AxisIndex::Index(0), AxisIndex::Slice(SliceRange::all())], &value).unwrap();
        assert_eq!(b.to_vec::<i64>().unwrap(), vec![9, 9, 9, 3, 4, 5]);
        // the original shares nothing observable with the written copy
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![0, 1, 2, 3, 4, 5]);

        assert!(a.slice(&[AxisIndex::Index(2), AxisIndex::Index(0)]).is_err());
    }

    #[test]
    fn test_broadcast_to() {
        let a = iota(&[1, 3]);
        let same = a.broadcast_to(&[1, 3]).unwrap();
        match (&a, &same) {
            (NdValues::Int64(x), NdValues::Int64(y)) => assert_eq!(x.as_ptr(), y.as_ptr()),
            _ => panic!("broadcast changed the dtype"),
        }

        let mut wide = a.broadcast_to(&[2, 3]).unwrap();
        assert_eq!(wide.to_vec::<i64>().unwrap(), vec![0, 1, 2, 0, 1, 2]);
        let value = NdValues::from_shape_vec(&[1], vec![7i64]).unwrap();
        wide.assign(&[AxisIndex::Index(1), AxisIndex::Slice(SliceRange::all())], &value).unwrap();
        assert_eq!(wide.to_vec::<i64>().unwrap(), vec![0, 1, 2, 7, 7, 7]);
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![0, 1, 2]);

        assert!(a.broadcast_to(&[3, 2]).is_err());
    }

    #[test]
    fn test_take() {
        let a = iota(&[2, 3]);
        let idx = NdValues::from_shape_vec(&[2], vec![2i64, -3]).unwrap();
        let t = a.take(&idx, 1).unwrap();
        assert_eq!(t.to_vec::<i64>().unwrap(), vec![2, 0, 5, 3]);
        let bad = NdValues::from_shape_vec(&[1], vec![3i64]).unwrap();
        assert!(a.take(&bad, 1).is_err());
    }

    #[test]
    fn test_concat_and_stack() {
        let a = iota(&[2, 3]);
        let c = NdValues::concat(&[a.clone(), a.clone()], 0).unwrap();
        assert_eq!(c.shape(), vec![4, 3]);
        let s = NdValues::stack(&[a.clone(), a.clone()], 2).unwrap();
        assert_eq!(s.shape(), vec![2, 3, 2]);
        assert!(NdValues::concat(&[], 0).is_err());
        assert!(NdValues::concat(&[a.clone(), iota(&[2, 2])], 0).is_err());
    }

    #[test]
    fn test_reductions() {
        let a = iota(&[2, 3]).astype(DType::Float64, false).unwrap();
        let params = ReduceParams::default();
        let sum = a.reduce(Reduction::Sum, &[0], &params).unwrap();
        assert_eq!(sum.to_vec::<f64>().unwrap(), vec![3.0, 5.0, 7.0]);
        let max = a.reduce(Reduction::Max, &[1], &params).unwrap();
        assert_eq!(max.to_vec::<f64>().unwrap(), vec![2.0, 5.0]);
        let total = a.reduce(Reduction::Sum, &[0, 1], &params).unwrap();
        assert_eq!(total.shape(), Vec::<usize>::new());
        assert_eq!(total.to_vec::<f64>().unwrap(), vec![15.0]);
        let mean = a.reduce(Reduction::Mean, &[1, 0], &params).unwrap();
        assert_relative_eq!(mean.to_vec::<f64>().unwrap()[0], 2.5);
        let var = a.reduce(Reduction::Var, &[1], &params).unwrap();
        assert_relative_eq!(var.to_vec::<f64>().unwrap()[0], 2.0 / 3.0, epsilon = 1e-12);
        let std = a
            .reduce(Reduction::Std, &[1], &ReduceParams { correction: 1.0, dtype: None })
            .unwrap();
        assert_relative_eq!(std.to_vec::<f64>().unwrap()[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_integer_sum_widens() {
        let a = NdValues::from_shape_vec(&[3], vec![1i32, 2, 3]).unwrap();
        let sum = a.reduce(Reduction::Sum, &[0], &ReduceParams::default()).unwrap();
        assert_eq!(sum.dtype(), DType::Int64);
        assert_eq!(sum.to_vec::<i64>().unwrap(), vec![6]);
    }

    #[test]
    fn test_max_of_empty_axis_fails() {
        let a = NdValues::from_shape_vec::<f64>(&[0], vec![]).unwrap();
        assert!(a.reduce(Reduction::Max, &[0], &ReduceParams::default()).is_err());
    }

    #[test]
    fn test_astype() {
        let a = NdValues::from(vec![1.7, -0.2, 0.0]);
        assert_eq!(a.astype(DType::Int32, true).unwrap().to_vec::<i32>().unwrap(), vec![1, 0, 0]);
        assert_eq!(
            a.astype(DType::Bool, true).unwrap().to_vec::<bool>().unwrap(),
            vec![true, true, false]
        );
        assert_eq!(a.astype(DType::Float64, false).unwrap(), a);
    }

    #[test]
    fn test_creation() {
        let a = NdValues::arange(0.0, 3.0, 1.0, None).unwrap();
        assert_eq!(a.dtype(), DType::Int64);
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![0, 1, 2]);
        let l = NdValues::linspace(0.0, 1.0, 3, None).unwrap();
        assert_eq!(l.to_vec::<f64>().unwrap(), vec![0.0, 0.5, 1.0]);
        let o = NdValues::ones(&[2, 2], DType::Float32).unwrap();
        assert_eq!(o.to_vec::<f32>().unwrap(), vec![1.0; 4]);
        assert!(NdValues::arange(0.0, 1.0, 0.0, None).is_err());
        assert_eq!(NdValues::arange(3.0, 0.0, 1.0, None).unwrap().size(), 0);
    }

    #[test]
    fn test_arange_rejects_huge_or_undefined_counts() {
        for (start, stop, step) in [(0.0, 1e300, 1.0), (0.0, f64::INFINITY, 1.0), (0.0, f64::NAN, 1.0), (0.0, 1.0, 1e-300)] {
            let err = NdValues::arange(start, stop, step, None).unwrap_err();
            assert!(matches!(err, DimsError::InvalidInput(_)), "{}..{} by {}", start, stop, step);
        }
    }
}
