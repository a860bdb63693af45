//! Array Creation Functions
//!
//! Factory functions that allocate a new buffer of `product(shape) *
//! itemsize` bytes and initialize it: constant fills, identity and offset
//! diagonals, ranges, element functions and iterators. Randomized creation
//! takes the caller's generator explicitly; there is no global random
//! state.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use ndview_core::buffer::Buffer;
use ndview_core::dtype::{DType, Descr, Value};
use ndview_core::error::{Error, Result};

use crate::array::ArrayHandle;
use crate::layout::{numel, unravel_index, Layout, Order};

// =============================================================================
// Constant Initialization
// =============================================================================

fn filled(shape: &[usize], dtype: DType, value: &Value) -> Result<ArrayHandle> {
    let descr = Descr::native(dtype);
    let itemsize = descr.itemsize();
    let mut element = vec![0u8; itemsize];
    descr.write(value, &mut element)?;

    let data = element.repeat(numel(shape));
    let layout = Layout::packed(shape, descr, Order::C);
    Ok(ArrayHandle::from_owned(Buffer::from_vec(data), layout))
}

/// Allocates an array without initializing its elements for reading.
///
/// The contents are unspecified and callers must write before reading;
/// this implementation happens to hand out zeroed memory.
#[must_use]
pub fn empty(shape: &[usize], dtype: DType) -> ArrayHandle {
    zeros(shape, dtype)
}

/// Creates an array filled with zeros.
#[must_use]
pub fn zeros(shape: &[usize], dtype: DType) -> ArrayHandle {
    let descr = Descr::native(dtype);
    let buffer = Buffer::zeroed(numel(shape) * descr.itemsize());
    ArrayHandle::from_owned(buffer, Layout::packed(shape, descr, Order::C))
}

/// Creates an array filled with ones.
pub fn ones(shape: &[usize], dtype: DType) -> Result<ArrayHandle> {
    filled(shape, dtype, &Value::Int(1))
}

/// Creates an array filled with `value`, converted to `dtype`.
pub fn full(shape: &[usize], dtype: DType, value: impl Into<Value>) -> Result<ArrayHandle> {
    filled(shape, dtype, &value.into())
}

/// Like [`empty`] with the template's shape and (by default) dtype.
#[must_use]
pub fn empty_like(template: &ArrayHandle, dtype: Option<DType>) -> ArrayHandle {
    empty(template.shape(), dtype.unwrap_or_else(|| template.dtype()))
}

/// Like [`zeros`] with the template's shape and (by default) dtype.
#[must_use]
pub fn zeros_like(template: &ArrayHandle, dtype: Option<DType>) -> ArrayHandle {
    zeros(template.shape(), dtype.unwrap_or_else(|| template.dtype()))
}

/// Like [`ones`] with the template's shape and (by default) dtype.
pub fn ones_like(template: &ArrayHandle, dtype: Option<DType>) -> Result<ArrayHandle> {
    ones(template.shape(), dtype.unwrap_or_else(|| template.dtype()))
}

/// Like [`full`] with the template's shape and (by default) dtype.
pub fn full_like(
    template: &ArrayHandle,
    dtype: Option<DType>,
    value: impl Into<Value>,
) -> Result<ArrayHandle> {
    full(
        template.shape(),
        dtype.unwrap_or_else(|| template.dtype()),
        value,
    )
}

// =============================================================================
// Identity and Diagonal
// =============================================================================

/// Creates a `rows x cols` array with ones where `col - row == k`.
///
/// `cols` defaults to `rows`.
pub fn eye(rows: usize, cols: Option<usize>, k: isize, dtype: DType) -> Result<ArrayHandle> {
    let cols = cols.unwrap_or(rows);
    let result = zeros(&[rows, cols], dtype);
    for row in 0..rows {
        let col = row as isize + k;
        if col >= 0 && (col as usize) < cols {
            result.set(&[row, col as usize], 1)?;
        }
    }
    Ok(result)
}

/// Creates an `n x n` identity array.
pub fn identity(n: usize, dtype: DType) -> Result<ArrayHandle> {
    eye(n, None, 0, dtype)
}

// =============================================================================
// Ranges
// =============================================================================

/// Creates the 1-D `i64` array `[0, 1, .., count - 1]`.
#[must_use]
pub fn arange(count: usize) -> ArrayHandle {
    let data: Vec<i64> = (0..count as i64).collect();
    let bytes: &[u8] = bytemuck::cast_slice(&data);
    let layout = Layout::packed(&[count], Descr::native(DType::I64), Order::C);
    ArrayHandle::from_owned(Buffer::from_vec(bytes.to_vec()), layout)
}

/// Longest range [`arange_step`] will build.
pub const ARANGE_MAX_LEN: usize = 1 << 28;

/// Creates `start, start + step, ..` up to (excluding) `stop`, converted to `dtype`.
///
/// Fails when the range would hold more than [`ARANGE_MAX_LEN`] elements.
pub fn arange_step(start: f64, stop: f64, step: f64, dtype: DType) -> Result<ArrayHandle> {
    if step == 0.0 || !step.is_finite() {
        return Err(Error::invalid_operation("arange step must be non-zero"));
    }
    let span = ((stop - start) / step).ceil();
    if span.is_nan() || span > ARANGE_MAX_LEN as f64 {
        return Err(Error::invalid_operation(format!(
            "arange from {start} to {stop} by {step} exceeds {ARANGE_MAX_LEN} elements"
        )));
    }
    let count = span.max(0.0) as usize;
    let values: Vec<Value> = (0..count)
        .map(|i| Value::Float(start + i as f64 * step))
        .collect();
    ArrayHandle::from_values(&values, &[count], dtype)
}

// =============================================================================
// Functional Construction
// =============================================================================

/// Creates an array whose element at each multi-index is `f(index)`.
pub fn from_fn<F>(shape: &[usize], dtype: DType, mut f: F) -> Result<ArrayHandle>
where
    F: FnMut(&[usize]) -> Value,
{
    let values: Vec<Value> = (0..numel(shape))
        .map(|i| f(&unravel_index(i, shape)))
        .collect();
    ArrayHandle::from_values(&values, shape, dtype)
}

/// Creates a 1-D array from an iterator.
///
/// With `count`, exactly that many values are taken and a shorter iterator
/// is an error; without it the iterator is drained.
pub fn from_iter<I>(iter: I, dtype: DType, count: Option<usize>) -> Result<ArrayHandle>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let values: Vec<Value> = match count {
        Some(n) => iter.into_iter().take(n).map(Into::into).collect(),
        None => iter.into_iter().map(Into::into).collect(),
    };
    if let Some(n) = count {
        if values.len() < n {
            return Err(Error::shape_mismatch(&[n], &[values.len()]));
        }
    }
    let len = values.len();
    ArrayHandle::from_values(&values, &[len], dtype)
}

// =============================================================================
// Random Initialization
// =============================================================================

/// Creates an `f64` array of uniform samples in `[0, 1)` from `rng`.
pub fn rand_uniform<R: Rng + ?Sized>(rng: &mut R, shape: &[usize]) -> ArrayHandle {
    let data: Vec<f64> = (0..numel(shape)).map(|_| rng.gen::<f64>()).collect();
    let bytes: &[u8] = bytemuck::cast_slice(&data);
    let layout = Layout::packed(shape, Descr::native(DType::F64), Order::C);
    ArrayHandle::from_owned(Buffer::from_vec(bytes.to_vec()), layout)
}

/// Creates an `f64` array of standard normal samples from `rng`.
pub fn randn<R: Rng + ?Sized>(rng: &mut R, shape: &[usize]) -> ArrayHandle {
    let data: Vec<f64> = (0..numel(shape))
        .map(|_| StandardNormal.sample(rng))
        .collect();
    let bytes: &[u8] = bytemuck::cast_slice(&data);
    let layout = Layout::packed(shape, Descr::native(DType::F64), Order::C);
    ArrayHandle::from_owned(Buffer::from_vec(bytes.to_vec()), layout)
}

// =============================================================================
// Tests
// =============================================================================
