//! Layout - Shape, Strides and Contiguity
//!
//! A `Layout` describes how to read a `Buffer` as an N-dimensional array:
//! the extent of each dimension, the signed byte stride of each dimension,
//! the element descriptor and the byte offset of element `[0, 0, ..]`.
//!
//! # Key Features
//! - Byte strides for packed row-major (C) and column-major (F) layouts
//! - Contiguity checks that ignore length-1 axes, as NumPy does
//! - Offset iteration in C order over any strided layout
//! - Reshape inference with a single `-1` dimension
//!
//! @version 0.1.0

use smallvec::SmallVec;

use ndview_core::dtype::Descr;
use ndview_core::error::{Error, Result};

// =============================================================================
// Type Aliases
// =============================================================================

/// Shape type - extent of each dimension.
/// Uses `SmallVec` for stack allocation of small shapes (up to 6 dimensions).
pub type Shape = SmallVec<[usize; 6]>;

/// Strides type - signed byte step for each dimension.
pub type Strides = SmallVec<[isize; 6]>;

/// Memory order for packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// Row-major: last index varies fastest.
    #[default]
    C,
    /// Column-major: first index varies fastest.
    F,
}

// =============================================================================
// Shape Utilities
// =============================================================================

/// Computes the total number of elements from a shape.
#[must_use]
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Byte span of a packed layout, counting empty axes as length 1.
///
/// Returns `None` when any packed stride would not fit in an `isize`.
#[must_use]
pub fn packed_extent(shape: &[usize], itemsize: usize) -> Option<usize> {
    shape
        .iter()
        .try_fold(itemsize, |acc, &dim| acc.checked_mul(dim.max(1)))
        .filter(|&span| isize::try_from(span).is_ok())
}

fn packed_strides<'a>(dims: impl Iterator<Item = &'a usize>, itemsize: usize) -> Strides {
    let mut strides = Strides::new();
    let mut stride = isize::try_from(itemsize).unwrap_or(isize::MAX);

    // Saturates; callers holding untrusted shapes check `packed_extent` first.
    for &dim in dims {
        strides.push(stride);
        let dim = isize::try_from(dim.max(1)).unwrap_or(isize::MAX);
        stride = stride.saturating_mul(dim);
    }

    strides
}

/// Computes packed row-major (C-order) byte strides for a shape.
#[must_use]
pub fn c_strides(shape: &[usize], itemsize: usize) -> Strides {
    let mut strides = packed_strides(shape.iter().rev(), itemsize);
    strides.reverse();
    strides
}

/// Computes packed column-major (F-order) byte strides for a shape.
#[must_use]
pub fn f_strides(shape: &[usize], itemsize: usize) -> Strides {
    packed_strides(shape.iter(), itemsize)
}

fn contiguous_along<'a>(
    dims: impl Iterator<Item = (&'a usize, &'a isize)>,
    shape: &[usize],
    itemsize: usize,
) -> bool {
    if shape.contains(&0) {
        return true;
    }

    let mut expected = itemsize as isize;
    for (&dim, &stride) in dims {
        if dim == 1 {
            continue;
        }
        if stride != expected {
            return false;
        }
        expected *= dim as isize;
    }
    true
}

/// Checks whether strides describe a packed row-major layout.
///
/// Axes of length 1 are ignored and arrays with no elements are always
/// contiguous.
#[must_use]
pub fn is_c_contiguous(shape: &[usize], strides: &[isize], itemsize: usize) -> bool {
    contiguous_along(
        shape.iter().zip(strides.iter()).rev(),
        shape,
        itemsize,
    )
}

/// Checks whether strides describe a packed column-major layout.
#[must_use]
pub fn is_f_contiguous(shape: &[usize], strides: &[isize], itemsize: usize) -> bool {
    contiguous_along(shape.iter().zip(strides.iter()), shape, itemsize)
}

/// Converts a linear C-order index to multi-dimensional indices.
#[must_use]
pub fn unravel_index(mut linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut indices = vec![0; shape.len()];

    for (i, &dim) in shape.iter().enumerate().rev() {
        if dim == 0 {
            continue;
        }
        indices[i] = linear % dim;
        linear /= dim;
    }

    indices
}

/// Normalizes an axis number, supporting negative values.
pub fn normalize_axis(axis: i64, ndim: usize) -> Result<usize> {
    let ndim_i64 = ndim as i64;
    let normalized = if axis < 0 { axis + ndim_i64 } else { axis };

    if normalized < 0 || normalized >= ndim_i64 {
        return Err(Error::InvalidDimension { index: axis, ndim });
    }

    Ok(normalized as usize)
}

/// Resolves a reshape target, validating that the element count matches.
///
/// One dimension may be `-1`, in which case it is inferred.
pub fn infer_shape(old_shape: &[usize], new_shape: &[isize]) -> Result<Shape> {
    let old_numel = numel(old_shape);
    let mut result = Shape::with_capacity(new_shape.len());
    let mut infer_idx = None;
    let mut known_numel = 1usize;

    for (i, &dim) in new_shape.iter().enumerate() {
        if dim == -1 {
            if infer_idx.is_some() {
                return Err(Error::invalid_operation("Can only have one -1 in reshape"));
            }
            infer_idx = Some(i);
            result.push(0);
        } else if dim < 0 {
            return Err(Error::invalid_operation(format!(
                "Invalid dimension {dim} in reshape"
            )));
        } else {
            known_numel *= dim as usize;
            result.push(dim as usize);
        }
    }

    if let Some(idx) = infer_idx {
        if known_numel == 0 || old_numel % known_numel != 0 {
            return Err(Error::shape_mismatch(old_shape, &result));
        }
        result[idx] = old_numel / known_numel;
    } else if known_numel != old_numel {
        return Err(Error::shape_mismatch(old_shape, &result));
    }

    Ok(result)
}

// =============================================================================
// Layout
// =============================================================================

/// Shape, byte strides, element descriptor and base offset of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub(crate) shape: Shape,
    pub(crate) strides: Strides,
    pub(crate) descr: Descr,
    pub(crate) offset: usize,
}

impl Layout {
    /// Creates a packed layout in the given order starting at byte 0.
    #[must_use]
    pub fn packed(shape: &[usize], descr: Descr, order: Order) -> Self {
        let strides = match order {
            Order::C => c_strides(shape, descr.itemsize()),
            Order::F => f_strides(shape, descr.itemsize()),
        };
        Self {
            shape: Shape::from_slice(shape),
            strides,
            descr,
            offset: 0,
        }
    }

    /// Creates a layout from raw parts.
    #[must_use]
    pub fn new(shape: Shape, strides: Strides, descr: Descr, offset: usize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape,
            strides,
            descr,
            offset,
        }
    }

    /// Extent of each dimension.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Byte stride of each dimension.
    #[must_use]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Element descriptor.
    #[must_use]
    pub fn descr(&self) -> Descr {
        self.descr
    }

    /// Byte offset of the first element.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    /// True if the layout is packed row-major.
    #[must_use]
    pub fn is_c_contiguous(&self) -> bool {
        is_c_contiguous(&self.shape, &self.strides, self.descr.itemsize())
    }

    /// True if the layout is packed column-major.
    #[must_use]
    pub fn is_f_contiguous(&self) -> bool {
        is_f_contiguous(&self.shape, &self.strides, self.descr.itemsize())
    }

    /// True if the layout is packed in `order`.
    #[must_use]
    pub fn is_contiguous(&self, order: Order) -> bool {
        match order {
            Order::C => self.is_c_contiguous(),
            Order::F => self.is_f_contiguous(),
        }
    }

    /// Byte address of an in-bounds multi-index.
    #[must_use]
    pub fn byte_offset(&self, indices: &[usize]) -> usize {
        debug_assert_eq!(indices.len(), self.strides.len());

        let mut offset = self.offset as isize;
        for (&idx, &stride) in indices.iter().zip(self.strides.iter()) {
            offset += idx as isize * stride;
        }
        offset as usize
    }

    /// Half-open byte range touched by this layout, or `None` if it has no elements.
    #[must_use]
    pub fn extent(&self) -> Option<(isize, isize)> {
        if self.numel() == 0 {
            return None;
        }

        let mut low = self.offset as isize;
        let mut high = self.offset as isize;
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            let span = (dim as isize - 1) * stride;
            if span < 0 {
                low += span;
            } else {
                high += span;
            }
        }
        Some((low, high + self.descr.itemsize() as isize))
    }

    /// Checks that every addressable element lies within `buffer_len` bytes.
    #[must_use]
    pub fn fits(&self, buffer_len: usize) -> bool {
        match self.extent() {
            None => true,
            Some((low, high)) => low >= 0 && high <= buffer_len as isize,
        }
    }

    /// Iterates element byte addresses in C order.
    #[must_use]
    pub fn offsets(&self) -> OffsetIter {
        OffsetIter::new(&self.shape, &self.strides, self.offset as isize)
    }

    /// Iterates element byte addresses in the given order.
    #[must_use]
    pub fn offsets_in(&self, order: Order) -> OffsetIter {
        match order {
            Order::C => self.offsets(),
            Order::F => {
                let shape: Shape = self.shape.iter().rev().copied().collect();
                let strides: Strides = self.strides.iter().rev().copied().collect();
                OffsetIter::new(&shape, &strides, self.offset as isize)
            }
        }
    }

    /// Same layout read as a different element descriptor.
    #[must_use]
    pub fn with_descr(&self, descr: Descr) -> Self {
        Self {
            descr,
            ..self.clone()
        }
    }
}

// =============================================================================
// Offset Iteration
// =============================================================================

/// Iterator over byte addresses of a strided layout in C order.
#[derive(Debug, Clone)]
pub struct OffsetIter {
    shape: Shape,
    strides: Strides,
    index: Shape,
    current: isize,
    remaining: usize,
}

impl OffsetIter {
    /// Starts iteration at `base` for the given shape and strides.
    #[must_use]
    pub fn new(shape: &[usize], strides: &[isize], base: isize) -> Self {
        Self {
            shape: Shape::from_slice(shape),
            strides: Strides::from_slice(strides),
            index: smallvec::smallvec![0; shape.len()],
            current: base,
            remaining: numel(shape),
        }
    }

    /// Relative byte offsets of every element, for gather planning.
    #[must_use]
    pub fn relative(shape: &[usize], strides: &[isize]) -> Vec<isize> {
        Self::new(shape, strides, 0).map(|o| o as isize).collect()
    }

    fn advance(&mut self) {
        for d in (0..self.shape.len()).rev() {
            self.index[d] += 1;
            self.current += self.strides[d];
            if self.index[d] < self.shape[d] {
                return;
            }
            self.current -= self.strides[d] * self.shape[d] as isize;
            self.index[d] = 0;
        }
    }
}

impl Iterator for OffsetIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let out = self.current;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(out as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for OffsetIter {}

// =============================================================================
// Tests
// =============================================================================
