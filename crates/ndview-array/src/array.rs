//! ArrayHandle - Core N-Dimensional Array Type
//!
//! An `ArrayHandle` is a `Layout` plus a reference to a `Buffer`. Handles
//! that share a buffer are views of one another: a write through any of
//! them is visible through all of them. A handle either owns the buffer it
//! created or views a buffer created by someone else; the buffer itself is
//! released when its last handle is dropped.
//!
//! # Key Features
//! - Runtime element type with dynamic (`Value`) and typed (`Element`) access
//! - Zero-copy transpose, permute and contiguous reshape
//! - Explicit copies (`duplicate`, `ascontiguous`, `copy_order`)
//! - Read-only handles over externally owned bytes
//!
//! @version 0.1.0
//! @author ndview contributors

use core::fmt;

use bytes::Bytes;

use ndview_core::buffer::Buffer;
use ndview_core::dtype::{ByteOrder, DType, Descr, Element, Value};
use ndview_core::error::{Error, Result};

use crate::layout::{
    infer_shape, normalize_axis, numel, packed_extent, Layout, Order, Shape, Strides,
};

// =============================================================================
// Variant Tag
// =============================================================================

/// Concrete variant of an array handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArrayKind {
    /// Plain N-dimensional array.
    #[default]
    Plain,
    /// Two-dimensional matrix variant layered on the plain array.
    Matrix,
}

/// Contiguity and ownership flags of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    /// Packed row-major.
    pub c_contiguous: bool,
    /// Packed column-major.
    pub f_contiguous: bool,
    /// This handle created and owns its buffer.
    pub owns_data: bool,
    /// Writes through this handle are allowed.
    pub writeable: bool,
}

// =============================================================================
// ArrayHandle Struct
// =============================================================================

/// An N-dimensional view over a shared byte buffer.
///
/// Handles are not `Clone`: use [`ArrayHandle::view`] to create another
/// handle over the same buffer, or [`ArrayHandle::duplicate`] for an
/// independent copy.
pub struct ArrayHandle {
    /// Shared storage.
    pub(crate) buffer: Buffer,
    /// How to read the storage.
    pub(crate) layout: Layout,
    /// True if this handle allocated `buffer`.
    pub(crate) owns: bool,
    /// Variant tag carried alongside the layout.
    pub(crate) kind: ArrayKind,
}

impl ArrayHandle {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Wraps a freshly allocated buffer that this handle owns.
    pub(crate) fn from_owned(buffer: Buffer, layout: Layout) -> Self {
        debug_assert!(layout.fits(buffer.len()));
        Self {
            buffer,
            layout,
            owns: true,
            kind: ArrayKind::Plain,
        }
    }

    /// Creates a non-owning handle over this handle's buffer.
    ///
    /// The variant tag survives only when the new layout is two-dimensional.
    pub(crate) fn view_with(&self, layout: Layout) -> Self {
        debug_assert!(layout.fits(self.buffer.len()));
        let kind = if layout.ndim() == 2 {
            self.kind
        } else {
            ArrayKind::Plain
        };
        Self {
            buffer: self.buffer.clone(),
            layout,
            owns: false,
            kind,
        }
    }

    /// Creates an array from a fully materialized shape, descriptor and
    /// packed C-order bytes.
    pub fn from_parts(shape: &[usize], descr: Descr, data: Vec<u8>) -> Result<Self> {
        if packed_extent(shape, descr.itemsize()).is_none() {
            return Err(Error::invalid_operation(format!(
                "shape {shape:?} is too large to address"
            )));
        }
        let expected = numel(shape) * descr.itemsize();
        if data.len() != expected {
            return Err(Error::shape_mismatch(&[expected], &[data.len()]));
        }
        let layout = Layout::packed(shape, descr, Order::C);
        Ok(Self::from_owned(Buffer::from_vec(data), layout))
    }

    /// Creates an array from a vector of typed elements.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        Self::from_slice(&data, shape)
    }

    /// Creates an array by copying a slice of typed elements.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        if data.len() != numel(shape) {
            return Err(Error::shape_mismatch(shape, &[data.len()]));
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self::from_parts(shape, Descr::native(T::DTYPE), bytes.to_vec())
    }

    /// Creates an array from dynamic values, converting each to `dtype`.
    pub fn from_values(values: &[Value], shape: &[usize], dtype: DType) -> Result<Self> {
        if values.len() != numel(shape) {
            return Err(Error::shape_mismatch(shape, &[values.len()]));
        }
        let descr = Descr::native(dtype);
        let itemsize = descr.itemsize();
        let mut data = vec![0u8; values.len() * itemsize];
        for (value, chunk) in values.iter().zip(data.chunks_exact_mut(itemsize.max(1))) {
            descr.write(value, chunk)?;
        }
        Self::from_parts(shape, descr, data)
    }

    /// Creates a 0-dimensional array holding one value of its natural dtype.
    pub fn scalar(value: impl Into<Value>) -> Self {
        let value = value.into();
        let descr = Descr::native(value.natural_dtype());
        let data = match value {
            Value::Bool(b) => vec![u8::from(b)],
            Value::Int(i) => i.to_ne_bytes().to_vec(),
            Value::UInt(u) => u.to_ne_bytes().to_vec(),
            Value::Float(f) => f.to_ne_bytes().to_vec(),
            Value::Bytes(b) => b,
        };
        Self::from_owned(
            Buffer::from_vec(data),
            Layout::packed(&[], descr, Order::C),
        )
    }

    /// Wraps immutable external bytes as a 1-D read-only array without copying.
    ///
    /// `count` limits the number of elements read (all whole elements when
    /// `None`). The byte length must be a multiple of the item size.
    pub fn from_bytes_readonly(bytes: Bytes, descr: Descr, count: Option<usize>) -> Result<Self> {
        let itemsize = descr.itemsize();
        if itemsize == 0 || bytes.len() % itemsize != 0 {
            return Err(Error::shape_mismatch(&[itemsize], &[bytes.len()]));
        }
        let available = bytes.len() / itemsize;
        let len = match count {
            Some(n) if n > available => {
                return Err(Error::shape_mismatch(&[n], &[available]));
            }
            Some(n) => n,
            None => available,
        };
        Ok(Self {
            buffer: Buffer::from_bytes_readonly(bytes),
            layout: Layout::packed(&[len], descr, Order::C),
            owns: false,
            kind: ArrayKind::Plain,
        })
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the shape of the array.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Returns the byte strides of the array.
    #[must_use]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Returns the total number of elements.
    #[must_use]
    pub fn size(&self) -> usize {
        self.layout.numel()
    }

    /// Returns true if the array has zero elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns true if this is a 0-dimensional array.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.ndim() == 0
    }

    /// Returns the element type.
    #[must_use]
    pub fn dtype(&self) -> DType {
        self.layout.descr.dtype
    }

    /// Returns the element descriptor.
    #[must_use]
    pub fn descr(&self) -> Descr {
        self.layout.descr
    }

    /// Returns the byte order of stored elements.
    #[must_use]
    pub fn byte_order(&self) -> ByteOrder {
        self.layout.descr.order
    }

    /// Size of one element in bytes.
    #[must_use]
    pub fn itemsize(&self) -> usize {
        self.layout.descr.itemsize()
    }

    /// Bytes occupied by the elements of this view.
    #[must_use]
    pub fn nbytes(&self) -> usize {
        self.size() * self.itemsize()
    }

    /// Returns the layout.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind(&self) -> ArrayKind {
        self.kind
    }

    /// True if this handle created (and will release) its buffer.
    #[must_use]
    pub fn owns_buffer(&self) -> bool {
        self.owns
    }

    /// True if writes through this handle are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.buffer.is_read_only()
    }

    /// Returns true if the array is packed row-major.
    #[must_use]
    pub fn is_c_contiguous(&self) -> bool {
        self.layout.is_c_contiguous()
    }

    /// Returns true if the array is packed column-major.
    #[must_use]
    pub fn is_f_contiguous(&self) -> bool {
        self.layout.is_f_contiguous()
    }

    /// Returns contiguity and ownership flags.
    #[must_use]
    pub fn flags(&self) -> Flags {
        Flags {
            c_contiguous: self.is_c_contiguous(),
            f_contiguous: self.is_f_contiguous(),
            owns_data: self.owns,
            writeable: !self.is_read_only(),
        }
    }

    /// True if both handles reference the same buffer.
    #[must_use]
    pub fn shares_buffer(&self, other: &Self) -> bool {
        self.buffer.ptr_eq(&other.buffer)
    }

    /// Number of live handles referencing this handle's buffer.
    #[must_use]
    pub fn viewer_count(&self) -> usize {
        self.buffer.viewer_count()
    }

    // =========================================================================
    // Data Access
    // =========================================================================

    fn checked_offset(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.ndim() {
            return Err(Error::index_shape(format!(
                "expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }

        for (&idx, &dim) in indices.iter().zip(self.shape().iter()) {
            if idx >= dim {
                return Err(Error::IndexRange {
                    index: idx as isize,
                    size: dim,
                });
            }
        }

        Ok(self.layout.byte_offset(indices))
    }

    /// Returns the element at the given indices.
    pub fn get(&self, indices: &[usize]) -> Result<Value> {
        let offset = self.checked_offset(indices)?;
        let data = self.buffer.read();
        Ok(self.layout.descr.read(&data[offset..]))
    }

    /// Returns the element at the given indices converted to `T`.
    pub fn get_as<T: Element>(&self, indices: &[usize]) -> Result<T> {
        T::from_value(&self.get(indices)?)
    }

    /// Sets the element at the given indices, converting `value` to the dtype.
    pub fn set(&self, indices: &[usize], value: impl Into<Value>) -> Result<()> {
        let offset = self.checked_offset(indices)?;
        let descr = self.layout.descr;
        let mut element = vec![0u8; descr.itemsize()];
        descr.write(&value.into(), &mut element)?;

        let mut data = self.buffer.write()?;
        data[offset..offset + element.len()].copy_from_slice(&element);
        Ok(())
    }

    /// Returns the value of a single-element array.
    pub fn item(&self) -> Result<Value> {
        if self.size() != 1 {
            return Err(Error::invalid_operation(
                "item() only works on single-element arrays",
            ));
        }
        self.get(&vec![0; self.ndim()])
    }

    /// Returns every element in C order as dynamic values.
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        let descr = self.layout.descr;
        let data = self.buffer.read();
        self.layout
            .offsets()
            .map(|offset| descr.read(&data[offset..]))
            .collect()
    }

    /// Returns every element in C order as `T`, which must match the dtype exactly.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype() {
            return Err(Error::DTypeMismatch {
                expected: T::DTYPE,
                actual: self.dtype(),
            });
        }

        let mut bytes = self.pack(Order::C);
        let descr = self.layout.descr;
        if !descr.is_native() {
            for element in bytes.chunks_exact_mut(descr.itemsize()) {
                descr.swap_element(element);
            }
        }
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Returns the element bytes packed in `order`, in the stored byte order.
    #[must_use]
    pub fn pack(&self, order: Order) -> Vec<u8> {
        let itemsize = self.itemsize();
        let data = self.buffer.read();

        if self.layout.is_contiguous(order) {
            let start = self.layout.offset;
            return data[start..start + self.nbytes()].to_vec();
        }

        let mut out = Vec::with_capacity(self.nbytes());
        for offset in self.layout.offsets_in(order) {
            out.extend_from_slice(&data[offset..offset + itemsize]);
        }
        out
    }

    /// Writes `value` into every element visible through this handle.
    pub fn fill(&self, value: impl Into<Value>) -> Result<()> {
        let descr = self.layout.descr;
        let mut element = vec![0u8; descr.itemsize()];
        descr.write(&value.into(), &mut element)?;

        let mut data = self.buffer.write()?;
        for offset in self.layout.offsets() {
            data[offset..offset + element.len()].copy_from_slice(&element);
        }
        Ok(())
    }

    // =========================================================================
    // Views and Copies
    // =========================================================================

    /// Returns another handle over the same buffer and layout.
    #[must_use]
    pub fn view(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            layout: self.layout.clone(),
            owns: false,
            kind: self.kind,
        }
    }

    /// Copies the referenced elements verbatim into a new, owned, C-ordered buffer.
    ///
    /// The copy is a plain array and is never affected by later writes to
    /// `self` (nor the other way round).
    #[must_use]
    pub fn duplicate(&self) -> Self {
        self.copy_order(Order::C)
    }

    /// Copies the referenced elements into a new buffer packed in `order`.
    #[must_use]
    pub fn copy_order(&self, order: Order) -> Self {
        tracing::trace!(elements = self.size(), ?order, "copying array");
        let bytes = self.pack(order);
        let layout = Layout::packed(self.shape(), self.layout.descr, order);
        Self::from_owned(Buffer::from_vec(bytes), layout)
    }

    /// Returns `self` (as a view) if already packed in `order`, else a packed copy.
    #[must_use]
    pub fn ascontiguous(&self, order: Order) -> Self {
        if self.layout.is_contiguous(order) {
            return self.view();
        }
        let mut copy = self.copy_order(order);
        copy.kind = self.kind;
        copy
    }

    // =========================================================================
    // Shape Operations
    // =========================================================================

    /// Returns an array with the same elements and a new shape.
    ///
    /// One dimension may be `-1`. The result aliases `self` when `self` is
    /// C-contiguous (or holds at most one element); otherwise the elements
    /// are copied into a new buffer first. `self` is never modified.
    pub fn reshape(&self, new_shape: &[isize]) -> Result<Self> {
        let shape = infer_shape(self.shape(), new_shape)?;

        if self.is_c_contiguous() || self.size() <= 1 {
            let strides = crate::layout::c_strides(&shape, self.itemsize());
            let layout = Layout::new(shape, strides, self.layout.descr, self.layout.offset);
            return Ok(self.view_with(layout));
        }

        tracing::debug!(from = ?self.shape(), to = ?shape.as_slice(), "reshape requires a copy");
        let packed = self.pack(Order::C);
        let layout = Layout::packed(&shape, self.layout.descr, Order::C);
        let mut result = Self::from_owned(Buffer::from_vec(packed), layout);
        if result.ndim() == 2 {
            result.kind = self.kind;
        }
        Ok(result)
    }

    /// Returns a 1-D copy of the elements in C order.
    #[must_use]
    pub fn flatten(&self) -> Self {
        let packed = self.pack(Order::C);
        let layout = Layout::packed(&[self.size()], self.layout.descr, Order::C);
        Self::from_owned(Buffer::from_vec(packed), layout)
    }

    /// Returns a 1-D view of the elements if possible, else a copy.
    #[must_use]
    pub fn ravel(&self) -> Self {
        match self.reshape(&[-1]) {
            Ok(result) => result,
            Err(_) => self.flatten(),
        }
    }

    /// Returns a view with the order of dimensions reversed. Never copies.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let shape: Shape = self.shape().iter().rev().copied().collect();
        let strides: Strides = self.strides().iter().rev().copied().collect();
        let layout = Layout::new(shape, strides, self.layout.descr, self.layout.offset);
        self.view_with(layout)
    }

    /// Returns a view with dimensions reordered by `axes`.
    pub fn permute(&self, axes: &[usize]) -> Result<Self> {
        if axes.len() != self.ndim() {
            return Err(Error::invalid_operation(format!(
                "Expected {} axes, got {}",
                self.ndim(),
                axes.len()
            )));
        }

        let mut seen = vec![false; self.ndim()];
        for &axis in axes {
            if axis >= self.ndim() {
                return Err(Error::InvalidDimension {
                    index: axis as i64,
                    ndim: self.ndim(),
                });
            }
            if seen[axis] {
                return Err(Error::invalid_operation("Duplicate axis in permute"));
            }
            seen[axis] = true;
        }

        let shape: Shape = axes.iter().map(|&a| self.shape()[a]).collect();
        let strides: Strides = axes.iter().map(|&a| self.strides()[a]).collect();
        let layout = Layout::new(shape, strides, self.layout.descr, self.layout.offset);
        Ok(self.view_with(layout))
    }

    /// Returns a view with two axes exchanged.
    pub fn swap_axes(&self, axis0: i64, axis1: i64) -> Result<Self> {
        let a = normalize_axis(axis0, self.ndim())?;
        let b = normalize_axis(axis1, self.ndim())?;
        let mut axes: Vec<usize> = (0..self.ndim()).collect();
        axes.swap(a, b);
        self.permute(&axes)
    }

    /// Returns views of each sub-array along the first axis.
    pub fn rows(&self) -> Result<Vec<Self>> {
        if self.is_scalar() {
            return Err(Error::invalid_operation("cannot iterate a 0-d array"));
        }

        let shape = Shape::from_slice(&self.shape()[1..]);
        let strides = Strides::from_slice(&self.strides()[1..]);
        let step = self.strides()[0];
        Ok((0..self.shape()[0])
            .map(|i| {
                let offset = (self.layout.offset as isize + i as isize * step) as usize;
                self.view_with(Layout::new(
                    shape.clone(),
                    strides.clone(),
                    self.layout.descr,
                    offset,
                ))
            })
            .collect())
    }
}

impl fmt::Debug for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayHandle")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("dtype", &self.dtype())
            .field("kind", &self.kind)
            .field("owns", &self.owns)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ArrayHandle {
    /// Element-wise equality of shape, dtype and values.
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self.dtype() == other.dtype()
            && self.to_values() == other.to_values()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn arange_2x3() -> ArrayHandle {
        ArrayHandle::from_vec((0..6).collect::<Vec<i64>>(), &[2, 3]).unwrap()
    }

    #[test]
    fn test_from_vec_and_get() {
        let a = arange_2x3();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a.strides(), &[24, 8]);
        assert_eq!(a.dtype(), DType::I64);
        assert_eq!(a.get(&[1, 2]).unwrap(), Value::Int(5));
        assert!(a.owns_buffer());
        assert!(matches!(
            a.get(&[2, 0]),
            Err(Error::IndexRange { index: 2, size: 2 })
        ));
        assert!(matches!(a.get(&[0]), Err(Error::IndexShape { .. })));
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let err = ArrayHandle::from_vec(vec![1i32, 2, 3], &[2, 2]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_view_shares_writes() {
        let a = arange_2x3();
        let v = a.view();
        assert!(!v.owns_buffer());
        assert!(v.shares_buffer(&a));
        assert_eq!(a.viewer_count(), 2);

        v.set(&[0, 0], 42).unwrap();
        assert_eq!(a.get(&[0, 0]).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_duplicate_is_independent() {
        let x = ArrayHandle::from_vec(vec![1i64, 2, 3, 4], &[2, 2]).unwrap();
        let y = x.duplicate();
        assert!(!y.shares_buffer(&x));
        assert!(y.owns_buffer());

        x.set(&[1, 1], 1).unwrap();
        assert_eq!(y.to_vec::<i64>().unwrap(), vec![1, 2, 3, 4]);

        y.set(&[0, 0], 9).unwrap();
        assert_eq!(x.to_vec::<i64>().unwrap(), vec![1, 2, 3, 1]);
    }

    #[test]
    fn test_transpose_flags() {
        let x = arange_2x3();
        assert!(x.is_c_contiguous());
        assert!(!x.is_f_contiguous());

        let z = x.transpose();
        assert_eq!(z.shape(), &[3, 2]);
        assert!(!z.is_c_contiguous());
        assert!(z.is_f_contiguous());
        assert!(z.shares_buffer(&x));
        assert_eq!(z.to_vec::<i64>().unwrap(), vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_reshape_view_and_copy() {
        let a = ArrayHandle::from_vec((0..6).collect::<Vec<i64>>(), &[6]).unwrap();
        let r = a.reshape(&[2, 3]).unwrap();
        assert!(r.shares_buffer(&a));
        assert!(a.reshape(&[3, 2]).is_ok());
        assert!(matches!(
            a.reshape(&[4]),
            Err(Error::ShapeMismatch { .. })
        ));

        // Transposed input is not C-contiguous, so reshape copies.
        let t = r.transpose();
        let flat = t.reshape(&[-1]).unwrap();
        assert!(!flat.shares_buffer(&a));
        assert_eq!(flat.to_vec::<i64>().unwrap(), vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_ascontiguous() {
        let x = arange_2x3();
        let same = x.ascontiguous(Order::C);
        assert!(same.shares_buffer(&x));

        let f = x.ascontiguous(Order::F);
        assert!(!f.shares_buffer(&x));
        assert!(f.is_f_contiguous());
        assert_eq!(f.get(&[1, 0]).unwrap(), Value::Int(3));

        let t = x.transpose();
        assert!(t.ascontiguous(Order::F).shares_buffer(&x));
        let c = t.ascontiguous(Order::C);
        assert!(c.is_c_contiguous());
        assert!(!c.shares_buffer(&x));
    }

    #[test]
    fn test_permute_and_swap_axes() {
        let a = ArrayHandle::from_vec((0..24).collect::<Vec<i32>>(), &[2, 3, 4]).unwrap();
        let p = a.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), &[4, 2, 3]);
        assert_eq!(p.get(&[3, 1, 2]).unwrap(), a.get(&[1, 2, 3]).unwrap());

        let s = a.swap_axes(0, -1).unwrap();
        assert_eq!(s.shape(), &[4, 3, 2]);
        assert!(a.permute(&[0, 0, 1]).is_err());
    }

    #[test]
    fn test_fill_through_view() {
        let a = arange_2x3();
        let t = a.transpose();
        t.fill(7).unwrap();
        assert!(a.to_values().iter().all(|v| *v == Value::Int(7)));
    }

    #[test]
    fn test_read_only_bytes() {
        let a = ArrayHandle::from_bytes_readonly(
            Bytes::from_static(b"mohammad"),
            Descr::native(DType::Bytes(1)),
            None,
        )
        .unwrap();
        assert_eq!(a.shape(), &[8]);
        assert!(a.is_read_only());
        assert!(!a.owns_buffer());
        assert_eq!(a.get(&[0]).unwrap(), Value::Bytes(b"m".to_vec()));
        assert!(matches!(a.set(&[0], "x"), Err(Error::ReadOnlyBuffer)));
        assert!(matches!(a.fill("x"), Err(Error::ReadOnlyBuffer)));

        let copy = a.duplicate();
        copy.set(&[0], "x").unwrap();
        assert_eq!(a.get(&[0]).unwrap(), Value::Bytes(b"m".to_vec()));
    }

    #[test]
    fn test_read_only_count_and_alignment() {
        let raw = Bytes::from(vec![1u8, 0, 2, 0, 3, 0]);
        let a = ArrayHandle::from_bytes_readonly(
            raw.clone(),
            Descr::new(DType::U16, ByteOrder::Little),
            Some(2),
        )
        .unwrap();
        assert_eq!(a.to_values(), vec![Value::UInt(1), Value::UInt(2)]);

        let err = ArrayHandle::from_bytes_readonly(raw, Descr::native(DType::U32), None);
        assert!(err.is_err());
    }

    #[test]
    fn test_big_endian_to_vec() {
        let a = ArrayHandle::from_bytes_readonly(
            Bytes::from(vec![0u8, 0, 0, 1, 0, 0, 0, 2]),
            Descr::new(DType::I32, ByteOrder::Big),
            None,
        )
        .unwrap();
        assert_eq!(a.to_vec::<i32>().unwrap(), vec![1, 2]);
        assert!(matches!(
            a.to_vec::<i64>(),
            Err(Error::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_rows_are_views() {
        let a = ArrayHandle::from_vec(vec![1i64, 2, 3, 2], &[2, 2]).unwrap();
        let rows = a.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].to_vec::<i64>().unwrap(), vec![3, 2]);
        rows[0].set(&[1], 20).unwrap();
        assert_eq!(a.get(&[0, 1]).unwrap(), Value::Int(20));
    }

    #[test]
    fn test_scalar_and_item() {
        let s = ArrayHandle::scalar(2.5);
        assert!(s.is_scalar());
        assert_eq!(s.dtype(), DType::F64);
        assert_eq!(s.item().unwrap(), Value::Float(2.5));
        assert!(arange_2x3().item().is_err());
    }

    #[test]
    fn test_scalar_every_value_kind() {
        for value in [
            Value::Bool(true),
            Value::Int(-3),
            Value::UInt(u64::MAX),
            Value::Float(-0.5),
            Value::Bytes(b"abc".to_vec()),
        ] {
            let s = ArrayHandle::scalar(value.clone());
            assert_eq!(s.dtype(), value.natural_dtype());
            assert_eq!(s.nbytes(), s.itemsize());
            assert_eq!(s.item().unwrap(), value);
        }
    }

    #[test]
    fn test_from_parts_rejects_unaddressable_shape() {
        assert!(matches!(
            ArrayHandle::from_parts(&[0, 1 << 62], Descr::native(DType::I64), Vec::new()),
            Err(Error::InvalidOperation { .. })
        ));
        let empty = ArrayHandle::from_parts(&[0, 4], Descr::native(DType::I64), Vec::new()).unwrap();
        assert_eq!(empty.size(), 0);
    }
}
