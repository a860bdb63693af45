//! Casting - View-or-Copy Construction From Existing Arrays
//!
//! Decides whether constructing an array from another one can alias the
//! source buffer or must allocate and convert. Requesting the source's own
//! dtype never copies unless a copy is forced; a dtype change always
//! copies, except under [`CopyMode::Never`] where only a same-width
//! reinterpretation is possible.
//!
//! # Key Features
//! - `construct` with a three-way copy request and variant policy
//! - `as_view` / `as_view_preserving_kind` fast paths
//! - `astype` (converting copy) and `view_as` (same-width reinterpretation)
//! - Matrix variant helpers `as_matrix` and `matrix`

use ndview_core::buffer::Buffer;
use ndview_core::dtype::{DType, Descr};
use ndview_core::error::{Error, Result};

use crate::array::{ArrayHandle, ArrayKind};
use crate::layout::{Layout, Order, Shape, Strides};

// =============================================================================
// Options
// =============================================================================

/// How `construct` may satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyMode {
    /// Always allocate a new buffer.
    #[default]
    Always,
    /// Alias the source when possible, copy otherwise.
    IfNeeded,
    /// Alias the source or fail.
    Never,
}

/// What happens to the source's variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindPolicy {
    /// The result is always a plain array.
    #[default]
    Plain,
    /// Keep the variant on the zero-copy path, plain on copies.
    PreserveOnView,
    /// Keep the variant on both paths.
    Preserve,
}

/// Options for [`construct`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConstructOptions {
    /// Requested element type (`None` keeps the source's).
    pub dtype: Option<DType>,
    /// Copy request.
    pub copy: CopyMode,
    /// Variant policy.
    pub kind: KindPolicy,
}

impl ConstructOptions {
    /// Options with the given copy mode and everything else defaulted.
    #[must_use]
    pub fn with_copy(copy: CopyMode) -> Self {
        Self {
            copy,
            ..Self::default()
        }
    }

    /// Sets the requested dtype.
    #[must_use]
    pub fn dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Sets the variant policy.
    #[must_use]
    pub fn kind(mut self, kind: KindPolicy) -> Self {
        self.kind = kind;
        self
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Builds an array from `source` according to `options`.
///
/// - `Always`: new buffer; elements converted if the dtype changes.
/// - `IfNeeded`: alias when the dtype is unchanged, else converting copy.
/// - `Never`: alias when the dtype is unchanged, reinterpret when the new
///   dtype has the same width, else [`Error::CastIncompatible`].
pub fn construct(source: &ArrayHandle, options: ConstructOptions) -> Result<ArrayHandle> {
    let target = options.dtype.unwrap_or_else(|| source.dtype());
    let same = target == source.dtype();

    let view_kind = match options.kind {
        KindPolicy::Plain => ArrayKind::Plain,
        KindPolicy::PreserveOnView | KindPolicy::Preserve => source.kind(),
    };
    let copy_kind = match options.kind {
        KindPolicy::Preserve => source.kind(),
        KindPolicy::Plain | KindPolicy::PreserveOnView => ArrayKind::Plain,
    };

    let mut result = match (options.copy, same) {
        (CopyMode::IfNeeded | CopyMode::Never, true) => {
            let mut view = source.view();
            view.kind = view_kind;
            return Ok(view);
        }
        (CopyMode::Never, false) => {
            let mut view = source.view_as(target)?;
            view.kind = view_kind;
            return Ok(view);
        }
        (CopyMode::Always, true) => source.duplicate(),
        (CopyMode::Always | CopyMode::IfNeeded, false) => source.astype(target)?,
    };
    result.kind = copy_kind;
    Ok(result)
}

/// Returns a handle aliasing `source` as a plain array. Never copies.
///
/// Identity of the returned handle is not part of the contract; only the
/// shared buffer is.
#[must_use]
pub fn as_view(source: &ArrayHandle) -> ArrayHandle {
    let mut view = source.view();
    view.kind = ArrayKind::Plain;
    view
}

/// Like [`as_view`] but with a requested dtype; copies if it differs.
pub fn as_view_dtype(source: &ArrayHandle, dtype: DType) -> Result<ArrayHandle> {
    construct(
        source,
        ConstructOptions::with_copy(CopyMode::IfNeeded).dtype(dtype),
    )
}

/// Like [`as_view`] but keeps the source's variant tag.
#[must_use]
pub fn as_view_preserving_kind(source: &ArrayHandle) -> ArrayHandle {
    source.view()
}

// =============================================================================
// Matrix Variant
// =============================================================================

fn matrix_layout(source: &ArrayHandle) -> Result<Layout> {
    let descr = source.descr();
    let offset = source.layout().offset();
    match source.ndim() {
        0 => Ok(Layout::new(
            smallvec::smallvec![1, 1],
            smallvec::smallvec![0, 0],
            descr,
            offset,
        )),
        1 => {
            let shape: Shape = smallvec::smallvec![1, source.shape()[0]];
            let strides: Strides = smallvec::smallvec![0, source.strides()[0]];
            Ok(Layout::new(shape, strides, descr, offset))
        }
        2 => Ok(source.layout().clone()),
        n => Err(Error::invalid_operation(format!(
            "matrix must be 2-dimensional, got {n} dimensions"
        ))),
    }
}

/// Interprets `source` as a matrix without copying.
///
/// 0-d arrays become 1x1 and 1-d arrays become a single row.
pub fn as_matrix(source: &ArrayHandle) -> Result<ArrayHandle> {
    let layout = matrix_layout(source)?;
    let mut view = source.view_with(layout);
    view.kind = ArrayKind::Matrix;
    Ok(view)
}

/// Creates a matrix holding a copy of `source`.
pub fn matrix(source: &ArrayHandle) -> Result<ArrayHandle> {
    let mut copy = as_matrix(source)?.duplicate();
    copy.kind = ArrayKind::Matrix;
    Ok(copy)
}

// =============================================================================
// Dtype Conversion
// =============================================================================

impl ArrayHandle {
    /// Copies into a new C-ordered buffer, converting every element to `dtype`.
    pub fn astype(&self, dtype: DType) -> Result<Self> {
        if dtype == self.dtype() {
            return Ok(self.duplicate());
        }

        tracing::debug!(from = %self.dtype(), to = %dtype, elements = self.size(), "converting copy");
        let target = Descr::native(dtype);
        let itemsize = target.itemsize();
        let mut data = vec![0u8; self.size() * itemsize];
        for (value, chunk) in self
            .to_values()
            .iter()
            .zip(data.chunks_exact_mut(itemsize.max(1)))
        {
            target.write(value, chunk)?;
        }

        let layout = Layout::packed(self.shape(), target, Order::C);
        Ok(Self::from_owned(Buffer::from_vec(data), layout))
    }

    /// Reinterprets the same bytes as another dtype of identical width.
    ///
    /// Fails with [`Error::CastIncompatible`] when the widths differ.
    pub fn view_as(&self, dtype: DType) -> Result<Self> {
        if dtype.size_of() != self.itemsize() {
            return Err(Error::CastIncompatible {
                from: self.dtype(),
                to: dtype,
            });
        }
        let descr = Descr::new(dtype, self.byte_order());
        Ok(self.view_with(self.layout().with_descr(descr)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndview_core::Value;

    fn sample() -> ArrayHandle {
        ArrayHandle::from_vec(vec![1i64, 2, 3], &[3]).unwrap()
    }

    #[test]
    fn test_default_construct_copies() {
        let arr = sample();
        let arr2 = construct(&arr, ConstructOptions::default()).unwrap();
        assert!(!arr2.shares_buffer(&arr));
        assert_eq!(arr2, arr);
    }

    #[test]
    fn test_if_needed_aliases_same_dtype() {
        let arr = sample();
        let arr3 = construct(&arr, ConstructOptions::with_copy(CopyMode::IfNeeded)).unwrap();
        assert!(arr3.shares_buffer(&arr));
        assert!(!arr3.owns_buffer());
    }

    #[test]
    fn test_dtype_change_forces_copy() {
        let arr = sample();
        let arr4 = construct(
            &arr,
            ConstructOptions::with_copy(CopyMode::IfNeeded).dtype(DType::F32),
        )
        .unwrap();
        assert!(!arr4.shares_buffer(&arr));
        assert_eq!(arr4.dtype(), DType::F32);
        assert_eq!(arr4.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_never_rejects_width_change() {
        let arr = sample();
        let err = construct(
            &arr,
            ConstructOptions::with_copy(CopyMode::Never).dtype(DType::F32),
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::CastIncompatible {
                from: DType::I64,
                to: DType::F32
            }
        );
    }

    #[test]
    fn test_never_reinterprets_same_width() {
        let arr = ArrayHandle::from_vec(vec![1.0f32], &[1]).unwrap();
        let bits = construct(
            &arr,
            ConstructOptions::with_copy(CopyMode::Never).dtype(DType::U32),
        )
        .unwrap();
        assert!(bits.shares_buffer(&arr));
        assert_eq!(bits.get(&[0]).unwrap(), Value::UInt(0x3f80_0000));
    }

    #[test]
    fn test_astype_rejects_bytes_to_number() {
        let names = ArrayHandle::from_values(&[Value::from("ali")], &[1], DType::Bytes(3)).unwrap();
        assert!(matches!(
            names.astype(DType::I32),
            Err(Error::CastIncompatible { .. })
        ));
    }

    #[test]
    fn test_matrix_view_shares_and_writes_through() {
        let base = sample();
        let mat = as_matrix(&base).unwrap();
        assert_eq!(mat.kind(), ArrayKind::Matrix);
        assert_eq!(mat.shape(), &[1, 3]);

        let arr = construct(&mat, ConstructOptions::with_copy(CopyMode::IfNeeded)).unwrap();
        assert_eq!(arr.kind(), ArrayKind::Plain);
        assert!(arr.shares_buffer(&mat));

        arr.set(&[0, 2], 10).unwrap();
        assert_eq!(mat.get(&[0, 2]).unwrap(), Value::Int(10));
        assert_eq!(base.get(&[2]).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_kind_policies() {
        let mat = matrix(&sample()).unwrap();
        assert!(mat.owns_buffer());
        assert_eq!(mat.kind(), ArrayKind::Matrix);

        assert_eq!(as_view(&mat).kind(), ArrayKind::Plain);
        assert_eq!(as_view_preserving_kind(&mat).kind(), ArrayKind::Matrix);

        let keep_view = construct(
            &mat,
            ConstructOptions::with_copy(CopyMode::IfNeeded).kind(KindPolicy::PreserveOnView),
        )
        .unwrap();
        assert_eq!(keep_view.kind(), ArrayKind::Matrix);

        let plain_copy = construct(
            &mat,
            ConstructOptions::with_copy(CopyMode::Always).kind(KindPolicy::PreserveOnView),
        )
        .unwrap();
        assert_eq!(plain_copy.kind(), ArrayKind::Plain);

        let kept_copy = construct(
            &mat,
            ConstructOptions::with_copy(CopyMode::Always).kind(KindPolicy::Preserve),
        )
        .unwrap();
        assert_eq!(kept_copy.kind(), ArrayKind::Matrix);
    }

    #[test]
    fn test_matrix_rejects_3d() {
        let cube = ArrayHandle::from_vec(vec![0u8; 8], &[2, 2, 2]).unwrap();
        assert!(as_matrix(&cube).is_err());
    }

    #[test]
    fn test_matrix_transpose_keeps_kind() {
        let mat = as_matrix(&sample()).unwrap();
        let t = mat.transpose();
        assert_eq!(t.kind(), ArrayKind::Matrix);
        assert_eq!(t.shape(), &[3, 1]);
    }
}
