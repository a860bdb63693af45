//! # ndview - Array Memory Model With View Tracking
//!
//! ndview separates array *storage* from array *interpretation*. A
//! `Buffer` is reference-counted bytes; an `ArrayHandle` is a `Layout`
//! (shape, byte strides, element descriptor, offset) over one. Many
//! handles may share a buffer, and a write through any of them is seen by
//! all of them. Every operation documents whether it returns a view or a
//! copy, and `shares_buffer` makes the answer observable.
//!
//! ## Core Features
//!
//! - **Views**: slicing, transpose, permute and contiguous reshape never copy
//! - **Copies**: `duplicate`, `astype`, advanced indexing and `ascontiguous`
//!   into a different order always allocate
//! - **Casting**: `construct` with `CopyMode::{Always, IfNeeded, Never}` and a
//!   matrix variant tag that survives the zero-copy path
//! - **Indexing**: integers, slices, new axes, ellipsis, boolean masks and
//!   integer lists, with scatter assignment into the source
//! - **Serialization**: a single-array binary format and a bundle of named
//!   arrays with optional LZ4 compression
//!
//! # Quick Start
//!
//! ```rust
//! use ndview::prelude::*;
//!
//! let x = arange(12).reshape(&[3, 4]).unwrap();
//!
//! // Basic indexing views the same buffer.
//! let row = x.index(&[IndexSpec::Index(1), IndexSpec::All]).unwrap();
//! row.fill(0).unwrap();
//! assert_eq!(x.get(&[1, 2]).unwrap(), Value::Int(0));
//!
//! // Advanced indexing copies.
//! let picked = x.index(&[IndexSpec::Take(vec![2, 0])]).unwrap();
//! assert!(!picked.shares_buffer(&x));
//!
//! // Round-trip through the binary format.
//! let back = ndview::serialize::decode_single(&ndview::serialize::encode_single(&x)).unwrap();
//! assert_eq!(back, x);
//! ```
//!
//! # Concurrency
//!
//! Handles are `Send + Sync` and each element access takes the buffer's
//! lock, but sequences of accesses are not atomic. Serialize concurrent
//! writers to the same buffer yourself.
//!
//! @version 0.1.0
//! @author ndview contributors

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// =============================================================================
// Core Re-exports
// =============================================================================

pub use ndview_core::{Buffer, ByteOrder, DType, Descr, Element, Error, Kind, Result, Value};

// =============================================================================
// Array Re-exports
// =============================================================================

pub use ndview_array as array;
pub use ndview_array::{
    arange, arange_step, as_matrix, as_view, as_view_dtype, as_view_preserving_kind, construct,
    empty, empty_like, eye, from_fn, from_iter, full, full_like, identity, mask_where, matrix, ones,
    ones_like, rand_uniform, randn, s_from, s_range, s_step, s_to, zeros, zeros_like,
    ArrayHandle, ArrayKind, Assign, ConstructOptions, CopyMode, Flags, IndexSpec, KindPolicy,
    Layout, MemoryReport, NestedList, Order,
};

// =============================================================================
// Serialization Re-exports
// =============================================================================

pub use ndview_serialize as serialize;
pub use ndview_serialize::{
    decode_bundle, decode_single, encode_bundle, encode_single, load, load_bundle, save,
    save_bundle, Bundle, BundleWriter, SerializeConfig,
};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for ndview.
///
/// ```rust
/// use ndview::prelude::*;
/// ```
pub mod prelude {
    pub use ndview_array::prelude::*;
    pub use ndview_array::{
        as_matrix, as_view_dtype, as_view_preserving_kind, empty, from_fn, from_iter, identity,
        mask_where, matrix, Flags, KindPolicy, MemoryReport, NestedList,
    };
    pub use ndview_serialize::{
        decode_bundle, decode_single, encode_bundle, encode_single, Bundle, BundleWriter,
    };
}
