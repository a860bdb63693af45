//! ndview Array - Strided Views Over Shared Buffers
//!
//! This crate provides `ArrayHandle`, an N-dimensional array that is a
//! `Layout` (shape, byte strides, element descriptor, offset) over a shared
//! `Buffer`. Slicing, transposing and contiguous reshapes produce new
//! handles over the same buffer; advanced indexing, dtype conversion and
//! explicit copies produce handles over new buffers. Which one you get is
//! always observable through `shares_buffer`.
//!
//! # Key Features
//! - Zero-copy views with byte strides (negative strides included)
//! - View-or-copy construction with `CopyMode::{Always, IfNeeded, Never}`
//! - Basic and advanced indexing with all-or-nothing assignment
//! - Creation routines: zeros, ones, full, eye, arange, from_fn, random
//! - Memory reports and nested-list export
//!
//! # Example
//! ```rust
//! use ndview_array::{arange, s_range, IndexSpec};
//!
//! let x = arange(12).reshape(&[3, 4]).unwrap();
//! let block = x.index(&[s_range(0, 2, 1), IndexSpec::All]).unwrap();
//! assert!(block.shares_buffer(&x));
//!
//! let picked = x.index(&[IndexSpec::Take(vec![2, 0])]).unwrap();
//! assert!(!picked.shares_buffer(&x));
//! ```
//!
//! @version 0.1.0
//! @author ndview contributors

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Array-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::float_cmp)]

// =============================================================================
// Modules
// =============================================================================

pub mod array;
pub mod cast;
pub mod creation;
pub mod index;
pub mod layout;
pub mod report;

// =============================================================================
// Re-exports
// =============================================================================

pub use array::{ArrayHandle, ArrayKind, Flags};
pub use cast::{
    as_matrix, as_view, as_view_dtype, as_view_preserving_kind, construct, matrix,
    ConstructOptions, CopyMode, KindPolicy,
};
pub use creation::{
    arange, arange_step, empty, empty_like, eye, from_fn, from_iter, full, full_like, identity,
    ones, ones_like, rand_uniform, randn, zeros, zeros_like, ARANGE_MAX_LEN,
};
pub use index::{mask_where, s_from, s_range, s_step, s_to, Assign, IndexSpec};
pub use layout::{packed_extent, Layout, OffsetIter, Order, Shape, Strides};
pub use report::{MemoryReport, NestedList};

pub use ndview_core::{ByteOrder, DType, Descr, Element, Error, Result, Value};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::array::{ArrayHandle, ArrayKind};
    pub use crate::cast::{as_view, construct, ConstructOptions, CopyMode};
    pub use crate::creation::{arange, eye, full, ones, zeros};
    pub use crate::index::{s_from, s_range, s_step, s_to, Assign, IndexSpec};
    pub use crate::layout::Order;
    pub use ndview_core::prelude::*;
}
