//! ndview Core - Buffers, Element Types and Errors
//!
//! This crate provides the foundation of the ndview array memory model:
//! reference-counted byte buffers that many array views can share, the
//! closed set of element types those buffers are read as, and the error
//! taxonomy used by every other ndview crate.
//!
//! # Key Features
//! - `Buffer`: fixed-size, reference-counted bytes with read-only support
//! - `DType` / `Descr`: runtime element types with explicit byte order
//! - `Value`: dynamically typed element exchange
//! - `Error`: one error enum for casting, shape, index and format failures
//!
//! # Example
//! ```rust
//! use ndview_core::{Buffer, DType, Descr, Value};
//!
//! let descr = Descr::native(DType::I32);
//! let buffer = Buffer::zeroed(4 * descr.itemsize());
//! descr.write(&Value::Int(5), &mut buffer.write().unwrap()[4..8]).unwrap();
//! assert_eq!(descr.read(&buffer.read()[4..8]), Value::Int(5));
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
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::derivable_impls)]

// =============================================================================
// Modules
// =============================================================================

pub mod buffer;
pub mod dtype;
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use buffer::{Buffer, BufferReadGuard, BufferWriteGuard};
pub use dtype::{Bool8, ByteOrder, DType, Descr, Element, Kind, Value};
pub use error::{Error, Result};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::buffer::Buffer;
    pub use crate::dtype::{ByteOrder, DType, Descr, Element, Value};
    pub use crate::error::{Error, Result};
}
