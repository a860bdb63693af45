//! Error Types - ndview Error Handling
//!
//! Every failure the array engine can report is a local, synchronous
//! contract violation raised by the operation that detects it. Nothing
//! here is retried and nothing is silently coerced.
//!
//! # Key Features
//! - One error enum shared by every ndview crate
//! - Variants for casting, shape, indexing, format and buffer access
//! - Integration with `std::error::Error` through `thiserror`
//!
//! @version 0.1.0
//! @author ndview contributors

use thiserror::Error;

use crate::dtype::DType;

// =============================================================================
// Error Types
// =============================================================================

/// The main error type for ndview operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A forced view was requested across element types that cannot alias.
    #[error("Cannot view {from} data as {to} without copying")]
    CastIncompatible {
        /// Element type of the source.
        from: DType,
        /// Requested element type.
        to: DType,
    },

    /// Element counts or shapes disagree (reshape, fill, assignment).
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape.
        actual: Vec<usize>,
    },

    /// Malformed index expression.
    #[error("Invalid index expression: {message}")]
    IndexShape {
        /// What was wrong with the expression.
        message: String,
    },

    /// Index out of bounds after negative wrapping.
    #[error("Index {index} is out of bounds for axis of size {size}")]
    IndexRange {
        /// The index as supplied by the caller.
        index: isize,
        /// The size of the indexed axis.
        size: usize,
    },

    /// Axis number out of range.
    #[error("Invalid dimension: index {index} for array with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid axis.
        index: i64,
        /// Number of dimensions in the array.
        ndim: usize,
    },

    /// Element type of an array did not match what the caller asked for.
    #[error("DType mismatch: expected {expected}, got {actual}")]
    DTypeMismatch {
        /// The expected data type.
        expected: DType,
        /// The actual data type.
        actual: DType,
    },

    /// Corrupt or unsupported serialized data.
    #[error("Format error: {message}")]
    Format {
        /// Description of the problem.
        message: String,
    },

    /// Two bundle entries share a name.
    #[error("Duplicate entry name: {name}")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// Write attempted through a read-only buffer.
    #[error("Buffer is read-only")]
    ReadOnlyBuffer,

    /// Operation not valid for the given arguments.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// Filesystem failure in one of the file helpers.
    #[error("I/O error: {message}")]
    Io {
        /// The underlying I/O error message.
        message: String,
    },
}

// =============================================================================
// Result Type
// =============================================================================

/// A specialized Result type for ndview operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Helper Functions
// =============================================================================

impl Error {
    /// Creates a new shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Creates a new malformed-index error.
    #[must_use]
    pub fn index_shape(message: impl Into<String>) -> Self {
        Self::IndexShape {
            message: message.into(),
        }
    }

    /// Creates a new format error.
    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Creates a new invalid operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
