//! ndview Serialize - Binary Formats for ndview Arrays
//!
//! This crate persists `ArrayHandle`s in two self-describing binary
//! containers: a single-array format and a bundle of named arrays with
//! optional per-entry LZ4 compression.
//!
//! # Supported Formats
//!
//! - **Single array** (.ndv) - header, shape, then packed C-order elements
//! - **Bundle** (.ndz) - named single-array payloads, lazily decoded
//!
//! # Example
//!
//! ```rust
//! use ndview_array::arange;
//! use ndview_serialize::{decode_single, encode_single};
//!
//! let a = arange(6).reshape(&[2, 3]).unwrap();
//! let b = decode_single(&encode_single(&a.transpose())).unwrap();
//! assert_eq!(b.shape(), &[3, 2]);
//! assert!(b.is_c_contiguous());
//! ```
//!
//! @version 0.1.0
//! @author ndview contributors

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::trivially_copy_pass_by_ref)]

// =============================================================================
// Modules
// =============================================================================

mod bundle;
mod config;
mod format;
mod single;

// =============================================================================
// Re-exports
// =============================================================================

pub use bundle::{
    decode_bundle, decode_bundle_with, encode_bundle, Bundle, BundleWriter, BUNDLE_MAGIC,
    BUNDLE_VERSION,
};
pub use config::SerializeConfig;
pub use format::{detect_format, detect_format_from_bytes, Format};
pub use single::{decode_single, decode_single_with, encode_single, SINGLE_MAGIC, SINGLE_VERSION};

// =============================================================================
// Imports
// =============================================================================

use std::path::Path;

use ndview_array::ArrayHandle;
use ndview_core::{Error, Result};

// =============================================================================
// File Helpers
// =============================================================================

/// Writes one array to `path` in the single-array format.
pub fn save<P: AsRef<Path>>(path: P, array: &ArrayHandle) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, encode_single(array))?;
    tracing::debug!(path = %path.display(), "saved array");
    Ok(())
}

/// Reads one array from `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ArrayHandle> {
    load_with(path, &SerializeConfig::default())
}

/// Reads one array from `path`, enforcing `config`'s limits.
pub fn load_with<P: AsRef<Path>>(path: P, config: &SerializeConfig) -> Result<ArrayHandle> {
    let bytes = std::fs::read(path.as_ref())?;
    if detect_format_from_bytes(&bytes) == Some(Format::Bundle) {
        return Err(Error::format(
            "file holds a bundle; use load_bundle to read it",
        ));
    }
    decode_single_with(&bytes, config)
}

/// Writes named arrays to `path` as a bundle.
pub fn save_bundle<P: AsRef<Path>>(
    path: P,
    entries: &[(&str, &ArrayHandle)],
    compress: bool,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_bundle(entries, compress)?;
    std::fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), entries = entries.len(), "saved bundle");
    Ok(())
}

/// Reads a bundle's entry table from `path`; entries decode on access.
pub fn load_bundle<P: AsRef<Path>>(path: P) -> Result<Bundle> {
    load_bundle_with(path, &SerializeConfig::default())
}

/// Reads a bundle from `path`, enforcing `config`'s limits.
pub fn load_bundle_with<P: AsRef<Path>>(path: P, config: &SerializeConfig) -> Result<Bundle> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_bundle_with(&bytes, config)
}

// =============================================================================
// Tests
// =============================================================================
