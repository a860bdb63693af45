//! Format Detection
//!
//! Tells single-array files from bundles, by extension or by magic bytes.

use std::path::Path;

use crate::bundle::BUNDLE_MAGIC;
use crate::single::SINGLE_MAGIC;

// =============================================================================
// Format Enum
// =============================================================================

/// Supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One array (.ndv)
    Single,
    /// Named arrays (.ndz)
    Bundle,
}

impl Format {
    /// Get the file extension for this format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Single => "ndv",
            Format::Bundle => "ndz",
        }
    }

    /// Get a human-readable name for this format.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Format::Single => "ndview array",
            Format::Bundle => "ndview bundle",
        }
    }

    /// Magic bytes opening files of this format.
    #[must_use]
    pub fn magic(&self) -> [u8; 4] {
        match self {
            Format::Single => SINGLE_MAGIC,
            Format::Bundle => BUNDLE_MAGIC,
        }
    }

    /// Get all supported formats.
    #[must_use]
    pub fn all() -> &'static [Format] {
        &[Format::Single, Format::Bundle]
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Format Detection
// =============================================================================

/// Detect the format from a file path based on extension.
///
/// Unknown extensions are treated as single-array files.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Format {
    match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some("ndz") => Format::Bundle,
        _ => Format::Single,
    }
}

/// Detect format from file contents (magic bytes).
#[must_use]
pub fn detect_format_from_bytes(bytes: &[u8]) -> Option<Format> {
    let magic = bytes.get(..4)?;
    Format::all()
        .iter()
        .copied()
        .find(|format| format.magic() == magic)
}

// =============================================================================
// Tests
// =============================================================================
