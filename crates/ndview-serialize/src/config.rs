//! Serialization Configuration
//!
//! Limits applied while decoding untrusted input and the default
//! compression choice for bundles. Loadable from TOML:
//!
//! ```toml
//! compress = true
//! max_ndim = 16
//! max_payload_bytes = 268435456
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use ndview_core::error::{Error, Result};

// =============================================================================
// Configuration
// =============================================================================

/// Encoder defaults and decoder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializeConfig {
    /// Compress bundle entries by default.
    #[serde(default)]
    pub compress: bool,

    /// Largest dimension count accepted by the decoder.
    #[serde(default = "default_max_ndim")]
    pub max_ndim: u8,

    /// Largest element region or bundle payload accepted by the decoder.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
}

fn default_max_ndim() -> u8 {
    32
}

fn default_max_payload_bytes() -> u64 {
    1 << 30
}

impl Default for SerializeConfig {
    fn default() -> Self {
        Self {
            compress: false,
            max_ndim: default_max_ndim(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl SerializeConfig {
    /// Parses configuration from TOML text; missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::format(format!("invalid config: {e}")))
    }

    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::format(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
