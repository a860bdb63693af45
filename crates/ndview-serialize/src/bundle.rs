//! Bundle Archive Format
//!
//! A bundle stores several named arrays, each encoded independently with
//! the single-array format and optionally LZ4-compressed:
//!
//! ```text
//! magic "NDVZ" | version u16 | entry count u32
//! per entry: name length u16 | name (utf-8) | payload length u64
//!            | compressed flag u8 | payload
//! ```
//!
//! Decoding only walks the entry table; each payload is decoded when it
//! is first requested.

use std::collections::{BTreeMap, HashMap, HashSet};

use bytes::Bytes;

use ndview_array::ArrayHandle;
use ndview_core::error::{Error, Result};

use crate::config::SerializeConfig;
use crate::single::{decode_single_with, encode_single, Reader};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes opening a bundle.
pub const BUNDLE_MAGIC: [u8; 4] = *b"NDVZ";

/// Current bundle format version.
pub const BUNDLE_VERSION: u16 = 1;

// =============================================================================
// Writer
// =============================================================================

/// Incrementally builds a bundle.
///
/// # Example
/// ```rust
/// use ndview_array::arange;
/// use ndview_serialize::{decode_bundle, BundleWriter};
///
/// let mut writer = BundleWriter::new(true);
/// writer.add("x", &arange(4)).unwrap();
/// let bundle = decode_bundle(&writer.finish()).unwrap();
/// assert!(bundle.is_compressed("x").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct BundleWriter {
    compress: bool,
    names: HashSet<String>,
    entries: Vec<(String, bool, Vec<u8>)>,
}

impl BundleWriter {
    /// Creates an empty writer.
    pub fn new(compress: bool) -> Self {
        Self {
            compress,
            ..Self::default()
        }
    }

    /// Creates an empty writer using the configured compression default.
    pub fn with_config(config: &SerializeConfig) -> Self {
        Self::new(config.compress)
    }

    /// Encodes and appends an entry. Names must be unique.
    pub fn add(&mut self, name: &str, array: &ArrayHandle) -> Result<&mut Self> {
        if self.names.contains(name) {
            return Err(Error::DuplicateName {
                name: name.to_string(),
            });
        }
        if u16::try_from(name.len()).is_err() {
            return Err(Error::format(format!(
                "entry name of {} bytes is too long",
                name.len()
            )));
        }

        let encoded = encode_single(array);
        let payload = if self.compress {
            lz4_flex::compress_prepend_size(&encoded)
        } else {
            encoded
        };

        self.names.insert(name.to_string());
        self.entries
            .push((name.to_string(), self.compress, payload));
        Ok(self)
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the archive.
    pub fn finish(self) -> Vec<u8> {
        let body: usize = self
            .entries
            .iter()
            .map(|(name, _, payload)| 2 + name.len() + 8 + 1 + payload.len())
            .sum();

        let mut out = Vec::with_capacity(10 + body);
        out.extend_from_slice(&BUNDLE_MAGIC);
        out.extend_from_slice(&BUNDLE_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());

        for (name, compressed, payload) in &self.entries {
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
            out.push(u8::from(*compressed));
            out.extend_from_slice(payload);
        }

        tracing::debug!(
            entries = self.entries.len(),
            bytes = out.len(),
            compress = self.compress,
            "encoded bundle"
        );
        out
    }
}

/// Encodes named arrays into a bundle in the given order.
///
/// Fails with [`Error::DuplicateName`] if a name repeats.
pub fn encode_bundle(entries: &[(&str, &ArrayHandle)], compress: bool) -> Result<Vec<u8>> {
    let mut writer = BundleWriter::new(compress);
    for (name, array) in entries {
        writer.add(name, array)?;
    }
    Ok(writer.finish())
}

// =============================================================================
// Lazy Reader
// =============================================================================

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    compressed: bool,
    payload: Bytes,
}

/// A decoded bundle whose entries are decoded on demand.
#[derive(Debug, Clone)]
pub struct Bundle {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    config: SerializeConfig,
}

/// Reads a bundle's entry table with default limits.
pub fn decode_bundle(bytes: &[u8]) -> Result<Bundle> {
    decode_bundle_with(bytes, &SerializeConfig::default())
}

/// Reads a bundle's entry table, enforcing `config`'s limits.
pub fn decode_bundle_with(bytes: &[u8], config: &SerializeConfig) -> Result<Bundle> {
    let mut reader = Reader::new(bytes);
    reader.header(BUNDLE_MAGIC, BUNDLE_VERSION)?;
    let count = reader.u32("entry count")?;

    let owned = Bytes::copy_from_slice(bytes);
    let mut entries = Vec::new();
    let mut index = HashMap::new();

    for _ in 0..count {
        let name_len = reader.u16("name length")?;
        let name = std::str::from_utf8(reader.take(usize::from(name_len), "name")?)
            .map_err(|_| Error::format("entry name is not valid utf-8"))?
            .to_string();

        let payload_len = reader.u64("payload length")?;
        if payload_len > config.max_payload_bytes {
            return Err(Error::format(format!(
                "entry {name:?} payload of {payload_len} bytes exceeds the limit"
            )));
        }
        let compressed = match reader.u8("compressed flag")? {
            0 => false,
            1 => true,
            other => {
                return Err(Error::format(format!("invalid compressed flag {other}")));
            }
        };

        let start = bytes.len() - reader.remaining();
        reader.take(payload_len as usize, "payload")?;
        let payload = owned.slice(start..start + payload_len as usize);

        if index.insert(name.clone(), entries.len()).is_some() {
            return Err(Error::DuplicateName { name });
        }
        entries.push(Entry {
            name,
            compressed,
            payload,
        });
    }

    if reader.remaining() != 0 {
        return Err(Error::format(format!(
            "{} trailing bytes after the last entry",
            reader.remaining()
        )));
    }

    tracing::debug!(entries = entries.len(), "decoded bundle index");
    Ok(Bundle {
        entries,
        index,
        config: *config,
    })
}

impl Bundle {
    /// Entry names in stored order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Returns true if an entry named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the bundle has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the named entry was stored compressed.
    pub fn is_compressed(&self, name: &str) -> Option<bool> {
        self.index.get(name).map(|&i| self.entries[i].compressed)
    }

    /// Decodes the named entry into a new array.
    pub fn get(&self, name: &str) -> Result<ArrayHandle> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| Error::invalid_operation(format!("no entry named {name:?}")))?;
        self.decode_entry(entry)
    }

    /// Decodes every entry.
    pub fn into_map(self) -> Result<BTreeMap<String, ArrayHandle>> {
        self.entries
            .iter()
            .map(|entry| Ok((entry.name.clone(), self.decode_entry(entry)?)))
            .collect()
    }

    fn decode_entry(&self, entry: &Entry) -> Result<ArrayHandle> {
        tracing::trace!(name = %entry.name, compressed = entry.compressed, "decoding entry");
        if !entry.compressed {
            return decode_single_with(&entry.payload, &self.config);
        }

        let declared = entry
            .payload
            .get(..4)
            .map(|raw| u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            .ok_or_else(|| Error::format("compressed payload is truncated"))?;
        if u64::from(declared) > self.config.max_payload_bytes {
            return Err(Error::format(format!(
                "entry {:?} expands to {declared} bytes, over the limit",
                entry.name
            )));
        }
        let raw = lz4_flex::decompress_size_prepended(&entry.payload)
            .map_err(|e| Error::format(format!("entry {:?}: {e}", entry.name)))?;
        decode_single_with(&raw, &self.config)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndview_array::{arange, ones, zeros};
    use ndview_core::DType;

    fn sample() -> (ArrayHandle, ArrayHandle) {
        (arange(10), ones(&[3, 3], DType::F32).unwrap())
    }

    #[test]
    fn test_bundle_roundtrip() {
        let (a, b) = sample();
        let bytes = encode_bundle(&[("a", &a), ("b", &b)], false).unwrap();
        let bundle = decode_bundle(&bytes).unwrap();

        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(bundle.contains("b"));
        assert!(!bundle.contains("c"));
        assert_eq!(bundle.is_compressed("a"), Some(false));
        assert_eq!(bundle.get("a").unwrap(), a);
        assert_eq!(bundle.get("b").unwrap(), b);
        assert!(bundle.get("c").is_err());
    }

    #[test]
    fn test_compressed_bundle() {
        let big = zeros(&[64, 64], DType::F64);
        let plain = encode_bundle(&[("z", &big)], false).unwrap();
        let packed = encode_bundle(&[("z", &big)], true).unwrap();
        assert!(packed.len() < plain.len());

        let bundle = decode_bundle(&packed).unwrap();
        assert_eq!(bundle.is_compressed("z"), Some(true));
        assert_eq!(bundle.get("z").unwrap(), big);
    }

    #[test]
    fn test_duplicate_names() {
        let (a, b) = sample();
        let err = encode_bundle(&[("x", &a), ("x", &b)], false).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateName {
                name: "x".to_string()
            }
        );

        let mut writer = BundleWriter::new(false);
        writer.add("x", &a).unwrap();
        assert!(matches!(
            writer.add("x", &b),
            Err(Error::DuplicateName { .. })
        ));
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn test_into_map() {
        let (a, b) = sample();
        let mut writer = BundleWriter::new(true);
        writer.add("first", &a).unwrap().add("second", &b).unwrap();
        let map = decode_bundle(&writer.finish()).unwrap().into_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["first"], a);
        assert_eq!(map["second"], b);
    }

    #[test]
    fn test_empty_bundle() {
        let bytes = BundleWriter::new(false).finish();
        assert_eq!(bytes.len(), 10);
        let bundle = decode_bundle(&bytes).unwrap();
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_lazy_decode_defers_entry_errors() {
        let (a, _) = sample();
        let mut bytes = encode_bundle(&[("a", &a)], false).unwrap();
        // Corrupt the entry's own magic; the table still reads.
        let payload_start = 10 + 2 + 1 + 8 + 1;
        bytes[payload_start] = b'?';
        let bundle = decode_bundle(&bytes).unwrap();
        assert!(bundle.contains("a"));
        assert!(matches!(bundle.get("a"), Err(Error::Format { .. })));
    }

    #[test]
    fn test_bad_bundle_header() {
        let (a, _) = sample();
        let bytes = encode_bundle(&[("a", &a)], false).unwrap();

        let mut wrong = bytes.clone();
        wrong[3] = b'A';
        assert!(matches!(decode_bundle(&wrong), Err(Error::Format { .. })));

        assert!(matches!(
            decode_bundle(&bytes[..bytes.len() - 2]),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let (a, b) = sample();
        let first = encode_bundle(&[("a", &a), ("b", &b)], true).unwrap();
        let second = encode_bundle(&[("a", &a), ("b", &b)], true).unwrap();
        assert_eq!(first, second);
    }
}
