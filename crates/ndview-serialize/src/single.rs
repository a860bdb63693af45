//! Single-Array Binary Format
//!
//! Layout of an encoded array (all integers little-endian):
//!
//! | Field       | Size          | Notes                                 |
//! |-------------|---------------|---------------------------------------|
//! | magic       | 4             | `NDVA`                                |
//! | version     | 2             | currently 1                           |
//! | dtype code  | 1             | see [`DType::code`]                   |
//! | byte order  | 1             | 0 little, 1 big                       |
//! | width       | 4             | only for byte-string dtypes           |
//! | ndim        | 1             |                                       |
//! | shape       | 8 x ndim      |                                       |
//! | elements    | rest          | C order, in the recorded byte order   |
//!
//! Encoding is deterministic: equal shape, dtype and elements always give
//! identical bytes regardless of the source's strides.
//!
//! @version 0.1.0

use ndview_array::{packed_extent, ArrayHandle, Order};
use ndview_core::dtype::{ByteOrder, DType, Descr};
use ndview_core::error::{Error, Result};

use crate::config::SerializeConfig;

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes opening a single-array payload.
pub const SINGLE_MAGIC: [u8; 4] = *b"NDVA";

/// Current single-array format version.
pub const SINGLE_VERSION: u16 = 1;

const BYTES_CODE: u8 = 12;

// =============================================================================
// Byte Reader
// =============================================================================

/// Bounds-checked little-endian reader over a byte slice.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                Error::format(format!(
                    "truncated input: need {n} bytes for {what} at offset {}",
                    self.pos
                ))
            })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub(crate) fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub(crate) fn u16(&mut self, what: &str) -> Result<u16> {
        let raw = self.take(2, what)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    pub(crate) fn u32(&mut self, what: &str) -> Result<u32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4, what)?);
        Ok(u32::from_le_bytes(raw))
    }

    pub(crate) fn u64(&mut self, what: &str) -> Result<u64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8, what)?);
        Ok(u64::from_le_bytes(raw))
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Checks magic bytes and version, returning the version read.
    pub(crate) fn header(&mut self, magic: [u8; 4], version: u16) -> Result<u16> {
        let found = self.take(4, "magic")?;
        if found != magic {
            return Err(Error::format(format!(
                "bad magic: expected {:?}, found {:?}",
                String::from_utf8_lossy(&magic),
                String::from_utf8_lossy(found)
            )));
        }
        let found = self.u16("version")?;
        if found != version {
            return Err(Error::format(format!(
                "unsupported version {found} (expected {version})"
            )));
        }
        Ok(found)
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encodes `array` as a self-describing single-array payload.
///
/// Non-contiguous arrays are packed in C order first.
pub fn encode_single(array: &ArrayHandle) -> Vec<u8> {
    let descr = array.descr();
    let elements = array.pack(Order::C);

    let mut out = Vec::with_capacity(16 + 8 * array.ndim() + elements.len());
    out.extend_from_slice(&SINGLE_MAGIC);
    out.extend_from_slice(&SINGLE_VERSION.to_le_bytes());
    out.push(descr.dtype.code());
    out.push(descr.order.code());
    if let DType::Bytes(width) = descr.dtype {
        out.extend_from_slice(&width.to_le_bytes());
    }
    out.push(array.ndim() as u8);
    for &dim in array.shape() {
        out.extend_from_slice(&(dim as u64).to_le_bytes());
    }
    out.extend_from_slice(&elements);

    tracing::trace!(
        dtype = %descr.dtype,
        shape = ?array.shape(),
        bytes = out.len(),
        "encoded array"
    );
    out
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes a single-array payload with default limits.
pub fn decode_single(bytes: &[u8]) -> Result<ArrayHandle> {
    decode_single_with(bytes, &SerializeConfig::default())
}

/// Decodes a single-array payload, enforcing `config`'s limits.
///
/// The result owns a new C-contiguous buffer; `bytes` is not retained.
pub fn decode_single_with(bytes: &[u8], config: &SerializeConfig) -> Result<ArrayHandle> {
    let mut reader = Reader::new(bytes);
    reader.header(SINGLE_MAGIC, SINGLE_VERSION)?;

    let code = reader.u8("dtype code")?;
    let order = ByteOrder::from_code(reader.u8("byte order")?)?;
    let width = if code == BYTES_CODE {
        Some(reader.u32("byte string width")?)
    } else {
        None
    };
    let dtype = DType::from_code(code, width)?;

    let ndim = reader.u8("ndim")?;
    if ndim > config.max_ndim {
        return Err(Error::format(format!(
            "{ndim} dimensions exceeds the limit of {}",
            config.max_ndim
        )));
    }

    let mut shape = Vec::with_capacity(usize::from(ndim));
    let mut count: u64 = 1;
    for _ in 0..ndim {
        let dim = reader.u64("shape")?;
        count = count
            .checked_mul(dim)
            .ok_or_else(|| Error::format("element count overflows"))?;
        shape.push(usize::try_from(dim).map_err(|_| Error::format("dimension too large"))?);
    }

    if packed_extent(&shape, dtype.size_of()).is_none() {
        return Err(Error::format(format!("shape {shape:?} is too large to address")));
    }

    let expected = count
        .checked_mul(dtype.size_of() as u64)
        .filter(|&n| n <= config.max_payload_bytes)
        .ok_or_else(|| {
            Error::format(format!(
                "element region exceeds the limit of {} bytes",
                config.max_payload_bytes
            ))
        })?;

    if reader.remaining() as u64 != expected {
        return Err(Error::format(format!(
            "element region is {} bytes, header declares {expected}",
            reader.remaining()
        )));
    }
    let elements = reader.take(expected as usize, "elements")?.to_vec();

    ArrayHandle::from_parts(&shape, Descr::new(dtype, order), elements)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndview_array::{arange, zeros, IndexSpec};
    use ndview_core::Value;

    #[test]
    fn test_roundtrip_shapes() {
        let scalar = ArrayHandle::scalar(4.5);
        let vector = ArrayHandle::from_vec(vec![1i32, -2, 3, -4, 5], &[5]).unwrap();
        let grid = arange(12).reshape(&[3, 4]).unwrap();

        for array in [&scalar, &vector, &grid] {
            let decoded = decode_single(&encode_single(array)).unwrap();
            assert_eq!(&decoded, array);
            assert!(decoded.is_c_contiguous());
            assert!(decoded.owns_buffer());
            assert!(!decoded.shares_buffer(array));
        }
    }

    #[test]
    fn test_transposed_is_packed_in_c_order() {
        let grid = arange(12).reshape(&[3, 4]).unwrap();
        let t = grid.transpose();
        let decoded = decode_single(&encode_single(&t)).unwrap();
        assert_eq!(decoded.shape(), &[4, 3]);
        assert_eq!(decoded, t);
        assert!(decoded.is_c_contiguous());

        // Same logical contents give identical bytes.
        let packed = t.ascontiguous(Order::C);
        assert_eq!(encode_single(&t), encode_single(&packed));
    }

    #[test]
    fn test_header_layout() {
        let a = ArrayHandle::from_vec(vec![7u8, 8], &[2]).unwrap();
        let bytes = encode_single(&a);
        assert_eq!(&bytes[..4], b"NDVA");
        assert_eq!(&bytes[4..6], &[1, 0]);
        assert_eq!(bytes[6], DType::U8.code());
        assert_eq!(bytes[8], 1);
        assert_eq!(&bytes[9..17], &2u64.to_le_bytes());
        assert_eq!(&bytes[17..], &[7, 8]);
    }

    #[test]
    fn test_byte_strings_and_big_endian() {
        let names = ArrayHandle::from_values(
            &[Value::from("ali"), Value::from("reza")],
            &[2],
            DType::Bytes(4),
        )
        .unwrap();
        assert_eq!(decode_single(&encode_single(&names)).unwrap(), names);

        let be = ArrayHandle::from_bytes_readonly(
            bytes::Bytes::from(vec![0u8, 1, 0, 2]),
            Descr::new(DType::U16, ByteOrder::Big),
            None,
        )
        .unwrap();
        let decoded = decode_single(&encode_single(&be)).unwrap();
        assert_eq!(decoded.byte_order(), ByteOrder::Big);
        assert_eq!(decoded.to_vec::<u16>().unwrap(), vec![1, 2]);
        assert!(!decoded.is_read_only());
    }

    #[test]
    fn test_view_roundtrip() {
        let grid = arange(20).reshape(&[4, 5]).unwrap();
        let view = grid
            .index(&[ndview_array::s_range(3, 0, -2), IndexSpec::All])
            .unwrap();
        assert_eq!(decode_single(&encode_single(&view)).unwrap(), view);
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut bytes = encode_single(&zeros(&[2], DType::F32));
        bytes[0] = b'X';
        assert!(matches!(decode_single(&bytes), Err(Error::Format { .. })));

        let mut bytes = encode_single(&zeros(&[2], DType::F32));
        bytes[4] = 9;
        assert!(matches!(decode_single(&bytes), Err(Error::Format { .. })));
    }

    #[test]
    fn test_truncated_and_trailing() {
        let bytes = encode_single(&arange(4));
        assert!(matches!(
            decode_single(&bytes[..bytes.len() - 1]),
            Err(Error::Format { .. })
        ));
        assert!(matches!(decode_single(&bytes[..3]), Err(Error::Format { .. })));

        let mut long = bytes.clone();
        long.push(0);
        assert!(matches!(decode_single(&long), Err(Error::Format { .. })));
    }

    #[test]
    fn test_unknown_dtype_code() {
        let mut bytes = encode_single(&arange(1));
        bytes[6] = 200;
        assert!(matches!(decode_single(&bytes), Err(Error::Format { .. })));
    }

    #[test]
    fn test_empty_array_with_huge_dimension() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&SINGLE_MAGIC);
        bytes.extend_from_slice(&SINGLE_VERSION.to_le_bytes());
        bytes.push(DType::I64.code());
        bytes.push(ByteOrder::Little.code());
        bytes.push(2);
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&(1u64 << 62).to_le_bytes());
        assert!(matches!(decode_single(&bytes), Err(Error::Format { .. })));

        // A reasonable zero-extent shape still decodes.
        let empty = zeros(&[0, 3], DType::I64);
        let decoded = decode_single(&encode_single(&empty)).unwrap();
        assert_eq!(decoded.shape(), &[0, 3]);
        assert_eq!(decoded.size(), 0);
    }

    #[test]
    fn test_config_limits() {
        let bytes = encode_single(&zeros(&[2, 2, 2], DType::F64));
        let strict = SerializeConfig {
            max_ndim: 2,
            ..SerializeConfig::default()
        };
        assert!(matches!(
            decode_single_with(&bytes, &strict),
            Err(Error::Format { .. })
        ));

        let small = SerializeConfig {
            max_payload_bytes: 32,
            ..SerializeConfig::default()
        };
        assert!(matches!(
            decode_single_with(&bytes, &small),
            Err(Error::Format { .. })
        ));
    }
}
