//! Data Types - ndview Element Type System
//!
//! The element type of an array is chosen at runtime, so it is modelled as
//! a closed enum with a fixed byte-width table. Operations branch on the
//! tag explicitly. Typed access from Rust goes through the `Element`
//! trait, and dynamically typed access goes through `Value`.
//!
//! # Key Features
//! - `DType` enum covering booleans, integers, floats and fixed-width bytes
//! - `ByteOrder` and `Descr` (dtype + byte order) for reading raw buffers
//! - `Value` for element exchange and casting between kinds
//! - `Element` trait connecting Rust scalar types to their `DType`
//!
//! @version 0.1.0

use core::fmt::{self, Debug};

use bytemuck::{Pod, Zeroable};
use half::f16;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// DType Enum
// =============================================================================

/// Runtime representation of array element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// Boolean stored as one byte (0 or 1).
    Bool,
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
    /// 16-bit floating point (half precision).
    F16,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
    /// Fixed-width byte string of the given width.
    Bytes(u32),
}

/// Broad numeric kind of a `DType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    UInt,
    /// Floating point.
    Float,
    /// Fixed-width bytes.
    Bytes,
}

impl DType {
    /// Returns the size in bytes of one element.
    #[must_use]
    pub const fn size_of(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 | Self::F16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
            Self::Bytes(width) => width as usize,
        }
    }

    /// Returns the numeric kind.
    #[must_use]
    pub const fn kind(self) -> Kind {
        match self {
            Self::Bool => Kind::Bool,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 => Kind::Int,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => Kind::UInt,
            Self::F16 | Self::F32 | Self::F64 => Kind::Float,
            Self::Bytes(_) => Kind::Bytes,
        }
    }

    /// Returns true if this is a floating point type.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self.kind(), Kind::Float)
    }

    /// Returns true if this is a signed or unsigned integer type.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self.kind(), Kind::Int | Kind::UInt)
    }

    /// Returns the name of this data type.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::I8 => "i8".to_string(),
            Self::I16 => "i16".to_string(),
            Self::I32 => "i32".to_string(),
            Self::I64 => "i64".to_string(),
            Self::U8 => "u8".to_string(),
            Self::U16 => "u16".to_string(),
            Self::U32 => "u32".to_string(),
            Self::U64 => "u64".to_string(),
            Self::F16 => "f16".to_string(),
            Self::F32 => "f32".to_string(),
            Self::F64 => "f64".to_string(),
            Self::Bytes(width) => format!("S{width}"),
        }
    }

    /// Wire code used by the serialized formats.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Bool => 0,
            Self::I8 => 1,
            Self::I16 => 2,
            Self::I32 => 3,
            Self::I64 => 4,
            Self::U8 => 5,
            Self::U16 => 6,
            Self::U32 => 7,
            Self::U64 => 8,
            Self::F16 => 9,
            Self::F32 => 10,
            Self::F64 => 11,
            Self::Bytes(_) => 12,
        }
    }

    /// Inverse of [`DType::code`]. Byte strings need their width supplied.
    pub fn from_code(code: u8, bytes_width: Option<u32>) -> Result<Self> {
        let dtype = match code {
            0 => Self::Bool,
            1 => Self::I8,
            2 => Self::I16,
            3 => Self::I32,
            4 => Self::I64,
            5 => Self::U8,
            6 => Self::U16,
            7 => Self::U32,
            8 => Self::U64,
            9 => Self::F16,
            10 => Self::F32,
            11 => Self::F64,
            12 => match bytes_width {
                Some(width) => Self::Bytes(width),
                None => return Err(Error::format("byte string dtype without width")),
            },
            other => return Err(Error::format(format!("unknown dtype code {other}"))),
        };
        Ok(dtype)
    }

    /// Returns the default floating point type (f64).
    #[must_use]
    pub const fn default_float() -> Self {
        Self::F64
    }

    /// Returns the default integer type (i64).
    #[must_use]
    pub const fn default_int() -> Self {
        Self::I64
    }
}

impl Default for DType {
    fn default() -> Self {
        Self::F64
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Byte Order
// =============================================================================

/// Byte order of multi-byte elements inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrder {
    /// Byte order of the running machine.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;
    /// Byte order of the running machine.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;

    /// Wire code used by the serialized formats.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Little => 0,
            Self::Big => 1,
        }
    }

    /// Inverse of [`ByteOrder::code`].
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Little),
            1 => Ok(Self::Big),
            other => Err(Error::format(format!("unknown byte order code {other}"))),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::NATIVE
    }
}

// =============================================================================
// Value
// =============================================================================

/// A single element value detached from any buffer.
///
/// Serializes untagged, so nested lists of values export as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
    /// Floating point value.
    Float(f64),
    /// Raw fixed-width bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the value as `f64`, or `None` for byte strings.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(i as f64),
            Self::UInt(u) => Some(u as f64),
            Self::Float(f) => Some(f),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the value as `i64` (float values truncate), or `None` for byte strings.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Bool(b) => Some(i64::from(b)),
            Self::Int(i) => Some(i),
            Self::UInt(u) => Some(u as i64),
            Self::Float(f) => Some(f as i64),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the truthiness of a numeric value, or `None` for byte strings.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            Self::Int(i) => Some(i != 0),
            Self::UInt(u) => Some(u != 0),
            Self::Float(f) => Some(f != 0.0),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the natural dtype for this value.
    #[must_use]
    pub fn natural_dtype(&self) -> DType {
        match self {
            Self::Bool(_) => DType::Bool,
            Self::Int(_) => DType::I64,
            Self::UInt(_) => DType::U64,
            Self::Float(_) => DType::F64,
            Self::Bytes(b) => DType::Bytes(b.len() as u32),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
        }
    }
}

macro_rules! impl_value_from {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from!(Int: i8, i16, i32, i64);
impl_value_from!(UInt: u8, u16, u32, u64);
impl_value_from!(Float: f32, f64);
impl_value_from!(Bool: bool);

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Bytes(v.as_bytes().to_vec())
    }
}

// =============================================================================
// Element Descriptor
// =============================================================================

/// Element type descriptor: dtype plus byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descr {
    /// The element type.
    pub dtype: DType,
    /// The byte order of multi-byte elements.
    pub order: ByteOrder,
}

macro_rules! read_num {
    ($ty:ty, $bytes:expr, $order:expr) => {{
        let mut raw = [0u8; core::mem::size_of::<$ty>()];
        raw.copy_from_slice(&$bytes[..core::mem::size_of::<$ty>()]);
        match $order {
            ByteOrder::Little => <$ty>::from_le_bytes(raw),
            ByteOrder::Big => <$ty>::from_be_bytes(raw),
        }
    }};
}

macro_rules! write_num {
    ($val:expr, $order:expr, $out:expr) => {{
        let raw = match $order {
            ByteOrder::Little => $val.to_le_bytes(),
            ByteOrder::Big => $val.to_be_bytes(),
        };
        $out[..raw.len()].copy_from_slice(&raw);
    }};
}

fn cast_num<T>(value: &Value, to: DType) -> Result<T>
where
    T: Copy + 'static,
    i64: AsPrimitive<T>,
    u64: AsPrimitive<T>,
    f64: AsPrimitive<T>,
{
    match *value {
        Value::Bool(b) => Ok(i64::from(b).as_()),
        Value::Int(i) => Ok(i.as_()),
        Value::UInt(u) => Ok(u.as_()),
        Value::Float(f) => Ok(f.as_()),
        Value::Bytes(ref b) => Err(Error::CastIncompatible {
            from: DType::Bytes(b.len() as u32),
            to,
        }),
    }
}

impl Descr {
    /// Creates a descriptor with an explicit byte order.
    #[must_use]
    pub const fn new(dtype: DType, order: ByteOrder) -> Self {
        Self { dtype, order }
    }

    /// Creates a descriptor in the machine's native byte order.
    #[must_use]
    pub const fn native(dtype: DType) -> Self {
        Self {
            dtype,
            order: ByteOrder::NATIVE,
        }
    }

    /// Size of one element in bytes.
    #[must_use]
    pub const fn itemsize(&self) -> usize {
        self.dtype.size_of()
    }

    /// True if elements are stored in native byte order (or are single bytes).
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.order == ByteOrder::NATIVE
            || matches!(self.dtype, DType::Bool | DType::I8 | DType::U8 | DType::Bytes(_))
    }

    /// Decodes one element from `bytes`, which must hold at least `itemsize` bytes.
    #[must_use]
    pub fn read(&self, bytes: &[u8]) -> Value {
        let order = self.order;
        match self.dtype {
            DType::Bool => Value::Bool(bytes[0] != 0),
            DType::I8 => Value::Int(i64::from(bytes[0] as i8)),
            DType::I16 => Value::Int(i64::from(read_num!(i16, bytes, order))),
            DType::I32 => Value::Int(i64::from(read_num!(i32, bytes, order))),
            DType::I64 => Value::Int(read_num!(i64, bytes, order)),
            DType::U8 => Value::UInt(u64::from(bytes[0])),
            DType::U16 => Value::UInt(u64::from(read_num!(u16, bytes, order))),
            DType::U32 => Value::UInt(u64::from(read_num!(u32, bytes, order))),
            DType::U64 => Value::UInt(read_num!(u64, bytes, order)),
            DType::F16 => Value::Float(read_num!(f16, bytes, order).to_f64()),
            DType::F32 => Value::Float(f64::from(read_num!(f32, bytes, order))),
            DType::F64 => Value::Float(read_num!(f64, bytes, order)),
            DType::Bytes(width) => Value::Bytes(bytes[..width as usize].to_vec()),
        }
    }

    /// Encodes `value` into `out` (at least `itemsize` bytes), converting it
    /// to this descriptor's element type.
    ///
    /// Numeric conversions follow Rust `as` semantics (integers wrap, floats
    /// truncate toward zero and saturate). Byte strings are truncated or
    /// zero-padded to the target width and never convert to numbers.
    pub fn write(&self, value: &Value, out: &mut [u8]) -> Result<()> {
        let order = self.order;
        let to = self.dtype;
        match to {
            DType::Bool => {
                let flag = value.as_bool().ok_or_else(|| Error::CastIncompatible {
                    from: value.natural_dtype(),
                    to,
                })?;
                out[0] = u8::from(flag);
            }
            DType::I8 => out[0] = cast_num::<i8>(value, to)? as u8,
            DType::I16 => write_num!(cast_num::<i16>(value, to)?, order, out),
            DType::I32 => write_num!(cast_num::<i32>(value, to)?, order, out),
            DType::I64 => write_num!(cast_num::<i64>(value, to)?, order, out),
            DType::U8 => out[0] = cast_num::<u8>(value, to)?,
            DType::U16 => write_num!(cast_num::<u16>(value, to)?, order, out),
            DType::U32 => write_num!(cast_num::<u32>(value, to)?, order, out),
            DType::U64 => write_num!(cast_num::<u64>(value, to)?, order, out),
            DType::F16 => {
                let f = value.as_f64().ok_or_else(|| Error::CastIncompatible {
                    from: value.natural_dtype(),
                    to,
                })?;
                write_num!(f16::from_f64(f), order, out);
            }
            DType::F32 => write_num!(cast_num::<f32>(value, to)?, order, out),
            DType::F64 => write_num!(cast_num::<f64>(value, to)?, order, out),
            DType::Bytes(width) => {
                let Value::Bytes(src) = value else {
                    return Err(Error::CastIncompatible {
                        from: value.natural_dtype(),
                        to,
                    });
                };
                let width = width as usize;
                let n = src.len().min(width);
                out[..n].copy_from_slice(&src[..n]);
                out[n..width].fill(0);
            }
        }
        Ok(())
    }

    /// Reverses the bytes of one element in place when switching byte order.
    pub fn swap_element(&self, element: &mut [u8]) {
        if !matches!(self.dtype, DType::Bytes(_)) {
            element[..self.itemsize()].reverse();
        }
    }
}

impl Default for Descr {
    fn default() -> Self {
        Self::native(DType::default())
    }
}

// =============================================================================
// Element Trait
// =============================================================================

/// Trait for Rust types that can be stored in an array without conversion.
///
/// The in-memory representation of an `Element` is exactly the native-order
/// encoding of its `DTYPE`.
pub trait Element: Copy + Debug + Default + Send + Sync + Pod + Zeroable + 'static {
    /// The runtime dtype for this type.
    const DTYPE: DType;

    /// Converts into a dynamic value.
    fn into_value(self) -> Value;

    /// Converts from a dynamic value, casting if necessary.
    fn from_value(value: &Value) -> Result<Self>;

    /// Returns the dtype for this type.
    #[must_use]
    fn dtype() -> DType {
        Self::DTYPE
    }
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            fn into_value(self) -> Value {
                Value::from(self)
            }

            fn from_value(value: &Value) -> Result<Self> {
                cast_num::<$ty>(value, $dtype)
            }
        }
    };
}

impl_element!(i8, DType::I8);
impl_element!(i16, DType::I16);
impl_element!(i32, DType::I32);
impl_element!(i64, DType::I64);
impl_element!(u8, DType::U8);
impl_element!(u16, DType::U16);
impl_element!(u32, DType::U32);
impl_element!(u64, DType::U64);
impl_element!(f32, DType::F32);
impl_element!(f64, DType::F64);

impl Element for f16 {
    const DTYPE: DType = DType::F16;

    fn into_value(self) -> Value {
        Value::Float(self.to_f64())
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_f64()
            .map(f16::from_f64)
            .ok_or_else(|| Error::CastIncompatible {
                from: value.natural_dtype(),
                to: DType::F16,
            })
    }
}

// Bool wrapper for Pod compatibility
/// One-byte boolean element (0 = false, anything else = true).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct Bool8(pub u8);

unsafe impl Zeroable for Bool8 {}
unsafe impl Pod for Bool8 {}

impl Element for Bool8 {
    const DTYPE: DType = DType::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self.0 != 0)
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bool()
            .map(Self::from)
            .ok_or_else(|| Error::CastIncompatible {
                from: value.natural_dtype(),
                to: DType::Bool,
            })
    }
}

impl From<bool> for Bool8 {
    fn from(b: bool) -> Self {
        Self(u8::from(b))
    }
}

impl From<Bool8> for bool {
    fn from(b: Bool8) -> Self {
        b.0 != 0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F32.size_of(), 4);
        assert_eq!(DType::F64.size_of(), 8);
        assert_eq!(DType::I16.size_of(), 2);
        assert_eq!(DType::Bool.size_of(), 1);
        assert_eq!(DType::Bytes(3).size_of(), 3);
    }

    #[test]
    fn test_dtype_code_table() {
        for dtype in [
            DType::Bool,
            DType::I8,
            DType::I64,
            DType::U32,
            DType::F16,
            DType::F64,
        ] {
            assert_eq!(DType::from_code(dtype.code(), None).unwrap(), dtype);
        }
        assert_eq!(
            DType::from_code(12, Some(5)).unwrap(),
            DType::Bytes(5)
        );
        assert!(DType::from_code(12, None).is_err());
        assert!(DType::from_code(200, None).is_err());
    }

    #[test]
    fn test_element_dtype() {
        assert_eq!(f32::dtype(), DType::F32);
        assert_eq!(i64::dtype(), DType::I64);
        assert_eq!(Bool8::dtype(), DType::Bool);
    }

    #[test]
    fn test_descr_read_write_orders() {
        let mut buf = [0u8; 4];
        let be = Descr::new(DType::I32, ByteOrder::Big);
        be.write(&Value::Int(1), &mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 1]);
        assert_eq!(be.read(&buf), Value::Int(1));

        let le = Descr::new(DType::I32, ByteOrder::Little);
        assert_eq!(le.read(&buf), Value::Int(1 << 24));
    }

    #[test]
    fn test_descr_write_casts() {
        let mut buf = [0u8; 8];
        let d = Descr::native(DType::F32);
        d.write(&Value::Int(3), &mut buf).unwrap();
        assert_eq!(d.read(&buf), Value::Float(3.0));

        let d = Descr::native(DType::I8);
        d.write(&Value::Int(300), &mut buf).unwrap();
        assert_eq!(d.read(&buf), Value::Int(44));

        let d = Descr::native(DType::Bool);
        d.write(&Value::Float(0.5), &mut buf).unwrap();
        assert_eq!(d.read(&buf), Value::Bool(true));
    }

    #[test]
    fn test_bytes_pad_and_reject() {
        let mut buf = [0xffu8; 4];
        let d = Descr::native(DType::Bytes(4));
        d.write(&Value::from("ab"), &mut buf).unwrap();
        assert_eq!(buf, [b'a', b'b', 0, 0]);

        let err = d.write(&Value::Int(1), &mut buf).unwrap_err();
        assert!(matches!(err, Error::CastIncompatible { .. }));

        let err = Descr::native(DType::I32)
            .write(&Value::from("ab"), &mut buf)
            .unwrap_err();
        assert!(matches!(err, Error::CastIncompatible { .. }));
    }

    #[test]
    fn test_f16_element() {
        let h = f16::from_f32(1.5);
        assert_eq!(h.into_value(), Value::Float(1.5));
        assert_eq!(f16::from_value(&Value::Int(2)).unwrap(), f16::from_f32(2.0));
    }

    #[test]
    fn test_value_serializes_untagged() {
        let values = vec![Value::Int(-1), Value::Float(0.5), Value::Bool(true)];
        assert_eq!(serde_json::to_string(&values).unwrap(), "[-1,0.5,true]");
    }
}
