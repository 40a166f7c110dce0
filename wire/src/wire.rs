use crate::bb::{unzigzag32, unzigzag64, zigzag32, zigzag64, ByteReader, ByteWriter};
use crate::value::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WireError {
    #[error("unexpected end of input")]
    Eof,

    #[error("varint does not fit in 64 bits")]
    VarintOverflow,

    #[error("invalid field key {0}")]
    InvalidKey(u64),

    #[error("unsupported wire type {0}")]
    UnsupportedWireType(u8),

    #[error("wire type {actual:?} does not match {expected:?}")]
    WireTypeMismatch {
        expected: WireType,
        actual: WireType,
    },
}

/// The four binary encoding categories of the Protocol Buffers wire format.
/// Deprecated group markers (ids 3 and 4) are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    pub fn from_id(id: u8) -> Result<WireType, WireError> {
        match id {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(WireError::UnsupportedWireType(other)),
        }
    }

    pub fn id(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }
}

/// The scalar type names of the proto2 grammar, each fixed to a wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Bool,
    Enum,
    String,
    Bytes,
}

impl ScalarType {
    /// Looks up a declared type name. Returns `None` for anything that is not
    /// a scalar wire type (message and enum names resolve elsewhere).
    pub fn from_name(name: &str) -> Option<ScalarType> {
        match name {
            "double" => Some(ScalarType::Double),
            "float" => Some(ScalarType::Float),
            "int32" => Some(ScalarType::Int32),
            "int64" => Some(ScalarType::Int64),
            "uint32" => Some(ScalarType::UInt32),
            "uint64" => Some(ScalarType::UInt64),
            "sint32" => Some(ScalarType::SInt32),
            "sint64" => Some(ScalarType::SInt64),
            "fixed32" => Some(ScalarType::Fixed32),
            "fixed64" => Some(ScalarType::Fixed64),
            "sfixed32" => Some(ScalarType::SFixed32),
            "sfixed64" => Some(ScalarType::SFixed64),
            "bool" => Some(ScalarType::Bool),
            "enum" => Some(ScalarType::Enum),
            "string" => Some(ScalarType::String),
            "bytes" => Some(ScalarType::Bytes),
            _ => None,
        }
    }

    pub fn wire_type(self) -> WireType {
        match self {
            ScalarType::Double | ScalarType::Fixed64 | ScalarType::SFixed64 => WireType::Fixed64,
            ScalarType::Float | ScalarType::Fixed32 | ScalarType::SFixed32 => WireType::Fixed32,
            ScalarType::String | ScalarType::Bytes => WireType::LengthDelimited,
            _ => WireType::Varint,
        }
    }
}

/// One wire entry as read off the stream, before any schema is applied.
/// Length-delimited entries self-describe their byte span; fixed-width
/// entries self-describe via the wire-type marker.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(Vec<u8>),
    Fixed32(u32),
}

impl RawValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            RawValue::Varint(_) => WireType::Varint,
            RawValue::Fixed64(_) => WireType::Fixed64,
            RawValue::LengthDelimited(_) => WireType::LengthDelimited,
            RawValue::Fixed32(_) => WireType::Fixed32,
        }
    }

    /// The byte span of a length-delimited entry, empty for the fixed-width
    /// kinds.
    pub fn bytes(&self) -> &[u8] {
        match self {
            RawValue::LengthDelimited(bytes) => bytes.as_slice(),
            _ => &[],
        }
    }
}

/// Wire-format-encodes one scalar or bytes value at the given tag. Value
/// kinds are coerced leniently, so a mismatched kind encodes as that scalar
/// type's zero value rather than failing.
pub fn encode(tag: u32, value: &Value, ty: ScalarType) -> Vec<u8> {
    let mut bb = ByteWriter::new();
    bb.write_key(tag, ty.wire_type());

    match ty {
        ScalarType::Double => bb.write_fixed64(value.as_f64().to_bits()),
        ScalarType::Float => bb.write_fixed32(value.as_f32().to_bits()),
        ScalarType::Int32 | ScalarType::Int64 | ScalarType::Enum => {
            bb.write_varint(value.as_i64() as u64)
        }
        ScalarType::UInt32 | ScalarType::UInt64 => bb.write_varint(value.as_u64()),
        ScalarType::SInt32 => bb.write_varint(zigzag32(value.as_i64() as i32) as u64),
        ScalarType::SInt64 => bb.write_varint(zigzag64(value.as_i64())),
        ScalarType::Fixed32 => bb.write_fixed32(value.as_u64() as u32),
        ScalarType::Fixed64 => bb.write_fixed64(value.as_u64()),
        ScalarType::SFixed32 => bb.write_fixed32(value.as_i64() as i32 as u32),
        ScalarType::SFixed64 => bb.write_fixed64(value.as_i64() as u64),
        ScalarType::Bool => bb.write_varint(value.as_bool() as u64),
        ScalarType::String => bb.write_len_prefixed(value.as_str().as_bytes()),
        ScalarType::Bytes => match value {
            Value::Str(text) => bb.write_len_prefixed(text.as_bytes()),
            other => bb.write_len_prefixed(other.as_bytes()),
        },
    }

    bb.data()
}

/// Decodes a full message body into its constituent (tag, raw value) entries,
/// in stream order, without prior knowledge of each tag's type. Repeated tags
/// are preserved, not deduplicated.
pub fn decode_many(data: &[u8]) -> Result<Vec<(u32, RawValue)>, WireError> {
    let mut bb = ByteReader::new(data);
    let mut entries = Vec::new();

    while !bb.is_empty() {
        let (tag, wire) = bb.read_key()?;
        let raw = match wire {
            WireType::Varint => RawValue::Varint(bb.read_varint()?),
            WireType::Fixed64 => RawValue::Fixed64(bb.read_fixed64()?),
            WireType::LengthDelimited => RawValue::LengthDelimited(bb.read_len_prefixed()?.to_vec()),
            WireType::Fixed32 => RawValue::Fixed32(bb.read_fixed32()?),
        };
        entries.push((tag, raw));
    }

    Ok(entries)
}

/// Interprets one raw wire entry as the given scalar type.
pub fn decode_scalar(raw: &RawValue, ty: ScalarType) -> Result<Value, WireError> {
    let mismatch = || WireError::WireTypeMismatch {
        expected: ty.wire_type(),
        actual: raw.wire_type(),
    };

    match (ty, raw) {
        (ScalarType::Double, RawValue::Fixed64(bits)) => Ok(Value::Double(f64::from_bits(*bits))),
        (ScalarType::Float, RawValue::Fixed32(bits)) => Ok(Value::Float(f32::from_bits(*bits))),
        (ScalarType::Int32, RawValue::Varint(v)) => Ok(Value::Int(*v as u32 as i32 as i64)),
        (ScalarType::Int64 | ScalarType::Enum, RawValue::Varint(v)) => Ok(Value::Int(*v as i64)),
        (ScalarType::UInt32, RawValue::Varint(v)) => Ok(Value::UInt(*v as u32 as u64)),
        (ScalarType::UInt64, RawValue::Varint(v)) => Ok(Value::UInt(*v)),
        (ScalarType::SInt32, RawValue::Varint(v)) => Ok(Value::Int(unzigzag32(*v as u32) as i64)),
        (ScalarType::SInt64, RawValue::Varint(v)) => Ok(Value::Int(unzigzag64(*v))),
        (ScalarType::Fixed32, RawValue::Fixed32(v)) => Ok(Value::UInt(*v as u64)),
        (ScalarType::Fixed64, RawValue::Fixed64(v)) => Ok(Value::UInt(*v)),
        (ScalarType::SFixed32, RawValue::Fixed32(v)) => Ok(Value::Int(*v as i32 as i64)),
        (ScalarType::SFixed64, RawValue::Fixed64(v)) => Ok(Value::Int(*v as i64)),
        (ScalarType::Bool, RawValue::Varint(v)) => Ok(Value::Bool(*v != 0)),
        (ScalarType::String, RawValue::LengthDelimited(bytes)) => {
            Ok(Value::Str(String::from_utf8_lossy(bytes).into_owned()))
        }
        (ScalarType::Bytes, RawValue::LengthDelimited(bytes)) => Ok(Value::Bytes(bytes.clone())),
        _ => Err(mismatch()),
    }
}

#[test]
fn scalar_type_names() {
    assert_eq!(ScalarType::from_name("int32"), Some(ScalarType::Int32));
    assert_eq!(ScalarType::from_name("sfixed64"), Some(ScalarType::SFixed64));
    assert_eq!(ScalarType::from_name("bytes"), Some(ScalarType::Bytes));
    assert_eq!(ScalarType::from_name("Person"), None);
    assert_eq!(ScalarType::from_name("int"), None);
}

#[test]
fn scalar_wire_types() {
    assert_eq!(ScalarType::Int32.wire_type(), WireType::Varint);
    assert_eq!(ScalarType::Bool.wire_type(), WireType::Varint);
    assert_eq!(ScalarType::Double.wire_type(), WireType::Fixed64);
    assert_eq!(ScalarType::SFixed64.wire_type(), WireType::Fixed64);
    assert_eq!(ScalarType::Float.wire_type(), WireType::Fixed32);
    assert_eq!(ScalarType::Fixed32.wire_type(), WireType::Fixed32);
    assert_eq!(ScalarType::String.wire_type(), WireType::LengthDelimited);
    assert_eq!(ScalarType::Bytes.wire_type(), WireType::LengthDelimited);
}

#[test]
fn encode_varint_field() {
    assert_eq!(encode(1, &Value::Int(150), ScalarType::Int32), [0x08, 0x96, 0x01]);
    assert_eq!(encode(2, &Value::UInt(1), ScalarType::UInt64), [0x10, 0x01]);
    assert_eq!(encode(1, &Value::Bool(true), ScalarType::Bool), [0x08, 0x01]);
    assert_eq!(
        encode(1, &Value::Int(-1), ScalarType::Int64),
        [0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
    );
    assert_eq!(encode(1, &Value::Int(-1), ScalarType::SInt32), [0x08, 0x01]);
    assert_eq!(encode(1, &Value::Int(-2), ScalarType::SInt64), [0x08, 0x03]);
}

#[test]
fn encode_fixed_field() {
    assert_eq!(
        encode(1, &Value::Double(1.0), ScalarType::Double),
        [0x09, 0, 0, 0, 0, 0, 0, 0xF0, 0x3F]
    );
    assert_eq!(
        encode(2, &Value::Float(1.0), ScalarType::Float),
        [0x15, 0, 0, 0x80, 0x3F]
    );
    assert_eq!(
        encode(3, &Value::UInt(123456), ScalarType::Fixed32),
        [0x1D, 0x40, 0xE2, 0x01, 0x00]
    );
    assert_eq!(
        encode(3, &Value::Int(-1), ScalarType::SFixed32),
        [0x1D, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn encode_len_prefixed_field() {
    assert_eq!(
        encode(1, &Value::Str("testing".to_string()), ScalarType::String),
        [0x0A, 0x07, 0x74, 0x65, 0x73, 0x74, 0x69, 0x6E, 0x67]
    );
    assert_eq!(
        encode(2, &Value::Bytes(vec![1, 2, 3]), ScalarType::Bytes),
        [0x12, 0x03, 1, 2, 3]
    );
    // string-kind values still encode on a bytes field
    assert_eq!(
        encode(2, &Value::Str("ab".to_string()), ScalarType::Bytes),
        [0x12, 0x02, 97, 98]
    );
}

#[test]
fn decode_many_entries() {
    let entries = decode_many(&[0x08, 0x96, 0x01, 0x12, 0x03, 1, 2, 3, 0x1D, 0x40, 0xE2, 0x01, 0x00])
        .unwrap();
    assert_eq!(
        entries,
        vec![
            (1, RawValue::Varint(150)),
            (2, RawValue::LengthDelimited(vec![1, 2, 3])),
            (3, RawValue::Fixed32(123456)),
        ]
    );
}

#[test]
fn decode_many_preserves_repeats() {
    let entries = decode_many(&[0x08, 0x01, 0x08, 0x02, 0x08, 0x03]).unwrap();
    assert_eq!(
        entries,
        vec![
            (1, RawValue::Varint(1)),
            (1, RawValue::Varint(2)),
            (1, RawValue::Varint(3)),
        ]
    );
}

#[test]
fn decode_many_rejects_bad_input() {
    assert_eq!(decode_many(&[0x08]), Err(WireError::Eof));
    assert_eq!(decode_many(&[0x00, 0x01]), Err(WireError::InvalidKey(0)));
    assert_eq!(decode_many(&[0x0B]), Err(WireError::UnsupportedWireType(3)));
    assert_eq!(decode_many(&[0x12, 0x05, 1, 2]), Err(WireError::Eof));
}

#[test]
fn decode_scalar_values() {
    assert_eq!(
        decode_scalar(&RawValue::Varint(150), ScalarType::Int32),
        Ok(Value::Int(150))
    );
    // a 64-bit sign-extended negative truncates back down to i32 range
    assert_eq!(
        decode_scalar(&RawValue::Varint(u64::MAX), ScalarType::Int32),
        Ok(Value::Int(-1))
    );
    assert_eq!(
        decode_scalar(&RawValue::Varint(1), ScalarType::SInt32),
        Ok(Value::Int(-1))
    );
    assert_eq!(
        decode_scalar(&RawValue::Varint(0), ScalarType::Bool),
        Ok(Value::Bool(false))
    );
    assert_eq!(
        decode_scalar(&RawValue::Fixed64(0x3FF0_0000_0000_0000), ScalarType::Double),
        Ok(Value::Double(1.0))
    );
    assert_eq!(
        decode_scalar(&RawValue::LengthDelimited(b"abc".to_vec()), ScalarType::String),
        Ok(Value::Str("abc".to_string()))
    );
    assert_eq!(
        decode_scalar(&RawValue::LengthDelimited(vec![1, 2]), ScalarType::Bytes),
        Ok(Value::Bytes(vec![1, 2]))
    );
}

#[test]
fn decode_scalar_mismatch() {
    assert_eq!(
        decode_scalar(&RawValue::Varint(1), ScalarType::String),
        Err(WireError::WireTypeMismatch {
            expected: WireType::LengthDelimited,
            actual: WireType::Varint,
        })
    );
    assert_eq!(
        decode_scalar(&RawValue::Fixed32(1), ScalarType::Double),
        Err(WireError::WireTypeMismatch {
            expected: WireType::Fixed64,
            actual: WireType::Fixed32,
        })
    );
}

#[test]
fn encode_decode_round_trip() {
    let encoded = encode(7, &Value::Str("🍕".to_string()), ScalarType::String);
    let entries = decode_many(&encoded).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, 7);
    assert_eq!(
        decode_scalar(&entries[0].1, ScalarType::String),
        Ok(Value::Str("🍕".to_string()))
    );
}
