//! This is a Rust library with the low-level primitives of the Protocol
//! Buffers binary wire format: varint and zigzag coding, fixed-width and
//! length-delimited framing, field keys, and the raw entry decoder, plus the
//! dynamic [`Value`]/[`Record`] data the compiled codecs operate on.
//!
//! ```
//! use protolith_wire::*;
//!
//! let entry = encode(1, &Value::Int(150), ScalarType::Int32);
//! assert_eq!(entry, [0x08, 0x96, 0x01]);
//!
//! let entries = decode_many(&entry).unwrap();
//! assert_eq!(entries, vec![(1, RawValue::Varint(150))]);
//! assert_eq!(decode_scalar(&entries[0].1, ScalarType::Int32), Ok(Value::Int(150)));
//! ```

pub mod bb;
pub mod value;
pub mod wire;

pub use bb::*;
pub use value::*;
pub use wire::*;
