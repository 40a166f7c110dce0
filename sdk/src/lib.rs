//! protolith
//!
//! This crate provides the runtime face of the Protolith schema compiler:
//!
//! - `compile_schema` (re-exported from the compiler)
//! - `SchemaCodec` for in-memory encoding/decoding of [`Record`] values
//! - JSON introspection of compiled schemas

pub use protolith_compiler::codec::SchemaCodec;
pub use protolith_compiler::compiler::{compile_schema, compile_to_artifacts};
pub use protolith_compiler::error::ProtoError;
pub use protolith_compiler::types::{FieldSpec, FlatMessage, FlatSchema, Literal, Rule};
pub use protolith_wire::{Record, ScalarType, Value, WireError};

/// Renders a compiled flat schema as a pretty-printed JSON string.
pub fn schema_to_json(flat: &FlatSchema) -> String {
    serde_json::to_string_pretty(flat).unwrap_or_default()
}

/// Compiles schema text and renders the flat schema as JSON in one step.
pub fn compile_to_json(text: &str) -> Result<String, ProtoError> {
    let (flat, _codec) = compile_schema(text)?;
    Ok(schema_to_json(&flat))
}

pub mod error {
    pub use protolith_compiler::error::ProtoError;
}

pub mod schema {
    pub use protolith_compiler::types::{FieldSpec, FlatMessage, FlatSchema};
}

pub mod wire {
    pub use protolith_wire::{Record, ScalarType, Value, WireError};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_dump_contains_messages_and_tags() {
        let json = compile_to_json("message M { required int32 x = 1; }").unwrap();
        assert!(json.contains("\"M\""));
        assert!(json.contains("\"tag\": 1"));
    }
}
