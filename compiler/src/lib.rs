//! protolith-compiler
//!
//! This crate implements:
//!  1) A scanner + tolerant parser for a proto2 schema subset,
//!  2) A flattening pass that hoists nested declarations into one namespace,
//!  3) A schema verifier (duplicate tags, duplicate names, missing types),
//!  4) In-memory codec construction (`SchemaCodec` → encode/decode per message),
//!  5) Artifact generation (`generate_layout` / `generate_codec` → `String`),
//!  6) Error types (`ProtoError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod flatten;
pub mod verifier;
pub mod layout;
pub mod codec;
pub mod gen;
pub mod compiler;

pub use codec::SchemaCodec;
pub use compiler::compile_schema;
pub use compiler::compile_to_artifacts;
pub use error::ProtoError;
pub use gen::{generate_codec, generate_layout};
pub use layout::layout;
