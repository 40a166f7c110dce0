use crate::codec::SchemaCodec;
use crate::error::ProtoError;
use crate::flatten::flatten;
use crate::gen::{generate_codec, generate_layout};
use crate::parser::parse;
use crate::tokenizer::scan;
use crate::types::FlatSchema;
use crate::verifier::verify;

/// Compile a textual schema into its flat message table and callable codecs.
/// Returns `Err(ProtoError)` if scanning, flattening, or verification fails;
/// parse mismatches are tolerated and simply yield no output.
pub fn compile_schema(text: &str) -> Result<(FlatSchema, SchemaCodec), ProtoError> {
    let tokens = scan(text)?;
    let tree = parse(&tokens);
    let flat = flatten(&tree)?;
    verify(&flat)?;
    let codec = SchemaCodec::new(&flat)?;
    Ok((flat, codec))
}

/// Compile a textual schema into its two rendered artifacts: the layout
/// source and the codec source importing `layout_mod`.
pub fn compile_to_artifacts(text: &str, layout_mod: &str) -> Result<(String, String), ProtoError> {
    let (flat, _codec) = compile_schema(text)?;
    Ok((generate_layout(&flat), generate_codec(&flat, layout_mod)))
}
