use crate::codec::default_value_for;
use crate::layout::tag_ordered;
use crate::types::{FieldSpec, FlatSchema, Rule};
use crate::utils::quote;
use protolith_wire::{ScalarType, Value};

/// Converts a string to PascalCase, leaving interior casing alone so that
/// already-capitalized message names pass through unchanged.
fn to_pascal_case(s: &str) -> String {
    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
                }
            })
            .collect::<String>()
    } else {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "as", "break", "const", "continue", "crate", "else",
        "enum", "extern", "false", "fn", "for", "if", "impl",
        "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "self", "Self", "static",
        "struct", "super", "trait", "true", "type", "unsafe",
        "use", "where", "while",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

fn rust_scalar(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Double => "f64",
        ScalarType::Float => "f32",
        ScalarType::Int32 | ScalarType::SInt32 | ScalarType::SFixed32 => "i32",
        ScalarType::Int64 | ScalarType::SInt64 | ScalarType::SFixed64 | ScalarType::Enum => "i64",
        ScalarType::UInt32 | ScalarType::Fixed32 => "u32",
        ScalarType::UInt64 | ScalarType::Fixed64 => "u64",
        ScalarType::Bool => "bool",
        ScalarType::String => "String",
        ScalarType::Bytes => "Vec<u8>",
    }
}

/// The scalar type a field encodes with, folding enum-typed fields down to
/// their integer representation. `None` means the field holds a nested
/// message.
fn field_scalar(flat: &FlatSchema, field: &FieldSpec) -> Option<ScalarType> {
    if let Some(scalar) = ScalarType::from_name(&field.type_name) {
        Some(scalar)
    } else if flat.is_enum(&field.type_name) {
        Some(ScalarType::Enum)
    } else {
        None
    }
}

fn field_ident(field: &FieldSpec) -> String {
    escape_rust_keyword(&field.name.to_lowercase())
}

fn scalar_name(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Double => "Double",
        ScalarType::Float => "Float",
        ScalarType::Int32 => "Int32",
        ScalarType::Int64 => "Int64",
        ScalarType::UInt32 => "UInt32",
        ScalarType::UInt64 => "UInt64",
        ScalarType::SInt32 => "SInt32",
        ScalarType::SInt64 => "SInt64",
        ScalarType::Fixed32 => "Fixed32",
        ScalarType::Fixed64 => "Fixed64",
        ScalarType::SFixed32 => "SFixed32",
        ScalarType::SFixed64 => "SFixed64",
        ScalarType::Bool => "Bool",
        ScalarType::Enum => "Enum",
        ScalarType::String => "String",
        ScalarType::Bytes => "Bytes",
    }
}

/// `&T -> Value` constructor text for the encode side.
fn value_expr(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Double => "Value::Double(*v)",
        ScalarType::Float => "Value::Float(*v)",
        ScalarType::Int32 | ScalarType::SInt32 | ScalarType::SFixed32 => "Value::Int(*v as i64)",
        ScalarType::Int64 | ScalarType::SInt64 | ScalarType::SFixed64 | ScalarType::Enum => {
            "Value::Int(*v)"
        }
        ScalarType::UInt32 | ScalarType::Fixed32 => "Value::UInt(*v as u64)",
        ScalarType::UInt64 | ScalarType::Fixed64 => "Value::UInt(*v)",
        ScalarType::Bool => "Value::Bool(*v)",
        ScalarType::String => "Value::Str(v.clone())",
        ScalarType::Bytes => "Value::Bytes(v.clone())",
    }
}

/// `Value -> T` extraction text for the decode side.
fn extract_expr(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Double => ".as_f64()",
        ScalarType::Float => ".as_f32()",
        ScalarType::Int32 | ScalarType::SInt32 | ScalarType::SFixed32 => ".as_i64() as i32",
        ScalarType::Int64 | ScalarType::SInt64 | ScalarType::SFixed64 | ScalarType::Enum => {
            ".as_i64()"
        }
        ScalarType::UInt32 | ScalarType::Fixed32 => ".as_u64() as u32",
        ScalarType::UInt64 | ScalarType::Fixed64 => ".as_u64()",
        ScalarType::Bool => ".as_bool()",
        ScalarType::String => ".as_str().to_string()",
        ScalarType::Bytes => ".as_bytes().to_vec()",
    }
}

/// Renders a default as a `Value` constructor expression.
fn default_value_expr(value: &Value) -> String {
    match value {
        Value::Bool(v) => format!("Value::Bool({})", v),
        Value::Int(v) => format!("Value::Int({})", v),
        Value::UInt(v) => format!("Value::UInt({})", v),
        Value::Float(v) => format!("Value::Float({:?})", v),
        Value::Double(v) => format!("Value::Double({:?})", v),
        Value::Str(v) => format!("Value::Str({}.to_string())", quote(v)),
        Value::Bytes(v) => format!("Value::Bytes(vec!{:?})", v),
        _ => "Value::Int(0)".to_string(),
    }
}

/// Renders a default as a plain Rust literal of the field's layout type.
fn default_literal_expr(value: &Value, scalar: ScalarType) -> String {
    match value {
        Value::Bool(v) => format!("{}", v),
        Value::Int(v) => match scalar {
            ScalarType::Int32 | ScalarType::SInt32 | ScalarType::SFixed32 => format!("{}i32", v),
            _ => format!("{}i64", v),
        },
        Value::UInt(v) => match scalar {
            ScalarType::UInt32 | ScalarType::Fixed32 => format!("{}u32", v),
            _ => format!("{}u64", v),
        },
        Value::Float(v) => format!("{:?}f32", v),
        Value::Double(v) => format!("{:?}f64", v),
        Value::Str(v) => format!("{}.to_string()", quote(v)),
        Value::Bytes(v) => format!("vec!{:?}", v),
        _ => "Default::default()".to_string(),
    }
}

/// Renders the layout file: one struct per message, fields lower-cased in
/// ascending tag order. Every field is `Option`-wrapped so an unset field is
/// representable, repeated fields as `Option<Vec<T>>`.
pub fn generate_layout(flat: &FlatSchema) -> String {
    let mut code: Vec<String> = Vec::new();

    for message in &flat.messages {
        code.push("#[derive(Debug, Clone, PartialEq, Default)]".to_string());
        code.push(format!("pub struct {} {{", to_pascal_case(&message.name)));
        for field in tag_ordered(message) {
            let base = match field_scalar(flat, field) {
                Some(scalar) => rust_scalar(scalar).to_string(),
                None => format!("Box<{}>", to_pascal_case(&field.type_name)),
            };
            let wrapped = if field.rule == Rule::Repeated {
                format!("Option<Vec<{}>>", base)
            } else {
                format!("Option<{}>", base)
            };
            code.push(format!("    pub {}: {},", field_ident(field), wrapped));
        }
        code.push("}".to_string());
        code.push(String::new());
    }

    code.join("\n")
}

/// Renders the codec file: one exported `encode_<name>` and one exported
/// `decode_<name>` routine per message, importing the layout module.
pub fn generate_codec(flat: &FlatSchema, layout_mod: &str) -> String {
    let mut code: Vec<String> = Vec::new();

    code.push(format!("use super::{}::*;", layout_mod));
    code.push("use protolith_wire::{decode_many, decode_scalar, encode, ScalarType, Value, WireError};".to_string());
    code.push(String::new());

    for message in &flat.messages {
        code.push(generate_encode(flat, message));
        code.push(String::new());
        code.push(generate_decode(flat, message));
        code.push(String::new());
    }

    code.join("\n")
}

fn generate_encode(flat: &FlatSchema, message: &crate::types::FlatMessage) -> String {
    let lower = message.name.to_lowercase();
    let mut lines = Vec::new();

    lines.push(format!(
        "pub fn encode_{}(record: &{}) -> Vec<u8> {{",
        lower,
        to_pascal_case(&message.name)
    ));
    lines.push("    let mut out = Vec::new();".to_string());

    for field in tag_ordered(message) {
        let ident = field_ident(field);
        match field_scalar(flat, field) {
            Some(scalar) => {
                let entry = format!(
                    "encode({}, &{}, ScalarType::{})",
                    field.tag,
                    value_expr(scalar),
                    scalar_name(scalar)
                );
                if field.rule == Rule::Repeated {
                    lines.push(format!(
                        "    for v in record.{}.iter().flatten() {{ out.extend({}); }}",
                        ident, entry
                    ));
                } else if let Some(default) =
                    field.default.as_ref().and_then(|l| default_value_for(flat, field, l))
                {
                    lines.push(format!("    match &record.{} {{", ident));
                    lines.push(format!("        Some(v) => out.extend({}),", entry));
                    lines.push(format!(
                        "        None => out.extend(encode({}, &{}, ScalarType::{})),",
                        field.tag,
                        default_value_expr(&default),
                        scalar_name(scalar)
                    ));
                    lines.push("    }".to_string());
                } else {
                    lines.push(format!(
                        "    if let Some(v) = &record.{} {{ out.extend({}); }}",
                        ident, entry
                    ));
                }
            }
            None => {
                let sub = field.type_name.to_lowercase();
                let entry = format!(
                    "encode({}, &Value::Bytes(encode_{}(v)), ScalarType::Bytes)",
                    field.tag, sub
                );
                if field.rule == Rule::Repeated {
                    lines.push(format!(
                        "    for v in record.{}.iter().flatten() {{ out.extend({}); }}",
                        ident, entry
                    ));
                } else {
                    lines.push(format!(
                        "    if let Some(v) = &record.{} {{ out.extend({}); }}",
                        ident, entry
                    ));
                }
            }
        }
    }

    lines.push("    out".to_string());
    lines.push("}".to_string());
    lines.join("\n")
}

fn generate_decode(flat: &FlatSchema, message: &crate::types::FlatMessage) -> String {
    let lower = message.name.to_lowercase();
    let mut lines = Vec::new();

    lines.push(format!(
        "pub fn decode_{}(data: &[u8]) -> Result<{}, WireError> {{",
        lower,
        to_pascal_case(&message.name)
    ));
    lines.push(format!(
        "    let mut record = {}::default();",
        to_pascal_case(&message.name)
    ));
    lines.push("    for (tag, raw) in decode_many(data)? {".to_string());
    lines.push("        match tag {".to_string());

    for field in tag_ordered(message) {
        let ident = field_ident(field);
        match field_scalar(flat, field) {
            Some(scalar) => {
                let extract = format!(
                    "decode_scalar(&raw, ScalarType::{})?{}",
                    scalar_name(scalar),
                    extract_expr(scalar)
                );
                if field.rule == Rule::Repeated {
                    lines.push(format!(
                        "            {} => record.{}.get_or_insert_with(Vec::new).push({}),",
                        field.tag, ident, extract
                    ));
                } else {
                    lines.push(format!(
                        "            {} => record.{} = Some({}),",
                        field.tag, ident, extract
                    ));
                }
            }
            None => {
                let sub = field.type_name.to_lowercase();
                if field.rule == Rule::Repeated {
                    lines.push(format!(
                        "            {} => record.{}.get_or_insert_with(Vec::new).push(decode_{}(raw.bytes())?),",
                        field.tag, ident, sub
                    ));
                } else {
                    lines.push(format!(
                        "            {} => record.{} = Some(Box::new(decode_{}(raw.bytes())?)),",
                        field.tag, ident, sub
                    ));
                }
            }
        }
    }

    lines.push("            _ => {}".to_string());
    lines.push("        }".to_string());
    lines.push("    }".to_string());

    for field in tag_ordered(message) {
        let Some(scalar) = field_scalar(flat, field) else {
            continue;
        };
        if field.rule == Rule::Repeated {
            continue;
        }
        if let Some(default) = field.default.as_ref().and_then(|l| default_value_for(flat, field, l)) {
            let ident = field_ident(field);
            lines.push(format!(
                "    if record.{}.is_none() {{ record.{} = Some({}); }}",
                ident,
                ident,
                default_literal_expr(&default, scalar)
            ));
        }
    }

    lines.push("    Ok(record)".to_string());
    lines.push("}".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_schema;

    const SCHEMA: &str = "enum Mood { SAD = 0; HAPPY = 2; }\n\
                          message Person {\n\
                          optional int32 age = 2 [default = 0];\n\
                          required string name = 1;\n\
                          optional Mood mood = 3;\n\
                          }\n\
                          message Team { repeated Person members = 1; optional string label = 2 [default = \"none\"]; }";

    fn flat() -> crate::types::FlatSchema {
        compile_schema(SCHEMA).unwrap().0
    }

    #[test]
    fn layout_orders_fields_by_tag() {
        let layout = generate_layout(&flat());
        assert!(layout.contains("pub struct Person {"));
        assert!(layout.contains("pub struct Team {"));
        let name_at = layout.find("pub name: Option<String>,").unwrap();
        let age_at = layout.find("pub age: Option<i32>,").unwrap();
        assert!(name_at < age_at, "tag 1 must be declared before tag 2");
        // enum-typed fields lay out as plain integers
        assert!(layout.contains("pub mood: Option<i64>,"));
        assert!(layout.contains("pub members: Option<Vec<Box<Person>>>,"));
    }

    #[test]
    fn codec_exports_paired_routines() {
        let codec = generate_codec(&flat(), "person_layout");
        assert!(codec.contains("use super::person_layout::*;"));
        assert!(codec.contains("pub fn encode_person(record: &Person) -> Vec<u8> {"));
        assert!(codec.contains("pub fn decode_person(data: &[u8]) -> Result<Person, WireError> {"));
        assert!(codec.contains("pub fn encode_team(record: &Team) -> Vec<u8> {"));
        assert!(codec.contains("pub fn decode_team(data: &[u8]) -> Result<Team, WireError> {"));
    }

    #[test]
    fn codec_fills_defaults_after_the_fold() {
        let codec = generate_codec(&flat(), "person_layout");
        assert!(codec.contains("if record.age.is_none() { record.age = Some(0i32); }"));
        assert!(codec.contains("if record.label.is_none() { record.label = Some(\"none\".to_string()); }"));
    }

    #[test]
    fn codec_wraps_nested_messages_as_bytes() {
        let codec = generate_codec(&flat(), "person_layout");
        assert!(codec.contains("Value::Bytes(encode_person(v))"));
        assert!(codec.contains("push(decode_person(raw.bytes())?)"));
    }
}
