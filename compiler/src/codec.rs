use crate::error::ProtoError;
use crate::layout::tag_ordered;
use crate::types::{FieldSpec, FlatSchema, Literal, Rule};
use crate::utils::quote;
use protolith_wire::{
    decode_many, decode_scalar, encode, RawValue, Record, ScalarType, Value, WireError, WireType,
};
use std::collections::HashMap;

/// What a field's declared type name resolved to at codec-construction time.
/// Resolution happens once, against the flat namespace, so the encode and
/// decode paths never have to inspect value shapes to find out whether a
/// field holds a nested message.
#[derive(Debug)]
enum FieldClass {
    Scalar(ScalarType),
    Enum(HashMap<String, i64>),
    Message(String),
}

#[derive(Debug)]
struct CodecField {
    tag: u32,
    rule: Rule,
    name: String,
    class: FieldClass,
    default: Option<Value>,
}

#[derive(Debug)]
struct CodecMessage {
    name: String,
    // ascending tag order, the same order the encoder walks
    fields: Vec<CodecField>,
    by_tag: HashMap<u32, usize>,
}

enum Entry {
    Raw(RawValue),
    Synthesized(Value),
}

/// The compiled, callable codecs for one schema: an encode routine and a
/// decode routine per message, built directly in memory from the flat schema.
#[derive(Debug)]
pub struct SchemaCodec {
    messages: HashMap<String, CodecMessage>,
}

impl SchemaCodec {
    pub fn new(flat: &FlatSchema) -> Result<SchemaCodec, ProtoError> {
        let mut messages = HashMap::new();

        for message in &flat.messages {
            let mut fields = Vec::new();
            let mut by_tag = HashMap::new();

            for spec in tag_ordered(message) {
                let class = classify(flat, spec)?;
                let default = spec
                    .default
                    .as_ref()
                    .and_then(|literal| default_value(literal, &class));
                by_tag.insert(spec.tag, fields.len());
                fields.push(CodecField {
                    tag: spec.tag,
                    rule: spec.rule,
                    name: spec.name.to_lowercase(),
                    class,
                    default,
                });
            }

            messages.insert(
                message.name.clone(),
                CodecMessage {
                    name: message.name.clone(),
                    fields,
                    by_tag,
                },
            );
        }

        Ok(SchemaCodec { messages })
    }

    fn message(&self, name: &str) -> Result<&CodecMessage, ProtoError> {
        self.messages
            .get(name)
            .ok_or_else(|| ProtoError::UnknownMessage(name.to_string()))
    }

    /// Serializes a record as the named message: one byte group per set
    /// field, concatenated in ascending tag order, no outer envelope. A field
    /// that is absent from the record emits nothing unless it declares an
    /// explicit default, in which case the default's wire encoding is
    /// emitted in its place.
    pub fn encode(&self, message: &str, record: &Record) -> Result<Vec<u8>, ProtoError> {
        let msg = self.message(message)?;
        let mut out = Vec::new();

        for field in &msg.fields {
            match record.get(&field.name) {
                None => {
                    if let Some(default) = &field.default {
                        out.extend(self.encode_entry(field, default)?);
                    }
                }
                Some(Value::Array(items)) if field.rule == Rule::Repeated => {
                    for item in items {
                        out.extend(self.encode_entry(field, item)?);
                    }
                }
                Some(value) => out.extend(self.encode_entry(field, value)?),
            }
        }

        Ok(out)
    }

    /// One wire entry for one value of one field. Nested messages recurse
    /// into their own encoder and come back wrapped as a length-delimited
    /// entry at the parent's tag.
    fn encode_entry(&self, field: &CodecField, value: &Value) -> Result<Vec<u8>, ProtoError> {
        // a raw byte run forces wire type bytes whatever the declared type
        if matches!(value, Value::Bytes(_))
            && !matches!(field.class, FieldClass::Scalar(ScalarType::Bytes))
        {
            return Ok(encode(field.tag, value, ScalarType::Bytes));
        }

        match &field.class {
            FieldClass::Scalar(scalar) => Ok(encode(field.tag, value, *scalar)),
            FieldClass::Enum(constants) => {
                let numeric = match value {
                    Value::Str(word) => Value::Int(constants.get(word).copied().unwrap_or(0)),
                    other => other.clone(),
                };
                Ok(encode(field.tag, &numeric, ScalarType::Enum))
            }
            FieldClass::Message(sub) => match value {
                Value::Message(record) => {
                    let body = self.encode(sub, record)?;
                    Ok(encode(field.tag, &Value::Bytes(body), ScalarType::Bytes))
                }
                // a non-record value on a message field has no encoding
                _ => Ok(Vec::new()),
            },
        }
    }

    /// Deserializes the named message. Raw entries are unwrapped first, then
    /// merged with one synthesized entry per defaulted field whose tag is not
    /// on the wire (a real entry always wins over a synthesized default), and
    /// the merged sequence is folded in ascending tag order into an
    /// initially-empty record. Entries whose tag matches no declared field
    /// are silently ignored. Repeated values accumulate in wire order.
    pub fn decode(&self, message: &str, data: &[u8]) -> Result<Record, ProtoError> {
        let msg = self.message(message)?;

        let mut merged: Vec<(u32, Entry)> = decode_many(data)?
            .into_iter()
            .map(|(tag, raw)| (tag, Entry::Raw(raw)))
            .collect();
        for field in &msg.fields {
            if let Some(default) = &field.default {
                if !merged.iter().any(|(tag, _)| *tag == field.tag) {
                    merged.push((field.tag, Entry::Synthesized(default.clone())));
                }
            }
        }
        // stable, so same-tag repeats keep their wire order
        merged.sort_by_key(|(tag, _)| *tag);

        let mut record = Record::new(&msg.name);
        for (tag, entry) in merged {
            let Some(&index) = msg.by_tag.get(&tag) else {
                continue;
            };
            let field = &msg.fields[index];

            let value = match entry {
                Entry::Synthesized(value) => value,
                Entry::Raw(raw) => match &field.class {
                    FieldClass::Message(sub) => match raw {
                        RawValue::LengthDelimited(bytes) => {
                            Value::Message(self.decode(sub, &bytes)?)
                        }
                        other => {
                            return Err(WireError::WireTypeMismatch {
                                expected: WireType::LengthDelimited,
                                actual: other.wire_type(),
                            }
                            .into())
                        }
                    },
                    FieldClass::Scalar(scalar) => decode_scalar(&raw, *scalar)?,
                    FieldClass::Enum(_) => decode_scalar(&raw, ScalarType::Enum)?,
                },
            };

            if field.rule == Rule::Repeated {
                record.append(&field.name, value);
            } else {
                record.set(&field.name, value);
            }
        }

        Ok(record)
    }
}

/// Resolves a field's declared default literal against the flat namespace,
/// producing the value kind decoding would produce for the same field.
pub(crate) fn default_value_for(
    flat: &FlatSchema,
    field: &FieldSpec,
    literal: &Literal,
) -> Option<Value> {
    let class = classify(flat, field).ok()?;
    default_value(literal, &class)
}

fn classify(flat: &FlatSchema, spec: &FieldSpec) -> Result<FieldClass, ProtoError> {
    if let Some(scalar) = ScalarType::from_name(&spec.type_name) {
        return Ok(FieldClass::Scalar(scalar));
    }
    if let Some(def) = flat.enum_def(&spec.type_name) {
        return Ok(FieldClass::Enum(
            def.values
                .iter()
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
        ));
    }
    if flat.is_message(&spec.type_name) {
        return Ok(FieldClass::Message(spec.type_name.clone()));
    }
    Err(ProtoError::Verify(format!(
        "the type {} is not defined for field {}",
        quote(&spec.type_name),
        quote(&spec.name)
    )))
}

/// Converts a declared default literal to the value kind decoding would
/// produce for the same field, so both paths converge. A literal that makes
/// no sense for the field's type behaves as "no default".
fn default_value(literal: &Literal, class: &FieldClass) -> Option<Value> {
    match class {
        FieldClass::Scalar(scalar) => scalar_default(*scalar, literal),
        FieldClass::Enum(constants) => match literal {
            Literal::Word(word) => constants.get(word).map(|value| Value::Int(*value)),
            Literal::Int(value) => Some(Value::Int(*value)),
            _ => None,
        },
        FieldClass::Message(_) => None,
    }
}

fn scalar_default(scalar: ScalarType, literal: &Literal) -> Option<Value> {
    match (scalar, literal) {
        (ScalarType::Double, Literal::Float(value)) => Some(Value::Double(*value)),
        (ScalarType::Double, Literal::Int(value)) => Some(Value::Double(*value as f64)),
        (ScalarType::Float, Literal::Float(value)) => Some(Value::Float(*value as f32)),
        (ScalarType::Float, Literal::Int(value)) => Some(Value::Float(*value as f32)),
        (
            ScalarType::Int32
            | ScalarType::Int64
            | ScalarType::SInt32
            | ScalarType::SInt64
            | ScalarType::SFixed32
            | ScalarType::SFixed64
            | ScalarType::Enum,
            Literal::Int(value),
        ) => Some(Value::Int(*value)),
        (
            ScalarType::UInt32 | ScalarType::UInt64 | ScalarType::Fixed32 | ScalarType::Fixed64,
            Literal::Int(value),
        ) if *value >= 0 => Some(Value::UInt(*value as u64)),
        (ScalarType::Bool, Literal::Bool(value)) => Some(Value::Bool(*value)),
        (ScalarType::Bool, Literal::Int(value)) => Some(Value::Bool(*value != 0)),
        (ScalarType::String, Literal::Str(value)) => Some(Value::Str(value.clone())),
        (ScalarType::Bytes, Literal::Str(value)) => Some(Value::Bytes(value.clone().into_bytes())),
        _ => None,
    }
}
