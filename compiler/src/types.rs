use crate::tokenizer::Token;
use serde::Serialize;

/// Per-field cardinality rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rule {
    Required,
    Optional,
    Repeated,
}

/// A default literal as written in the schema. `Word` covers enum-constant
/// references such as `[default = ROUND]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Word(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub tag: u32,
    pub rule: Rule,
    pub type_name: String,
    pub name: String,
    pub default: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumSpec {
    pub name: String,
    pub values: Vec<(String, i64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSpec {
    pub name: String,
    pub items: Vec<Decl>,
}

/// One parsed declaration. Token groups that match no production are kept
/// verbatim as `Unrecognized` leaves so surrounding block structure still
/// parses; they produce no generated code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decl {
    Message(MessageSpec),
    Enum(EnumSpec),
    Field(FieldSpec),
    Unrecognized(Token),
}

/// The schema as parsed, before flattening: top-level declarations in source
/// order, nesting intact.
pub type SchemaTree = Vec<Decl>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatMessage {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

/// The message/field table after nesting has been erased. Every message,
/// top-level or formerly nested, is reachable by its own name in one flat
/// namespace. Hoisted enums ride along so codegen can classify enum-typed
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatSchema {
    pub messages: Vec<FlatMessage>,
    pub enums: Vec<EnumSpec>,
}

impl FlatSchema {
    pub fn message(&self, name: &str) -> Option<&FlatMessage> {
        self.messages.iter().find(|m| m.name == name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumSpec> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn is_message(&self, name: &str) -> bool {
        self.message(name).is_some()
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enum_def(name).is_some()
    }
}
