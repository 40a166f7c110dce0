use crate::tokenizer::{Keyword, Token, TokenKind};
use crate::types::{Decl, EnumSpec, FieldSpec, Literal, MessageSpec, Rule, SchemaTree};

/// Parses a token sequence into a schema tree. Recursive descent with no
/// error recovery: when no production matches at the current position, the
/// catch-all keeps the raw token as an `Unrecognized` leaf and moves on one
/// token. This is how `package`, `import`, `option`, `service`, `rpc`,
/// `extend`, and `extensions` declarations are tolerated without being acted
/// upon.
pub fn parse(tokens: &[Token]) -> SchemaTree {
    let mut index = 0;
    parse_block(tokens, &mut index, false)
}

/// Parses declarations until the closing `}` of the enclosing block (or the
/// end of input at the top level). Block close is the only structural
/// terminator; it returns control to the caller with the remaining tokens.
fn parse_block(tokens: &[Token], index: &mut usize, nested: bool) -> Vec<Decl> {
    let mut decls = Vec::new();

    while *index < tokens.len() {
        match &tokens[*index].kind {
            // the end-of-input marker is a no-op to be skipped
            TokenKind::Eof => {
                *index += 1;
            }
            TokenKind::Punct('}') if nested => {
                *index += 1;
                return decls;
            }
            TokenKind::Keyword(Keyword::Message) => match parse_message(tokens, index) {
                Some(message) => decls.push(Decl::Message(message)),
                None => decls.push(catch_all(tokens, index)),
            },
            TokenKind::Keyword(Keyword::Enum) => match parse_enum(tokens, index) {
                Some(spec) => decls.push(Decl::Enum(spec)),
                None => decls.push(catch_all(tokens, index)),
            },
            TokenKind::Keyword(Keyword::Required | Keyword::Optional | Keyword::Repeated) => {
                match parse_field(tokens, index) {
                    Some(field) => decls.push(Decl::Field(field)),
                    None => decls.push(catch_all(tokens, index)),
                }
            }
            _ => decls.push(catch_all(tokens, index)),
        }
    }

    decls
}

fn catch_all(tokens: &[Token], index: &mut usize) -> Decl {
    let leaf = Decl::Unrecognized(tokens[*index].clone());
    *index += 1;
    leaf
}

fn bareword(tokens: &[Token], at: usize) -> Option<&str> {
    match tokens.get(at).map(|t| &t.kind) {
        Some(TokenKind::Bareword(word)) => Some(word.as_str()),
        _ => None,
    }
}

fn punct(tokens: &[Token], at: usize, c: char) -> bool {
    matches!(tokens.get(at).map(|t| &t.kind), Some(TokenKind::Punct(p)) if *p == c)
}

fn integer(tokens: &[Token], at: usize) -> Option<i64> {
    match tokens.get(at).map(|t| &t.kind) {
        Some(TokenKind::Integer(value)) => Some(*value),
        _ => None,
    }
}

fn literal(tokens: &[Token], at: usize) -> Option<Literal> {
    match tokens.get(at).map(|t| &t.kind) {
        Some(TokenKind::Integer(value)) => Some(Literal::Int(*value)),
        Some(TokenKind::Float(value)) => Some(Literal::Float(*value)),
        Some(TokenKind::StrLit(value)) => Some(Literal::Str(value.clone())),
        Some(TokenKind::Keyword(Keyword::True)) => Some(Literal::Bool(true)),
        Some(TokenKind::Keyword(Keyword::False)) => Some(Literal::Bool(false)),
        Some(TokenKind::Bareword(word)) => Some(Literal::Word(word.clone())),
        _ => None,
    }
}

/// `message Name { ... }`. The block recurses through `parse_block`, which
/// consumes the closing `}`.
fn parse_message(tokens: &[Token], index: &mut usize) -> Option<MessageSpec> {
    let name = bareword(tokens, *index + 1)?;
    if !punct(tokens, *index + 2, '{') {
        return None;
    }
    let name = name.to_string();
    *index += 3;
    let items = parse_block(tokens, index, true);
    Some(MessageSpec { name, items })
}

/// `enum Name { name = value ; ... }`. Entries that do not match the pair
/// production are skipped; the block still closes on `}`.
fn parse_enum(tokens: &[Token], index: &mut usize) -> Option<EnumSpec> {
    let name = bareword(tokens, *index + 1)?;
    if !punct(tokens, *index + 2, '{') {
        return None;
    }
    let name = name.to_string();
    *index += 3;

    let mut values = Vec::new();
    while *index < tokens.len() {
        if punct(tokens, *index, '}') {
            *index += 1;
            break;
        }
        if let (Some(constant), true, Some(value), true) = (
            bareword(tokens, *index),
            punct(tokens, *index + 1, '='),
            integer(tokens, *index + 2),
            punct(tokens, *index + 3, ';'),
        ) {
            values.push((constant.to_string(), value));
            *index += 4;
        } else {
            *index += 1;
        }
    }

    Some(EnumSpec { name, values })
}

/// `Rule Type Name = Tag ;` or `Rule Type Name = Tag [default = Literal] ;`
/// (eleven tokens of lookahead in the long form). Any mismatch inside the
/// window rejects the whole production.
fn parse_field(tokens: &[Token], index: &mut usize) -> Option<FieldSpec> {
    let rule = match tokens[*index].kind {
        TokenKind::Keyword(Keyword::Required) => Rule::Required,
        TokenKind::Keyword(Keyword::Optional) => Rule::Optional,
        TokenKind::Keyword(Keyword::Repeated) => Rule::Repeated,
        _ => return None,
    };

    let type_name = bareword(tokens, *index + 1)?;
    let name = bareword(tokens, *index + 2)?;
    if !punct(tokens, *index + 3, '=') {
        return None;
    }
    let tag = integer(tokens, *index + 4)?;
    let tag = u32::try_from(tag).ok()?;

    if punct(tokens, *index + 5, ';') {
        let field = FieldSpec {
            tag,
            rule,
            type_name: type_name.to_string(),
            name: name.to_string(),
            default: None,
        };
        *index += 6;
        return Some(field);
    }

    if punct(tokens, *index + 5, '[')
        && bareword(tokens, *index + 6) == Some("default")
        && punct(tokens, *index + 7, '=')
    {
        let default = literal(tokens, *index + 8)?;
        if punct(tokens, *index + 9, ']') && punct(tokens, *index + 10, ';') {
            let field = FieldSpec {
                tag,
                rule,
                type_name: type_name.to_string(),
                name: name.to_string(),
                default: Some(default),
            };
            *index += 11;
            return Some(field);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::scan;

    fn parse_text(text: &str) -> SchemaTree {
        parse(&scan(text).unwrap())
    }

    #[test]
    fn parse_message_with_fields() {
        let tree = parse_text(
            "message Person {\n  required string name = 1;\n  optional int32 age = 2 [default = 0];\n}",
        );
        assert_eq!(tree.len(), 1);
        let Decl::Message(message) = &tree[0] else {
            panic!("expected a message, got {:?}", tree[0]);
        };
        assert_eq!(message.name, "Person");
        assert_eq!(
            message.items,
            vec![
                Decl::Field(FieldSpec {
                    tag: 1,
                    rule: Rule::Required,
                    type_name: "string".to_string(),
                    name: "name".to_string(),
                    default: None,
                }),
                Decl::Field(FieldSpec {
                    tag: 2,
                    rule: Rule::Optional,
                    type_name: "int32".to_string(),
                    name: "age".to_string(),
                    default: Some(Literal::Int(0)),
                }),
            ]
        );
    }

    #[test]
    fn parse_default_literals() {
        let tree = parse_text(
            "message M {\n\
             optional bool a = 1 [default = true];\n\
             optional string b = 2 [default = \"hi\"];\n\
             optional double c = 3 [default = 1.5];\n\
             optional Mood d = 4 [default = HAPPY];\n\
             }",
        );
        let Decl::Message(message) = &tree[0] else {
            panic!("expected a message");
        };
        let defaults: Vec<_> = message
            .items
            .iter()
            .filter_map(|item| match item {
                Decl::Field(f) => f.default.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(
            defaults,
            vec![
                Literal::Bool(true),
                Literal::Str("hi".to_string()),
                Literal::Float(1.5),
                Literal::Word("HAPPY".to_string()),
            ]
        );
    }

    #[test]
    fn parse_enum_pairs() {
        let tree = parse_text("enum Mood { SAD = 0; HAPPY = 1; }");
        assert_eq!(
            tree,
            vec![Decl::Enum(EnumSpec {
                name: "Mood".to_string(),
                values: vec![("SAD".to_string(), 0), ("HAPPY".to_string(), 1)],
            })]
        );
    }

    #[test]
    fn parse_nested_message() {
        let tree = parse_text(
            "message Outer { required int32 id = 1; message Inner { required int32 x = 1; } }",
        );
        let Decl::Message(outer) = &tree[0] else {
            panic!("expected a message");
        };
        assert_eq!(outer.items.len(), 2);
        assert!(matches!(&outer.items[0], Decl::Field(f) if f.name == "id"));
        assert!(matches!(&outer.items[1], Decl::Message(inner) if inner.name == "Inner"));
    }

    #[test]
    fn unmatched_tokens_become_inert_leaves() {
        let tree = parse_text("package demo;\nmessage M { required int32 x = 1; }");
        // package + demo + ; pass through untouched, then the message parses
        assert_eq!(tree.len(), 4);
        assert!(matches!(&tree[0], Decl::Unrecognized(t) if t.kind == TokenKind::Keyword(Keyword::Package)));
        assert!(matches!(&tree[1], Decl::Unrecognized(t) if t.kind == TokenKind::Bareword("demo".to_string())));
        assert!(matches!(&tree[2], Decl::Unrecognized(t) if t.kind == TokenKind::Punct(';')));
        assert!(matches!(&tree[3], Decl::Message(m) if m.name == "M"));
    }

    #[test]
    fn malformed_field_yields_no_field() {
        // missing tag number: every token of the group falls through
        let tree = parse_text("message M { required int32 x = ; }");
        let Decl::Message(message) = &tree[0] else {
            panic!("expected a message");
        };
        assert!(message
            .items
            .iter()
            .all(|item| matches!(item, Decl::Unrecognized(_))));
    }

    #[test]
    fn unknown_options_inside_field_are_not_fields() {
        let tree = parse_text("message M { repeated int32 xs = 1 [packed = true]; }");
        let Decl::Message(message) = &tree[0] else {
            panic!("expected a message");
        };
        assert!(message
            .items
            .iter()
            .all(|item| matches!(item, Decl::Unrecognized(_))));
    }

    #[test]
    fn service_blocks_are_tolerated() {
        let tree = parse_text(
            "service Search { rpc Find (Req) returns (Rep); }\nmessage M { required int32 x = 1; }",
        );
        assert!(tree
            .iter()
            .any(|decl| matches!(decl, Decl::Message(m) if m.name == "M")));
        assert!(tree
            .iter()
            .any(|decl| matches!(decl, Decl::Unrecognized(t) if t.kind == TokenKind::Keyword(Keyword::Service))));
    }

    #[test]
    fn enum_skips_entries_that_do_not_match() {
        let tree = parse_text("enum E { option allow_alias = true; A = 1; }");
        assert_eq!(
            tree,
            vec![Decl::Enum(EnumSpec {
                name: "E".to_string(),
                values: vec![("A".to_string(), 1)],
            })]
        );
    }
}
