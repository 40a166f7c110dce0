use crate::error::ProtoError;
use crate::types::{Decl, FlatMessage, FlatSchema, SchemaTree};
use std::collections::HashSet;

/// Collects every message in the tree, depth-first, into one flat namespace.
/// A nested message is hoisted to its own entry reachable by its own name;
/// its fields are never merged into the parent. Enum declarations contribute
/// no fields, only their constants for enum-typed-field classification.
/// Messages and enums share the namespace, and a name landing in it twice is
/// a `DuplicateName` error rather than a silent overwrite.
pub fn flatten(tree: &SchemaTree) -> Result<FlatSchema, ProtoError> {
    let mut flat = FlatSchema::default();
    let mut seen: HashSet<String> = HashSet::new();

    for decl in tree {
        collect(decl, &mut flat, &mut seen)?;
    }

    Ok(flat)
}

fn collect(
    decl: &Decl,
    flat: &mut FlatSchema,
    seen: &mut HashSet<String>,
) -> Result<(), ProtoError> {
    match decl {
        Decl::Message(message) => {
            if !seen.insert(message.name.clone()) {
                return Err(ProtoError::DuplicateName(message.name.clone()));
            }

            let fields = message
                .items
                .iter()
                .filter_map(|item| match item {
                    Decl::Field(field) => Some(field.clone()),
                    _ => None,
                })
                .collect();
            flat.messages.push(FlatMessage {
                name: message.name.clone(),
                fields,
            });

            for item in &message.items {
                if matches!(item, Decl::Message(_) | Decl::Enum(_)) {
                    collect(item, flat, seen)?;
                }
            }
        }
        Decl::Enum(spec) => {
            if !seen.insert(spec.name.clone()) {
                return Err(ProtoError::DuplicateName(spec.name.clone()));
            }
            flat.enums.push(spec.clone());
        }
        // stray fields and unrecognized leaves contribute nothing
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::tokenizer::scan;

    fn flatten_text(text: &str) -> Result<FlatSchema, ProtoError> {
        flatten(&parse(&scan(text).unwrap()))
    }

    #[test]
    fn hoists_nested_messages() {
        let flat = flatten_text(
            "message Outer {\n\
             required int32 id = 1;\n\
             message Inner { required int32 x = 1; message Deep { required int32 y = 1; } }\n\
             }",
        )
        .unwrap();

        let names: Vec<_> = flat.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "Inner", "Deep"]);
        assert_eq!(flat.message("Outer").unwrap().fields.len(), 1);
        assert_eq!(flat.message("Inner").unwrap().fields.len(), 1);
        assert_eq!(flat.message("Deep").unwrap().fields.len(), 1);
    }

    #[test]
    fn enums_contribute_no_fields() {
        let flat = flatten_text(
            "message M { required int32 x = 1; enum Mood { SAD = 0; HAPPY = 1; } }",
        )
        .unwrap();
        assert_eq!(flat.message("M").unwrap().fields.len(), 1);
        assert_eq!(flat.enum_def("Mood").unwrap().values.len(), 2);
        assert!(flat.is_enum("Mood"));
        assert!(!flat.is_message("Mood"));
    }

    #[test]
    fn duplicate_names_are_detected() {
        let err = flatten_text("message M { required int32 x = 1; }\nmessage M { }").unwrap_err();
        assert!(matches!(err, ProtoError::DuplicateName(name) if name == "M"));

        let err =
            flatten_text("message Outer { message Inner { } }\nmessage Inner { }").unwrap_err();
        assert!(matches!(err, ProtoError::DuplicateName(name) if name == "Inner"));
    }

    #[test]
    fn inert_leaves_are_dropped() {
        let flat = flatten_text("package demo;\nmessage M { required int32 x = 1; }").unwrap();
        assert_eq!(flat.messages.len(), 1);
        assert_eq!(flat.message("M").unwrap().fields.len(), 1);
    }
}
