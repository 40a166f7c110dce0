use crate::error::ProtoError;
use crate::types::FlatSchema;
use crate::utils::quote;
use protolith_wire::ScalarType;

/// Returns `Ok(())` if verification passed, or `Err(ProtoError::Verify(_))`
/// otherwise. Runs after flattening, so every declared type can be checked
/// against the full flat namespace.
pub fn verify(flat: &FlatSchema) -> Result<(), ProtoError> {
    for message in &flat.messages {
        let mut tags: Vec<u32> = Vec::new();
        let mut names: Vec<String> = Vec::new();

        for field in &message.fields {
            if field.tag == 0 {
                return Err(ProtoError::Verify(format!(
                    "the tag for field {} in message {} must be positive",
                    quote(&field.name),
                    quote(&message.name)
                )));
            }
            if tags.contains(&field.tag) {
                return Err(ProtoError::Verify(format!(
                    "the tag {} in message {} is used twice",
                    field.tag,
                    quote(&message.name)
                )));
            }
            tags.push(field.tag);

            let lowered = field.name.to_lowercase();
            if names.contains(&lowered) {
                return Err(ProtoError::Verify(format!(
                    "the field {} in message {} is defined twice",
                    quote(&lowered),
                    quote(&message.name)
                )));
            }
            names.push(lowered);

            let known = ScalarType::from_name(&field.type_name).is_some()
                || flat.is_enum(&field.type_name)
                || flat.is_message(&field.type_name);
            if !known {
                return Err(ProtoError::Verify(format!(
                    "the type {} is not defined for field {}",
                    quote(&field.type_name),
                    quote(&field.name)
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::parser::parse;
    use crate::tokenizer::scan;

    fn verify_text(text: &str) -> Result<(), ProtoError> {
        verify(&flatten(&parse(&scan(text).unwrap())).unwrap())
    }

    #[test]
    fn accepts_well_formed_schemas() {
        verify_text(
            "message Person { required string name = 1; optional int32 age = 2; }\n\
             message Book { required Person author = 1; repeated Person readers = 2; }",
        )
        .unwrap();
    }

    #[test]
    fn rejects_duplicate_tags() {
        let err =
            verify_text("message M { required int32 a = 1; required int32 b = 1; }").unwrap_err();
        assert!(matches!(err, ProtoError::Verify(msg) if msg.contains("used twice")));
    }

    #[test]
    fn rejects_zero_tags() {
        let err = verify_text("message M { required int32 a = 0; }").unwrap_err();
        assert!(matches!(err, ProtoError::Verify(msg) if msg.contains("must be positive")));
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let err =
            verify_text("message M { required int32 ab = 1; required int32 AB = 2; }").unwrap_err();
        assert!(matches!(err, ProtoError::Verify(msg) if msg.contains("defined twice")));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = verify_text("message M { required Missing x = 1; }").unwrap_err();
        assert!(matches!(err, ProtoError::Verify(msg) if msg.contains("not defined")));
    }

    #[test]
    fn enum_typed_fields_resolve() {
        verify_text("enum Mood { SAD = 0; }\nmessage M { optional Mood mood = 1; }").unwrap();
    }
}
