use crate::types::{FieldSpec, FlatMessage, FlatSchema};

/// A message's fields in ascending tag order, the canonical order used by
/// the layout declaration, the encoder, and all decode-side assignment.
pub fn tag_ordered(message: &FlatMessage) -> Vec<&FieldSpec> {
    let mut fields: Vec<&FieldSpec> = message.fields.iter().collect();
    fields.sort_by_key(|field| field.tag);
    fields
}

/// Emits, per message, the lower-cased field names sorted ascending by tag
/// number (not declaration order).
pub fn layout(flat: &FlatSchema) -> Vec<(String, Vec<String>)> {
    flat.messages
        .iter()
        .map(|message| {
            let fields = tag_ordered(message)
                .iter()
                .map(|field| field.name.to_lowercase())
                .collect();
            (message.name.clone(), fields)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::parser::parse;
    use crate::tokenizer::scan;

    fn layout_text(text: &str) -> Vec<(String, Vec<String>)> {
        layout(&flatten(&parse(&scan(text).unwrap())).unwrap())
    }

    #[test]
    fn fields_sort_by_tag_not_declaration_order() {
        let rows = layout_text(
            "message M { optional int32 third = 3; optional int32 first = 1; optional int32 second = 2; }",
        );
        assert_eq!(
            rows,
            vec![(
                "M".to_string(),
                vec!["first".to_string(), "second".to_string(), "third".to_string()],
            )]
        );
    }

    #[test]
    fn field_names_are_lower_cased() {
        let rows = layout_text("message M { required string clientID = 1; }");
        assert_eq!(rows[0].1, vec!["clientid".to_string()]);
    }
}
