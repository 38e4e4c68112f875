use crate::ir::SchemaNode;

/// Compact, TypeScript-flavoured rendering of what `parse` can return.
///
/// `{ id: number; first_name?: string }`, `string | null`, `(number | null)[]`.
pub fn infer_shape(node: &SchemaNode) -> String {
    match node {
        SchemaNode::String => "string".to_string(),
        SchemaNode::Number => "number".to_string(),
        SchemaNode::Boolean => "boolean".to_string(),
        SchemaNode::Construct(fields) if fields.is_empty() => "{}".to_string(),
        SchemaNode::Construct(fields) => {
            let entries: Vec<String> = fields
                .iter()
                .map(|(name, child)| {
                    let key = property_key(name);
                    if child.admits_missing() {
                        format!("{key}?: {}", present_shape(child))
                    } else {
                        format!("{key}: {}", infer_shape(child))
                    }
                })
                .collect();
            format!("{{ {} }}", entries.join("; "))
        }
        SchemaNode::Nullable(inner) => format!("{} | null", infer_shape(inner)),
        SchemaNode::Optional(inner) => format!("{} | undefined", infer_shape(inner)),
        SchemaNode::Array(item) => {
            let inner = infer_shape(item);
            if item.is_wrapper() && !matches!(&**item, SchemaNode::Array(_)) {
                format!("({inner})[]")
            } else {
                format!("{inner}[]")
            }
        }
    }
}

/// Shape of a key marked `?:`, where absence is already spelled by the `?`.
fn present_shape(node: &SchemaNode) -> String {
    match node {
        SchemaNode::Optional(inner) => present_shape(inner),
        SchemaNode::Nullable(inner) => format!("{} | null", present_shape(inner)),
        other => infer_shape(other),
    }
}

fn property_key(name: &str) -> String {
    let plain = name.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if plain {
        name.to_string()
    } else {
        format!("{name:?}")
    }
}
