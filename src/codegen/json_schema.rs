use serde_json::{json, Map, Value};

use crate::ir::SchemaNode;

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// JSON Schema for one rule (no `$schema` header).
pub fn json_schema(node: &SchemaNode) -> Value {
    match node {
        SchemaNode::String => json!({ "type": "string" }),
        SchemaNode::Number => json!({ "type": "number" }),
        SchemaNode::Boolean => json!({ "type": "boolean" }),

        SchemaNode::Construct(fields) => {
            let mut props = Map::new();
            let mut required = Vec::new();
            for (name, child) in fields {
                // a key that may be missing is not required; Optional layers
                // describe themselves as their child
                if !child.admits_missing() {
                    required.push(Value::from(name.clone()));
                }
                props.insert(name.clone(), json_schema(child));
            }
            let mut o = json!({
                "type": "object",
                "properties": props,
                // undeclared fields are tolerated on input and dropped on output
                "additionalProperties": true,
            });
            if !required.is_empty() {
                o["required"] = Value::Array(required);
            }
            o
        }

        SchemaNode::Nullable(inner) => {
            json!({ "oneOf": [json_schema(inner), { "type": "null" }] })
        }

        // absence has no JSON Schema form outside a record
        SchemaNode::Optional(inner) => json_schema(inner),

        SchemaNode::Array(item) => json!({
            "type": "array",
            "items": json_schema(item),
        }),
    }
}

/// Top-level document with a `$schema` header and optional `title`.
pub fn json_schema_document(node: &SchemaNode, title: Option<&str>) -> Value {
    let mut doc = Map::new();
    doc.insert("$schema".into(), Value::from(DRAFT));
    if let Some(title) = title {
        doc.insert("title".into(), Value::from(title));
    }
    if let Value::Object(body) = json_schema(node) {
        doc.extend(body);
    }
    Value::Object(doc)
}
