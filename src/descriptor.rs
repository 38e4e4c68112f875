//! JSON descriptors for rule graphs.
//!
//! ```json
//! {
//!   "type": "construct",
//!   "fields": {
//!     "id":         { "type": "number" },
//!     "first_name": { "type": "optional", "of": { "type": "string" } },
//!     "tags":       { "type": "array", "of": { "type": "string" } }
//!   }
//! }
//! ```
//!
//! Field order in the document is the declaration order of the construct.
//! A field name repeated inside one `"fields"` object is rejected.
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::{DeserializeOwned, Error as _, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::ir::SchemaNode;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `at` is the JSON path of the offending descriptor node, as far as
    /// serde could track it through tagged variants.
    #[error("invalid descriptor at {at}: {message}")]
    Invalid { at: String, message: String },
}

/// Serialized form of a [`SchemaNode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Descriptor {
    String,
    Number,
    Boolean,
    Construct {
        #[serde(default, deserialize_with = "unique_fields")]
        fields: IndexMap<String, Descriptor>,
    },
    Optional { of: Box<Descriptor> },
    Nullable { of: Box<Descriptor> },
    Array { of: Box<Descriptor> },
}

/// Like the stock `IndexMap` impl, but a repeated key is an error instead of
/// silently replacing the earlier entry.
fn unique_fields<'de, D>(de: D) -> Result<IndexMap<String, Descriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FieldsVisitor;

    impl<'de> Visitor<'de> for FieldsVisitor {
        type Value = IndexMap<String, Descriptor>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of field name to descriptor")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut fields = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(name) = map.next_key::<String>()? {
                if fields.contains_key(&name) {
                    return Err(A::Error::custom(format!("duplicate field name `{name}`")));
                }
                let node: Descriptor = map.next_value()?;
                fields.insert(name, node);
            }
            Ok(fields)
        }
    }

    de.deserialize_map(FieldsVisitor)
}

// -------------------- adapters: Descriptor <-> SchemaNode --------------------

impl From<Descriptor> for SchemaNode {
    fn from(d: Descriptor) -> Self {
        match d {
            Descriptor::String => SchemaNode::String,
            Descriptor::Number => SchemaNode::Number,
            Descriptor::Boolean => SchemaNode::Boolean,
            Descriptor::Construct { fields } => SchemaNode::Construct(
                fields.into_iter().map(|(k, v)| (k, SchemaNode::from(v))).collect(),
            ),
            Descriptor::Optional { of } => SchemaNode::Optional(Box::new((*of).into())),
            Descriptor::Nullable { of } => SchemaNode::Nullable(Box::new((*of).into())),
            Descriptor::Array { of } => SchemaNode::Array(Box::new((*of).into())),
        }
    }
}

impl From<&SchemaNode> for Descriptor {
    fn from(n: &SchemaNode) -> Self {
        match n {
            SchemaNode::String => Descriptor::String,
            SchemaNode::Number => Descriptor::Number,
            SchemaNode::Boolean => Descriptor::Boolean,
            SchemaNode::Construct(fields) => Descriptor::Construct {
                fields: fields.iter().map(|(k, v)| (k.clone(), Descriptor::from(v))).collect(),
            },
            SchemaNode::Optional(of) => Descriptor::Optional {
                of: Box::new(Descriptor::from(&**of)),
            },
            SchemaNode::Nullable(of) => Descriptor::Nullable {
                of: Box::new(Descriptor::from(&**of)),
            },
            SchemaNode::Array(of) => Descriptor::Array { of: Box::new(Descriptor::from(&**of)) },
        }
    }
}

// -------------------- loading --------------------

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DescriptorError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| DescriptorError::Invalid {
        at: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

pub fn descriptor_from_str(src: &str) -> Result<SchemaNode, DescriptorError> {
    let d: Descriptor = from_str_with_path(src)?;
    Ok(d.into())
}

pub fn load_descriptor(path: impl AsRef<Path>) -> Result<SchemaNode, DescriptorError> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let node = descriptor_from_str(&src)?;
    tracing::debug!(path = %path.display(), depth = node.depth(), "loaded descriptor");
    Ok(node)
}

pub fn to_descriptor(node: &SchemaNode) -> Descriptor {
    Descriptor::from(node)
}

pub fn to_descriptor_string(node: &SchemaNode) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&to_descriptor(node))
}
