//! Rule constructors.
//!
//! ```
//! use shape_guard::builder::*;
//!
//! let user = make_construct([
//!     ("id", make_number().into_node()),
//!     ("first_name", make_string().optional()),
//!     ("tags", make_string().array()),
//! ]);
//! assert_eq!(user.fields().map(|f| f.len()), Some(3));
//! ```
//!
//! Every constructor is total: it only assembles data. Composition operators
//! take the node they wrap by value, so the child inside a wrapper is always
//! the exact instance the caller built.
use std::ops::Deref;

use crate::ir::{Fields, SchemaNode};

/// A freshly built primitive or construct rule.
///
/// This is the only place the fluent `.optional()` / `.nullable()` /
/// `.array()` operators live; the wrappers they return are plain
/// [`SchemaNode`]s and compose further only through the free functions.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseNode(SchemaNode);

impl BaseNode {
    pub fn optional(self) -> SchemaNode {
        optional(self.0)
    }

    pub fn nullable(self) -> SchemaNode {
        nullable(self.0)
    }

    pub fn array(self) -> SchemaNode {
        array(self.0)
    }

    pub fn node(&self) -> &SchemaNode {
        &self.0
    }

    pub fn into_node(self) -> SchemaNode {
        self.0
    }
}

impl Deref for BaseNode {
    type Target = SchemaNode;

    fn deref(&self) -> &SchemaNode {
        &self.0
    }
}

impl From<BaseNode> for SchemaNode {
    fn from(base: BaseNode) -> Self {
        base.0
    }
}

pub fn make_string() -> BaseNode {
    BaseNode(SchemaNode::String)
}

pub fn make_number() -> BaseNode {
    BaseNode(SchemaNode::Number)
}

pub fn make_boolean() -> BaseNode {
    BaseNode(SchemaNode::Boolean)
}

/// Build a record rule from `(name, rule)` pairs, in declaration order.
///
/// Accepts a ready [`Fields`] map or any iterator of pairs. A repeated name
/// keeps its first position and its last rule.
pub fn make_construct<I, K, N>(fields: I) -> BaseNode
where
    I: IntoIterator<Item = (K, N)>,
    K: Into<String>,
    N: Into<SchemaNode>,
{
    let fields: Fields = fields
        .into_iter()
        .map(|(name, node)| (name.into(), node.into()))
        .collect();
    BaseNode(SchemaNode::Construct(fields))
}

pub fn optional(node: impl Into<SchemaNode>) -> SchemaNode {
    SchemaNode::Optional(Box::new(node.into()))
}

pub fn nullable(node: impl Into<SchemaNode>) -> SchemaNode {
    SchemaNode::Nullable(Box::new(node.into()))
}

pub fn array(node: impl Into<SchemaNode>) -> SchemaNode {
    SchemaNode::Array(Box::new(node.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Kind;

    #[test]
    fn primitives_have_no_children() {
        for (base, kind) in [
            (make_string(), Kind::String),
            (make_number(), Kind::Number),
            (make_boolean(), Kind::Boolean),
        ] {
            assert_eq!(base.kind(), kind);
            assert!(base.child().is_none());
            assert!(base.fields().is_none());
        }
    }

    #[test]
    fn fluent_forms_wrap_the_receiver() {
        let inner = make_construct([("city", make_string())]);
        let expected = inner.node().clone();
        let wrapped = inner.nullable();
        assert_eq!(wrapped.kind(), Kind::Nullable);
        assert_eq!(wrapped.child(), Some(&expected));

        assert_eq!(make_number().optional(), optional(make_number()));
        assert_eq!(make_boolean().array(), array(SchemaNode::Boolean));
    }

    #[test]
    fn wrappers_compose_directly() {
        let n = optional(nullable(make_string()));
        assert_eq!(n.kind(), Kind::Optional);
        assert_eq!(n.child().map(SchemaNode::kind), Some(Kind::Nullable));
        assert_eq!(
            n.child().and_then(SchemaNode::child).map(SchemaNode::kind),
            Some(Kind::String),
        );
    }

    #[test]
    fn construct_keeps_declaration_order() {
        let c = make_construct([
            ("zeta", make_number().into_node()),
            ("alpha", make_string().into_node()),
            ("mid", make_boolean().optional()),
        ]);
        let names: Vec<&str> = c.fields().unwrap().keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn construct_accepts_a_prebuilt_map() {
        let mut fields = Fields::new();
        fields.insert("id".into(), SchemaNode::Number);
        let c = make_construct(fields.clone());
        assert_eq!(c.into_node(), SchemaNode::Construct(fields));
    }

    #[test]
    fn repeated_field_keeps_first_slot_last_rule() {
        let c = make_construct([
            ("a", SchemaNode::String),
            ("b", SchemaNode::Number),
            ("a", SchemaNode::Boolean),
        ]);
        let fields = c.fields().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get_index(0), Some((&"a".to_string(), &SchemaNode::Boolean)));
    }
}
