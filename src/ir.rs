// Strongly-typed rule IR. Untyped data only shows up as validation input/output.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::BasicKind;

/// Declared fields of a construct, kept in declaration order.
///
/// `IndexMap` equality ignores order, so two constructs declaring the same
/// fields in a different order compare equal.
pub type Fields = IndexMap<String, SchemaNode>;

/// One validation rule. Immutable once built; share freely across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    String,
    Number,
    Boolean,
    Construct(Fields),
    Optional(Box<SchemaNode>), // missing allowed, null is not
    Nullable(Box<SchemaNode>), // null allowed, missing is not
    Array(Box<SchemaNode>),
}

/// Tag of a [`SchemaNode`] without its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Construct,
    Optional,
    Nullable,
    Array,
}

impl SchemaNode {
    pub fn kind(&self) -> Kind {
        match self {
            Self::String => Kind::String,
            Self::Number => Kind::Number,
            Self::Boolean => Kind::Boolean,
            Self::Construct(_) => Kind::Construct,
            Self::Optional(_) => Kind::Optional,
            Self::Nullable(_) => Kind::Nullable,
            Self::Array(_) => Kind::Array,
        }
    }

    /// The basic kind a present, non-null input must have to satisfy this rule.
    /// Wrappers that only relax absence/null report their child's kind.
    pub fn expected(&self) -> BasicKind {
        match self {
            Self::String => BasicKind::String,
            Self::Number => BasicKind::Number,
            Self::Boolean => BasicKind::Boolean,
            Self::Construct(_) => BasicKind::Object,
            Self::Array(_) => BasicKind::Array,
            Self::Optional(child) | Self::Nullable(child) => child.expected(),
        }
    }

    /// The wrapped rule of Optional/Nullable/Array.
    pub fn child(&self) -> Option<&SchemaNode> {
        match self {
            Self::Optional(child) | Self::Nullable(child) | Self::Array(child) => Some(child),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Self::Construct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::String | Self::Number | Self::Boolean)
    }

    pub fn is_wrapper(&self) -> bool {
        self.child().is_some()
    }

    /// Whether a missing input can parse to absence. Nullable hands a missing
    /// input on to its child, so `nullable(optional(s))` admits it too.
    pub fn admits_missing(&self) -> bool {
        match self {
            Self::Optional(_) => true,
            Self::Nullable(child) => child.admits_missing(),
            _ => false,
        }
    }

    /// Whether `null` can parse successfully, directly or through an Optional.
    pub fn admits_null(&self) -> bool {
        match self {
            Self::Nullable(_) => true,
            Self::Optional(child) => child.admits_null(),
            _ => false,
        }
    }

    /// Nesting depth of the rule graph; a primitive is 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::String | Self::Number | Self::Boolean => 1,
            Self::Construct(fields) => {
                1 + fields.values().map(SchemaNode::depth).max().unwrap_or(0)
            }
            Self::Optional(child) | Self::Nullable(child) | Self::Array(child) => {
                1 + child.depth()
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INPUT / OUTPUT
// ————————————————————————————————————————————————————————————————————————————

/// Tri-state view of an untyped value: a JSON document only has one native
/// absence (`null`), so "key not supplied" is carried separately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input<'a> {
    Present(&'a Value),
    Null,
    Missing,
}

impl<'a> Input<'a> {
    /// Look up `name` on a record.
    pub fn field(map: &'a Map<String, Value>, name: &str) -> Self {
        match map.get(name) {
            None => Self::Missing,
            Some(value) => Self::from(value),
        }
    }

    pub fn kind(&self) -> BasicKind {
        match self {
            Self::Present(value) => BasicKind::of(value),
            Self::Null => BasicKind::Null,
            Self::Missing => BasicKind::Missing,
        }
    }
}

impl<'a> From<&'a Value> for Input<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Self::Null,
            other => Self::Present(other),
        }
    }
}

impl<'a> From<Option<&'a Value>> for Input<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map_or(Self::Missing, Self::from)
    }
}

/// Successful validation output.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// An optional rule matched a missing input.
    Absent,
    Value(Value),
}

impl Parsed {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Absent => None,
            Self::Value(value) => Some(value),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Absent => None,
            Self::Value(value) => Some(value),
        }
    }

    /// Absence has no JSON encoding; it is written out as `null`.
    pub fn into_json(self) -> Value {
        self.into_value().unwrap_or(Value::Null)
    }
}
