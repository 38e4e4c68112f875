//! Mismatch reports produced by validation.
//!
//! A [`ValidationError`] is one flat record: what went wrong (`code`), what the
//! schema wanted (`expected`), what the input held (`received`) and where.
//! A [`ValidationException`] is the ordered list of every such record from one
//! top-level call; it is the only way a failed parse reports back.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// CODES & KINDS
// ————————————————————————————————————————————————————————————————————————————

/// Classification of a single mismatch.
///
/// Marked non-exhaustive so refinement kinds can be added later without
/// breaking downstream `match`es.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// primitive kind mismatch
    InvalidType,
    /// optional rule given something that is neither missing nor acceptable
    UnexpectedAbsence,
    /// nullable rule given something that is neither null nor acceptable
    UnexpectedNull,
    /// construct rule given a non-object
    NotAStructure,
    /// array rule given a non-sequence
    NotASequence,
    /// schema nesting went past the validator's depth cap
    DepthExceeded,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidType => "invalid_type",
            Self::UnexpectedAbsence => "unexpected_absence",
            Self::UnexpectedNull => "unexpected_null",
            Self::NotAStructure => "not_a_structure",
            Self::NotASequence => "not_a_sequence",
            Self::DepthExceeded => "depth_exceeded",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime kind of an untyped value, including the two absence states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
    /// the key was not supplied at all
    Missing,
}

impl BasicKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOCATIONS
// ————————————————————————————————————————————————————————————————————————————

/// One step from the validated root down to an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Render a path as `address.city`, `tags[2]`, `[0].name`; the root is `$`.
pub fn render_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "$".to_string();
    }
    let mut out = String::new();
    for seg in path {
        match seg {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Index(i) => {
                out.push_str(&format!("[{i}]"));
            }
        }
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// A single mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub expected: BasicKind,
    pub received: BasicKind,
    /// empty at the root
    #[serde(default)]
    pub path: Vec<PathSegment>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, expected: BasicKind, received: BasicKind) -> Self {
        Self { code, expected, received, path: Vec::new() }
    }

    pub fn at(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    pub fn path_string(&self) -> String {
        render_path(&self.path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (expected {}, received {})",
            self.path_string(),
            self.code,
            self.expected,
            self.received,
        )
    }
}

/// Every mismatch from one validation call, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", render_list(.errors))]
#[serde(transparent)]
pub struct ValidationException {
    errors: Vec<ValidationError>,
}

fn render_list(errors: &[ValidationError]) -> String {
    let mut out = format!("validation failed with {} error(s):", errors.len());
    for e in errors {
        out.push_str(&format!("\n  {e}"));
    }
    out
}

impl ValidationException {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.errors
    }

    /// First error recorded at exactly `path` (rendered form), if any.
    pub fn find(&self, path: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.path_string() == path)
    }
}

impl IntoIterator for ValidationException {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationException {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
