//! Recursive validation of untyped input against a [`SchemaNode`].
//!
//! `parse` either hands back a value shaped exactly like the rule, or a
//! [`ValidationException`] listing every mismatch found. Records and arrays
//! keep going after a bad field/element so one call surfaces everything.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BasicKind, ErrorCode, PathSegment, ValidationError, ValidationException};
use crate::ir::{Fields, Input, Parsed, SchemaNode};

/// Schema levels a single parse may descend before giving up.
pub const DEFAULT_MAX_DEPTH: usize = 64;

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub max_depth: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Stateless apart from its config; one instance can serve any number of
/// threads.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self::new(ValidatorConfig { max_depth })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn parse(
        &self,
        node: &SchemaNode,
        input: Input<'_>,
    ) -> Result<Parsed, ValidationException> {
        let mut walk = Walk::new(self.config.max_depth);
        let outcome = walk.visit(node, input, 1);
        match outcome {
            Some(parsed) if walk.errors.is_empty() => {
                tracing::trace!(kind = ?node.kind(), "parse ok");
                Ok(parsed)
            }
            _ => {
                tracing::trace!(kind = ?node.kind(), errors = walk.errors.len(), "parse failed");
                Err(ValidationException::new(walk.errors))
            }
        }
    }

    pub fn parse_value(
        &self,
        node: &SchemaNode,
        value: &Value,
    ) -> Result<Value, ValidationException> {
        self.parse(node, Input::from(value)).map(Parsed::into_json)
    }
}

/// Validate with the default depth cap.
pub fn parse(node: &SchemaNode, input: Input<'_>) -> Result<Parsed, ValidationException> {
    Validator::default().parse(node, input)
}

/// Validate a concrete JSON value (never "missing") with the default depth cap.
pub fn parse_value(node: &SchemaNode, value: &Value) -> Result<Value, ValidationException> {
    Validator::default().parse_value(node, value)
}

// ————————————————————————————————————————————————————————————————————————————
// WALK
// ————————————————————————————————————————————————————————————————————————————

/// Per-call scratch state: the current location and everything that failed.
struct Walk {
    max_depth: usize,
    path: Vec<PathSegment>,
    errors: Vec<ValidationError>,
}

impl Walk {
    fn new(max_depth: usize) -> Self {
        Self { max_depth, path: Vec::new(), errors: Vec::new() }
    }

    fn fail(&mut self, code: ErrorCode, expected: BasicKind, received: BasicKind) {
        let err = ValidationError::new(code, expected, received).at(self.path.clone());
        self.errors.push(err);
    }

    /// `None` means at least one error was recorded for this subtree.
    fn visit(&mut self, node: &SchemaNode, input: Input<'_>, depth: usize) -> Option<Parsed> {
        if depth > self.max_depth {
            self.fail(ErrorCode::DepthExceeded, node.expected(), input.kind());
            return None;
        }
        match node {
            SchemaNode::String => self.primitive(input, BasicKind::String, Value::is_string),
            SchemaNode::Number => self.primitive(input, BasicKind::Number, Value::is_number),
            SchemaNode::Boolean => self.primitive(input, BasicKind::Boolean, Value::is_boolean),
            SchemaNode::Construct(fields) => self.construct(fields, input, depth),
            SchemaNode::Array(child) => self.array(child, input, depth),
            SchemaNode::Optional(child) => {
                if let Input::Missing = input {
                    return Some(Parsed::Absent);
                }
                self.wrapped(child, input, depth, ErrorCode::UnexpectedAbsence)
            }
            SchemaNode::Nullable(child) => {
                if let Input::Null = input {
                    return Some(Parsed::Value(Value::Null));
                }
                self.wrapped(child, input, depth, ErrorCode::UnexpectedNull)
            }
        }
    }

    fn primitive(
        &mut self,
        input: Input<'_>,
        expected: BasicKind,
        accepts: fn(&Value) -> bool,
    ) -> Option<Parsed> {
        match input {
            Input::Present(value) if accepts(value) => Some(Parsed::Value(value.clone())),
            _ => {
                self.fail(ErrorCode::InvalidType, expected, input.kind());
                None
            }
        }
    }

    fn construct(&mut self, fields: &Fields, input: Input<'_>, depth: usize) -> Option<Parsed> {
        let Input::Present(Value::Object(map)) = input else {
            self.fail(ErrorCode::NotAStructure, BasicKind::Object, input.kind());
            return None;
        };
        let mut out = Map::with_capacity(fields.len());
        let mut ok = true;
        // collect-all: every declared field is visited even after a failure
        for (name, child) in fields {
            self.path.push(PathSegment::Field(name.clone()));
            match self.visit(child, Input::field(map, name), depth + 1) {
                Some(Parsed::Value(value)) => {
                    out.insert(name.clone(), value);
                }
                Some(Parsed::Absent) => {}
                None => ok = false,
            }
            self.path.pop();
        }
        ok.then(|| Parsed::Value(Value::Object(out)))
    }

    fn array(&mut self, child: &SchemaNode, input: Input<'_>, depth: usize) -> Option<Parsed> {
        let Input::Present(Value::Array(items)) = input else {
            self.fail(ErrorCode::NotASequence, BasicKind::Array, input.kind());
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            self.path.push(PathSegment::Index(i));
            match self.visit(child, Input::from(item), depth + 1) {
                Some(parsed) => out.push(parsed.into_json()),
                None => ok = false,
            }
            self.path.pop();
        }
        ok.then(|| Parsed::Value(Value::Array(out)))
    }

    /// Optional/Nullable after their own escape hatch didn't apply.
    ///
    /// A child failure at this very location (wrong kind, null, missing)
    /// collapses into one wrapper error. Failures further down (a bad field of
    /// an otherwise well-formed record) are kept as the child reported them.
    fn wrapped(
        &mut self,
        child: &SchemaNode,
        input: Input<'_>,
        depth: usize,
        code: ErrorCode,
    ) -> Option<Parsed> {
        let mark = self.errors.len();
        let parsed = self.visit(child, input, depth + 1);
        if parsed.is_some() {
            return parsed;
        }
        let here = self.path.len();
        let local = self.errors[mark..]
            .iter()
            .all(|e| e.path.len() == here && e.code != ErrorCode::DepthExceeded);
        if local {
            self.errors.truncate(mark);
            self.fail(code, child.expected(), input.kind());
        }
        None
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn codes(ex: &ValidationException) -> Vec<(String, ErrorCode)> {
        ex.iter().map(|e| (e.path_string(), e.code)).collect()
    }

    #[test]
    fn primitives_return_input_unchanged() {
        assert_eq!(parse_value(&make_string(), &json!("12")).unwrap(), json!("12"));
        assert_eq!(parse_value(&make_number(), &json!(12)).unwrap(), json!(12));
        assert_eq!(parse_value(&make_number(), &json!(-0.25)).unwrap(), json!(-0.25));
        assert_eq!(parse_value(&make_boolean(), &json!(true)).unwrap(), json!(true));
    }

    #[test]
    fn primitive_mismatch_is_one_invalid_type() {
        let ex = parse_value(&make_number(), &json!("12")).unwrap_err();
        assert_eq!(ex.len(), 1);
        let e = &ex.errors()[0];
        assert_eq!(e.code, ErrorCode::InvalidType);
        assert_eq!(e.expected, BasicKind::Number);
        assert_eq!(e.received, BasicKind::String);
        assert!(e.path.is_empty());

        let ex = parse_value(&make_boolean(), &json!("true")).unwrap_err();
        assert_eq!(ex.errors()[0].received, BasicKind::String);
        let ex = parse(&make_string(), Input::Missing).unwrap_err();
        assert_eq!(ex.errors()[0].received, BasicKind::Missing);
        let ex = parse_value(&make_string(), &json!(null)).unwrap_err();
        assert_eq!(ex.errors()[0].received, BasicKind::Null);
    }

    #[test]
    fn construct_drops_undeclared_fields() {
        let schema = make_construct([("name", make_string())]);
        let out = parse_value(&schema, &json!({"name": "x", "admin": true})).unwrap();
        assert_eq!(out, json!({"name": "x"}));
    }

    #[test]
    fn construct_output_follows_declaration_order() {
        let schema = make_construct([("b", make_number()), ("a", make_number())]);
        let out = parse_value(&schema, &json!({"a": 1, "b": 2})).unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn construct_collects_every_field_error() {
        let schema = make_construct([
            ("a", make_string().into_node()),
            ("b", make_number().into_node()),
            ("c", make_boolean().into_node()),
        ]);
        let ex = parse_value(&schema, &json!({"a": 1, "b": 2, "c": "no"})).unwrap_err();
        assert_eq!(codes(&ex), vec![
            ("a".to_string(), ErrorCode::InvalidType),
            ("c".to_string(), ErrorCode::InvalidType),
        ]);
    }

    #[test]
    fn construct_rejects_non_objects() {
        let schema = make_construct([("a", make_string())]);
        for bad in [json!([]), json!("x"), json!(1), json!(null)] {
            let ex = parse_value(&schema, &bad).unwrap_err();
            assert_eq!(ex.len(), 1);
            assert_eq!(ex.errors()[0].code, ErrorCode::NotAStructure);
            assert_eq!(ex.errors()[0].received, BasicKind::of(&bad));
        }
        let ex = parse(&schema, Input::Missing).unwrap_err();
        assert_eq!(ex.errors()[0].code, ErrorCode::NotAStructure);
    }

    #[test]
    fn missing_required_field_is_reported() {
        let schema = make_construct([("id", make_number())]);
        let ex = parse_value(&schema, &json!({})).unwrap_err();
        let e = &ex.errors()[0];
        assert_eq!(e.code, ErrorCode::InvalidType);
        assert_eq!(e.received, BasicKind::Missing);
        assert_eq!(e.path_string(), "id");
    }

    #[test]
    fn optional_accepts_missing_and_child_values() {
        let schema = make_string().optional();
        assert_eq!(parse(&schema, Input::Missing).unwrap(), Parsed::Absent);
        assert_eq!(parse_value(&schema, &json!("x")).unwrap(), json!("x"));
    }

    #[test]
    fn optional_rejects_null_and_wrong_kinds() {
        let schema = make_string().optional();
        for bad in [json!(null), json!(3)] {
            let ex = parse_value(&schema, &bad).unwrap_err();
            assert_eq!(ex.len(), 1);
            let e = &ex.errors()[0];
            assert_eq!(e.code, ErrorCode::UnexpectedAbsence);
            assert_eq!(e.expected, BasicKind::String);
            assert_eq!(e.received, BasicKind::of(&bad));
        }
    }

    #[test]
    fn nullable_accepts_null_and_child_values() {
        let schema = make_number().nullable();
        assert_eq!(parse_value(&schema, &json!(null)).unwrap(), Value::Null);
        assert_eq!(parse_value(&schema, &json!(4)).unwrap(), json!(4));
    }

    #[test]
    fn nullable_rejects_missing_and_wrong_kinds() {
        let schema = make_number().nullable();
        let ex = parse(&schema, Input::Missing).unwrap_err();
        assert_eq!(codes(&ex), vec![("$".to_string(), ErrorCode::UnexpectedNull)]);
        let ex = parse_value(&schema, &json!("4")).unwrap_err();
        assert_eq!(ex.errors()[0].code, ErrorCode::UnexpectedNull);
        assert_eq!(ex.errors()[0].received, BasicKind::String);
    }

    #[test]
    fn optional_record_keeps_nested_field_errors() {
        let schema = make_construct([
            ("address", make_construct([("city", make_string())]).optional()),
        ]);
        let ex = parse_value(&schema, &json!({"address": {"city": 12}})).unwrap_err();
        assert_eq!(codes(&ex), vec![("address.city".to_string(), ErrorCode::InvalidType)]);

        let ex = parse_value(&schema, &json!({"address": "here"})).unwrap_err();
        assert_eq!(codes(&ex), vec![("address".to_string(), ErrorCode::UnexpectedAbsence)]);
        assert_eq!(ex.errors()[0].expected, BasicKind::Object);
    }

    #[test]
    fn absent_optional_fields_are_omitted() {
        let schema = make_construct([
            ("id", make_number().into_node()),
            ("nick", make_string().optional()),
            ("bio", make_string().nullable()),
        ]);
        let out = parse_value(&schema, &json!({"id": 1, "bio": null})).unwrap();
        assert_eq!(out, json!({"id": 1, "bio": null}));
        assert!(out.get("nick").is_none());
    }

    #[test]
    fn optional_of_nullable_accepts_both_escapes() {
        let schema = optional(nullable(make_string()));
        assert_eq!(parse(&schema, Input::Missing).unwrap(), Parsed::Absent);
        assert_eq!(parse_value(&schema, &json!(null)).unwrap(), Value::Null);
        let ex = parse_value(&schema, &json!(1)).unwrap_err();
        assert_eq!(codes(&ex), vec![("$".to_string(), ErrorCode::UnexpectedAbsence)]);
    }

    #[test]
    fn array_validates_each_element() {
        let schema = make_number().array();
        assert_eq!(parse_value(&schema, &json!([])).unwrap(), json!([]));
        assert_eq!(parse_value(&schema, &json!([3, 1, 2])).unwrap(), json!([3, 1, 2]));

        let ex = parse_value(&schema, &json!([1, "two", 3, false])).unwrap_err();
        assert_eq!(codes(&ex), vec![
            ("[1]".to_string(), ErrorCode::InvalidType),
            ("[3]".to_string(), ErrorCode::InvalidType),
        ]);
        assert!(ex.errors().iter().all(|e| e.path.len() == 1));
    }

    #[test]
    fn array_rejects_non_sequences() {
        let schema = make_string().array();
        let ex = parse_value(&schema, &json!({"0": "a"})).unwrap_err();
        assert_eq!(ex.len(), 1);
        assert_eq!(ex.errors()[0].code, ErrorCode::NotASequence);
        assert_eq!(ex.errors()[0].received, BasicKind::Object);
    }

    #[test]
    fn array_of_records_reports_index_and_field() {
        let schema = make_construct([("name", make_string())]).array();
        let ex = parse_value(&schema, &json!([{"name": "a"}, {"name": 2}, {}])).unwrap_err();
        assert_eq!(codes(&ex), vec![
            ("[1].name".to_string(), ErrorCode::InvalidType),
            ("[2].name".to_string(), ErrorCode::InvalidType),
        ]);
    }

    #[test]
    fn depth_cap_stops_descent() {
        let mut schema: SchemaNode = make_number().into_node();
        for _ in 0..5 {
            schema = array(schema);
        }
        let input = json!([[[[[1]]]]]);
        assert!(Validator::with_max_depth(6).parse_value(&schema, &input).is_ok());

        let ex = Validator::with_max_depth(3).parse_value(&schema, &input).unwrap_err();
        assert_eq!(ex.len(), 1);
        assert_eq!(ex.errors()[0].code, ErrorCode::DepthExceeded);
        assert_eq!(ex.errors()[0].path_string(), "[0][0][0]");
    }

    #[test]
    fn depth_errors_survive_wrappers() {
        let schema = optional(nullable(make_string()));
        let ex = Validator::with_max_depth(2).parse_value(&schema, &json!("x")).unwrap_err();
        assert_eq!(ex.errors()[0].code, ErrorCode::DepthExceeded);
    }

    #[test]
    fn schema_is_reusable_across_threads() {
        let schema = std::sync::Arc::new(make_construct([("n", make_number())]).into_node());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let schema = schema.clone();
                std::thread::spawn(move || parse_value(&schema, &json!({"n": i})).is_ok())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }

    #[test]
    fn config_defaults_when_fields_omitted() {
        let cfg: ValidatorConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(cfg, ValidatorConfig::default());
        let cfg: ValidatorConfig = serde_json::from_value(json!({"max_depth": 8})).unwrap();
        assert_eq!(Validator::new(cfg).config().max_depth, 8);
    }

    // ------------------------------ Laws ---------------------------------- //

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn primitive_accepts_iff_kinds_match(v in scalar()) {
            for (node, kind) in [
                (SchemaNode::String, BasicKind::String),
                (SchemaNode::Number, BasicKind::Number),
                (SchemaNode::Boolean, BasicKind::Boolean),
            ] {
                let out = parse_value(&node, &v);
                if BasicKind::of(&v) == kind {
                    prop_assert_eq!(out.unwrap(), v.clone());
                } else {
                    prop_assert_eq!(out.unwrap_err().len(), 1);
                }
            }
        }

        #[test]
        fn array_errors_name_exactly_the_bad_indices(xs in prop::collection::vec(scalar(), 0..16)) {
            let schema = make_number().array();
            let bad: Vec<String> = xs.iter().enumerate()
                .filter(|(_, v)| !v.is_number())
                .map(|(i, _)| format!("[{i}]"))
                .collect();
            match parse_value(&schema, &Value::Array(xs.clone())) {
                Ok(out) => {
                    prop_assert!(bad.is_empty());
                    prop_assert_eq!(out, Value::Array(xs));
                }
                Err(ex) => {
                    let got: Vec<String> = ex.iter().map(|e| e.path_string()).collect();
                    prop_assert_eq!(got, bad);
                }
            }
        }

        #[test]
        fn construct_output_has_exactly_declared_fields(
            extra in prop::collection::btree_map("[a-z]{1,6}", scalar(), 0..6),
        ) {
            let schema = make_construct([("id", make_number())]);
            let mut obj: Map<String, Value> = extra.into_iter().collect();
            obj.insert("id".into(), json!(7));
            let out = parse_value(&schema, &Value::Object(obj)).unwrap();
            prop_assert_eq!(out, json!({"id": 7}));
        }
    }
}
