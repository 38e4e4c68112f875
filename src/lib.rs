//! Declare the shape of untrusted data once, then check payloads against it.
//!
//! ```
//! use serde_json::json;
//! use shape_guard::builder::*;
//! use shape_guard::{parse_value, ErrorCode};
//!
//! let user = make_construct([
//!     ("id", make_number().into_node()),
//!     ("first_name", make_string().optional()),
//! ]);
//!
//! assert_eq!(parse_value(&user, &json!({"id": 1, "role": "admin"})).unwrap(), json!({"id": 1}));
//!
//! let err = parse_value(&user, &json!({"id": "1", "first_name": null})).unwrap_err();
//! let codes: Vec<_> = err.iter().map(|e| (e.path_string(), e.code)).collect();
//! assert_eq!(codes, [
//!     ("id".to_string(), ErrorCode::InvalidType),
//!     ("first_name".to_string(), ErrorCode::UnexpectedAbsence),
//! ]);
//! ```
pub mod builder;
pub mod cli;
pub mod codegen;
pub mod descriptor;
pub mod error;
pub mod ir;
pub mod validate;

pub use builder::{
    array, make_boolean, make_construct, make_number, make_string, nullable, optional, BaseNode,
};
pub use descriptor::{descriptor_from_str, load_descriptor, Descriptor, DescriptorError};
pub use error::{BasicKind, ErrorCode, PathSegment, ValidationError, ValidationException};
pub use ir::{Fields, Input, Kind, Parsed, SchemaNode};
pub use validate::{parse, parse_value, Validator, ValidatorConfig};
