//! Static projections of a rule graph.
//!
//! - [`rust`]: Rust type definitions (`Codegen::new().emit(&node, "Root")`)
//! - [`json_schema`]: a JSON Schema document
//! - [`shape`]: a compact one-line type, e.g. `{ id: number; first_name?: string }`
//!
//! All three describe exactly the values `parse` can produce for the graph:
//! a key whose rule admits a missing input may be absent (see
//! [`SchemaNode::admits_missing`](crate::ir::SchemaNode::admits_missing)),
//! nullable positions may be null, undeclared fields never appear.
pub mod json_schema;
pub mod rust;
pub mod shape;

pub use json_schema::{json_schema, json_schema_document};
pub use rust::Codegen;
pub use shape::infer_shape;

// ------------------------------- Naming ----------------------------------- //

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Split on non-alphanumerics and lower→upper transitions: `postalCode` → `postal`, `code`.
fn words(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut prev_lower = false;
    for ch in raw.chars() {
        if !ch.is_alphanumeric() {
            if !cur.is_empty() {
                out.push(std::mem::take(&mut cur));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !cur.is_empty() {
            out.push(std::mem::take(&mut cur));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        cur.extend(ch.to_lowercase());
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

/// Field name → Rust field identifier (`postalCode` → `postal_code`, `type` → `r#type`).
pub fn field_ident(raw: &str) -> String {
    let mut ident = words(raw).join("_");
    if ident.is_empty() {
        ident.push_str("field");
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    match ident.as_str() {
        // these cannot be raw identifiers
        "self" | "super" | "crate" | "Self" => format!("{ident}_"),
        kw if RUST_KEYWORDS.contains(&kw) => format!("r#{ident}"),
        _ => ident,
    }
}

/// Name fragment → UpperCamelCase type name (`first_name` → `FirstName`).
pub fn type_ident(raw: &str) -> String {
    let mut name: String = words(raw)
        .iter()
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(first) => first.to_uppercase().chain(cs).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'T');
    }
    name
}
