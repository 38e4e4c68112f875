//! Rust type emission.
//!
//! One `struct` per construct, named from the root name plus the field path
//! (`Root` → `RootAddress` → `RootAddressGeo`), parents before children.
//!
//! Optional and nullable layers each add an `Option`. A key that may be both
//! missing and `null` becomes `Option<Option<T>>` read through a generated
//! `deserialize_present`, so the outer `None` always means "key absent".
//! The types describe `parse` output: run `parse` first, then deserialize
//! its result into them.
use std::collections::HashSet;

use super::{field_ident, type_ident};
use crate::ir::{Fields, SchemaNode};

const DERIVES: &str = "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]";

const PRESENT_HELPER: &str = "\
/// Reads a present key, `null` included, as `Some`; a missing key stays `None`.
fn deserialize_present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}
";

#[derive(Debug, Default)]
pub struct Codegen {
    items: Vec<String>,
    taken: HashSet<String>,
    needs_present: bool,
}

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the type for `node` under `root_name`. May be called repeatedly to
    /// put several roots in one file; names stay unique across calls.
    pub fn emit(&mut self, node: &SchemaNode, root_name: &str) {
        let name = type_ident(root_name);
        match node {
            SchemaNode::Construct(fields) => {
                let name = self.claim(&name);
                self.emit_struct(&name, fields);
            }
            other => {
                let alias = self.claim(&name);
                let slot = self.reserve();
                let ty = self.type_of(other, &alias);
                self.items[slot] = format!("pub type {alias} = {ty};\n");
            }
        }
    }

    pub fn into_string(self) -> String {
        let mut out = String::from("use serde::{Deserialize, Serialize};\n");
        if self.needs_present {
            out.push('\n');
            out.push_str(PRESENT_HELPER);
        }
        for item in &self.items {
            out.push('\n');
            out.push_str(item);
        }
        out
    }

    fn reserve(&mut self) -> usize {
        self.items.push(String::new());
        self.items.len() - 1
    }

    fn claim(&mut self, wanted: &str) -> String {
        let mut name = wanted.to_string();
        let mut n = 2;
        while self.taken.contains(&name) {
            name = format!("{wanted}{n}");
            n += 1;
        }
        self.taken.insert(name.clone());
        name
    }

    fn type_of(&mut self, node: &SchemaNode, hint: &str) -> String {
        match node {
            SchemaNode::String => "String".to_string(),
            SchemaNode::Number => "f64".to_string(),
            SchemaNode::Boolean => "bool".to_string(),
            SchemaNode::Construct(fields) => {
                let name = self.claim(hint);
                self.emit_struct(&name, fields);
                name
            }
            SchemaNode::Optional(child) | SchemaNode::Nullable(child) => {
                format!("Option<{}>", self.type_of(child, hint))
            }
            SchemaNode::Array(child) => {
                format!("Vec<{}>", self.type_of(child, &format!("{hint}Item")))
            }
        }
    }

    fn emit_struct(&mut self, name: &str, fields: &Fields) {
        // reserve first so the parent lands above its nested structs
        let slot = self.reserve();
        let mut out = format!("{DERIVES}\npub struct {name} {{\n");
        let mut idents = HashSet::new();
        for (raw, child) in fields {
            let ident = unique_field(&mut idents, field_ident(raw));
            let ty = self.type_of(child, &format!("{name}{}", type_ident(raw)));
            if ident.trim_start_matches("r#") != raw {
                out.push_str(&format!("    #[serde(rename = {raw:?})]\n"));
            }
            let serde_attr = match (child.admits_missing(), child.admits_null()) {
                (true, true) => {
                    self.needs_present = true;
                    Some(
                        "default, deserialize_with = \"deserialize_present\", \
                         skip_serializing_if = \"Option::is_none\"",
                    )
                }
                (true, false) => Some("default, skip_serializing_if = \"Option::is_none\""),
                // without this serde would read a missing key as None
                (false, true) => Some("deserialize_with = \"Option::deserialize\""),
                (false, false) => None,
            };
            if let Some(attr) = serde_attr {
                out.push_str(&format!("    #[serde({attr})]\n"));
            }
            out.push_str(&format!("    pub {ident}: {ty},\n"));
        }
        out.push_str("}\n");
        self.items[slot] = out;
    }
}

/// `postalCode` and `postal_code` both want `postal_code`; later fields get
/// `_2`, `_3` and so on. The wire name is kept by the rename attribute.
fn unique_field(taken: &mut HashSet<String>, ident: String) -> String {
    if taken.insert(ident.clone()) {
        return ident;
    }
    let base = ident.trim_start_matches("r#");
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
