//! CLI: check JSON/NDJSON against a descriptor, or project the descriptor (rust | schema | shape)
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use crate::codegen::{infer_shape, json_schema_document, Codegen};
use crate::descriptor::load_descriptor;
use crate::error::ValidationException;
use crate::ir::{Input, Parsed, SchemaNode};
use crate::validate::{Validator, ValidatorConfig, DEFAULT_MAX_DEPTH};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate untrusted JSON against a declared shape, or emit that shape as Rust types / JSON Schema
#[derive(Parser, Debug)]
#[command(name = "shape-guard", version)]
pub struct CommandLineInterface {
    /// more logging (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate documents and report every mismatch
    Check(CheckOut),
    /// emit a Rust data model for the descriptor
    Rust(RustOut),
    /// emit a JSON Schema for the descriptor
    Schema(JsonSchemaOut),
    /// print the compact shape of the descriptor
    Shape(SchemaSettings),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// descriptor file (JSON)
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload).
    /// A pointer that resolves to nothing is validated as a missing value.
    #[arg(long)]
    json_pointer: Option<String>,

    /// one or more inputs: literal paths or quoted glob patterns. Glob matches
    /// are reported relative to the pattern's fixed directory
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

/// An input file and the name its documents are reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Source {
    path: PathBuf,
    label: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// schema nesting cap
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// also print the validated value of passing documents
    #[arg(long)]
    emit: bool,
}

#[derive(clap::Parser, Debug)]
struct RustOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// top-level Rust type name
    #[arg(long, default_value = "Root")]
    root_type: String,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct JsonSchemaOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// schema title
    #[arg(long)]
    title: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One unit of input: a whole file or one NDJSON line, after pointer selection.
#[derive(Debug)]
struct Document {
    label: String,
    value: Option<Value>, // None: the pointer selected nothing
}

#[derive(Debug)]
struct Outcome {
    label: String,
    result: Result<Parsed, ValidationException>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> Result<SchemaNode> {
        load_descriptor(&self.schema)
            .with_context(|| format!("failed to load schema {}", self.schema.display()))
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for Source { path, label } in expand_inputs(&self.input)? {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read input {}", path.display()))?;
            if self.ndjson {
                for (i, line) in text.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let line_label = format!("{label}:{}", i + 1);
                    let value = serde_json::from_str::<Value>(line)
                        .with_context(|| format!("failed to parse JSON ({line_label})"))?;
                    docs.push(self.select(line_label, value));
                }
            } else {
                let value = serde_json::from_str::<Value>(&text)
                    .with_context(|| format!("failed to parse JSON ({})", path.display()))?;
                docs.push(self.select(label, value));
            }
        }
        tracing::debug!(documents = docs.len(), "loaded inputs");
        Ok(docs)
    }

    fn select(&self, label: String, value: Value) -> Document {
        match self.json_pointer.as_deref() {
            None => Document { label, value: Some(value) },
            Some(ptr) => Document { label, value: value.pointer(ptr).cloned() },
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns `false` when `check` found at least one invalid document.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Rust(target) => {
                let node = target.schema_settings.load()?;
                let mut cg = Codegen::new();
                cg.emit(&node, &target.root_type);
                write_output(target.out.as_deref(), &cg.into_string())?;
                Ok(true)
            }
            Command::Schema(target) => {
                let node = target.schema_settings.load()?;
                let doc = json_schema_document(&node, target.title.as_deref());
                let src = serde_json::to_string_pretty(&doc)?;
                write_output(target.out.as_deref(), &src)?;
                Ok(true)
            }
            Command::Shape(target) => {
                let node = target.load()?;
                println!("{}", infer_shape(&node));
                Ok(true)
            }
        }
    }
}

impl CheckOut {
    fn run(&self) -> Result<bool> {
        let node = self.schema_settings.load()?;
        let validator = Validator::new(ValidatorConfig { max_depth: self.max_depth });
        let docs = self.input_settings.load_documents()?;

        // schema and validator are shared read-only across workers
        let outcomes: Vec<Outcome> = docs
            .par_iter()
            .map(|doc| Outcome {
                label: doc.label.clone(),
                result: validator.parse(&node, Input::from(doc.value.as_ref())),
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        tracing::info!(documents = outcomes.len(), failed, "check finished");

        match self.format {
            ReportFormat::Text => self.report_text(&outcomes),
            ReportFormat::Json => self.report_json(&outcomes)?,
        }
        Ok(failed == 0)
    }

    fn report_text(&self, outcomes: &[Outcome]) {
        for outcome in outcomes {
            match &outcome.result {
                Ok(parsed) => {
                    println!("{} {}", "ok  ".green().bold(), outcome.label);
                    if self.emit {
                        println!("{}", parsed.clone().into_json());
                    }
                }
                Err(ex) => {
                    println!("{} {} ({} error(s))", "FAIL".red().bold(), outcome.label, ex.len());
                    for err in ex {
                        println!(
                            "    {} {} expected {}, received {}",
                            err.path_string().yellow(),
                            err.code,
                            err.expected,
                            err.received,
                        );
                    }
                }
            }
        }
    }

    fn report_json(&self, outcomes: &[Outcome]) -> Result<()> {
        for outcome in outcomes {
            let line = match &outcome.result {
                Ok(parsed) if self.emit => serde_json::json!({
                    "document": outcome.label,
                    "valid": true,
                    "value": parsed.clone().into_json(),
                }),
                Ok(_) => serde_json::json!({ "document": outcome.label, "valid": true }),
                Err(ex) => serde_json::json!({
                    "document": outcome.label,
                    "valid": false,
                    "errors": ex,
                }),
            };
            println!("{}", serde_json::to_string(&line)?);
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), "wrote output");
        }
        None => println!("{src}"),
    }
    Ok(())
}

/// Literal paths pass through under their own name. Glob patterns expand in
/// the `glob` crate's sorted order, each match labelled relative to the
/// pattern's fixed directory. A file reached twice is read once.
fn expand_inputs<I>(patterns: I) -> Result<Vec<Source>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for raw in patterns {
        let pattern = raw.as_ref();
        let Some(base) = glob_base(pattern) else {
            let path = PathBuf::from(pattern);
            if seen.insert(path.clone()) {
                out.push(Source { path, label: pattern.to_string() });
            }
            continue;
        };

        let mut matched_any = false;
        let entries = glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))?;
        for entry in entries {
            let path = entry.with_context(|| format!("unreadable match for {pattern}"))?;
            matched_any = true;
            if !seen.insert(path.clone()) {
                continue;
            }
            let label = path.strip_prefix(&base).unwrap_or(&path).display().to_string();
            out.push(Source { path, label });
        }
        if !matched_any {
            bail!("glob pattern matched no files: {pattern}");
        }
    }

    Ok(out)
}

/// Directory part of `pattern` before its first glob metacharacter; `None`
/// when the pattern is a literal path.
fn glob_base(pattern: &str) -> Option<PathBuf> {
    let at = pattern.find(['*', '?', '['])?;
    let fixed = &pattern[..at];
    let base = match fixed.rfind(['/', std::path::MAIN_SEPARATOR]) {
        Some(slash) => PathBuf::from(&fixed[..=slash]),
        None => PathBuf::new(),
    };
    Some(base)
}
