//! Thin wrapper over the `jsonschema` evaluator.
//!
//! The registry and validator never call the crate directly; everything
//! goes through the operations here: compile raw bytes into a value,
//! compile a kind schema (combined with the shared base scaffold) into a
//! conformance checker, and read a field path off a value as a primitive.
//!
//! All schema values of one load pass are registered in a shared
//! [`EvalContext`] so cross-schema `$ref`s resolve locally, without
//! network requests. Checkers built under one context must only be used
//! with the snapshot that owns them.

use std::collections::HashMap;
use std::fmt;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors from the engine wrapper.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Raw bytes did not parse as JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema value could not be compiled into a checker.
    #[error("schema does not compile: {0}")]
    Build(String),

    /// Field path lookup found nothing.
    #[error("field '{path}' not found")]
    FieldNotFound { path: String },

    /// Field path lookup found a value of the wrong type.
    #[error("field '{path}' is not a {expected}")]
    FieldType { path: String, expected: &'static str },
}

/// Scaffold constraints combined with every kind schema before compilation.
///
/// Panels must be objects and must declare a string `kind` discriminant;
/// the rest of the shape is owned by the kind-specific schema.
fn base_definition() -> Value {
    json!({
        "type": "object",
        "required": ["kind"],
        "properties": {
            "kind": { "type": "string" }
        }
    })
}

/// Compile raw bytes into a value.
pub fn compile(bytes: &[u8]) -> Result<Value, EngineError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read the field at `path` (dot-separated) as a string.
pub fn lookup_string<'a>(value: &'a Value, path: &str) -> Result<&'a str, EngineError> {
    let pointer = format!("/{}", path.split('.').collect::<Vec<_>>().join("/"));
    let field = value
        .pointer(&pointer)
        .ok_or_else(|| EngineError::FieldNotFound {
            path: path.to_string(),
        })?;
    field.as_str().ok_or_else(|| EngineError::FieldType {
        path: path.to_string(),
        expected: "string",
    })
}

/// The kind a schema declares for itself: the `const` (or single-valued
/// `enum`) of its `kind` property.
pub fn declared_kind(schema: &Value) -> Result<&str, EngineError> {
    if let Ok(kind) = lookup_string(schema, "properties.kind.const") {
        return Ok(kind);
    }
    if let Some(values) = schema
        .pointer("/properties/kind/enum")
        .and_then(Value::as_array)
    {
        if values.len() == 1 {
            return values[0].as_str().ok_or(EngineError::FieldType {
                path: "properties.kind.enum".to_string(),
                expected: "string",
            });
        }
    }
    Err(EngineError::FieldNotFound {
        path: "properties.kind.const".to_string(),
    })
}

/// Check a document value against a compiled checker, collecting every
/// violation.
pub fn check(checker: &Validator, instance: &Value) -> Result<(), Violations> {
    let violations: Vec<Violation> = checker
        .iter_errors(instance)
        .map(|e| Violation {
            instance_path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Violations(violations))
    }
}

// ── Shared evaluation context ───────────────────────────────────────

/// Shared evaluation context for one load pass.
///
/// Holds every schema value of the generation so `$ref`s between them
/// resolve from memory.
#[derive(Default)]
pub struct EvalContext {
    resources: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema source under its filename and `$id` for `$ref`
    /// resolution.
    pub fn register(&mut self, name: &str, schema: &Value) {
        self.resources.insert(name.to_string(), schema.clone());
        if let Some(id) = schema.get("$id").and_then(Value::as_str) {
            self.resources.insert(id.to_string(), schema.clone());
        }
    }

    /// Compile one kind schema combined with the shared base definition.
    pub fn compile_schema(&self, schema: &Value) -> Result<Validator, EngineError> {
        let combined = json!({ "allOf": [base_definition(), schema] });
        self.options()
            .build(&combined)
            .map_err(|e| EngineError::Build(e.to_string()))
    }

    fn options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(ContextRetriever {
            resources: self.resources.clone(),
        });
        opts
    }
}

/// Resolves `$ref` URIs against the registered resources, by full URI or
/// bare filename. Unknown URIs (draft metaschemas and the like) resolve
/// to a permissive schema so no network request is ever attempted.
struct ContextRetriever {
    resources: HashMap<String, Value>,
}

impl Retrieve for ContextRetriever {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(value) = self.resources.get(uri_str) {
            return Ok(value.clone());
        }
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.resources.get(filename) {
            return Ok(value.clone());
        }
        Ok(json!({}))
    }
}

// ── Violations ──────────────────────────────────────────────────────

/// A single constraint violation with the instance path that triggered it.
#[derive(Debug, Clone)]
pub struct Violation {
    pub instance_path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Every violation found while checking one document.
#[derive(Debug, Clone)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
