//! Effective default resolution for parameters.
//!
//! Caller-supplied override tables take precedence over document-declared
//! defaults. Absence is modeled as a dedicated variant, never a magic value,
//! so a legitimate default can never collide with "no default".

use serde_json::{Map, Value};

use crate::document::ParamDescriptor;

/// The outcome of default resolution for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedDefault {
    Value(Value),
    Absent,
}

impl ResolvedDefault {
    pub fn is_absent(&self) -> bool {
        matches!(self, ResolvedDefault::Absent)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ResolvedDefault::Value(v) => Some(v),
            ResolvedDefault::Absent => None,
        }
    }
}

/// Caller-supplied default overrides.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Keyed by the descriptor's `title` or `name`.
    pub by_field: Map<String, Value>,
    /// Keyed by parameter name only, checked after `by_field`.
    pub by_name: Map<String, Value>,
}

/// Resolve the effective default for one parameter. First match wins:
/// `by_field[title]`, `by_field[name]`, `by_name[name]`, declared `default`,
/// `schema.default`, then [`ResolvedDefault::Absent`]. The `by_name` table
/// is consulted for both parameter shapes, widening the original key-based
/// lookup that applied to write-style properties only.
pub fn resolve_default(descriptor: &ParamDescriptor, overrides: &Overrides) -> ResolvedDefault {
    if let Some(title) = &descriptor.title {
        if let Some(v) = overrides.by_field.get(title) {
            return ResolvedDefault::Value(v.clone());
        }
    }
    if let Some(v) = overrides.by_field.get(&descriptor.name) {
        return ResolvedDefault::Value(v.clone());
    }
    if let Some(v) = overrides.by_name.get(&descriptor.name) {
        return ResolvedDefault::Value(v.clone());
    }
    if let Some(v) = &descriptor.default {
        return ResolvedDefault::Value(v.clone());
    }
    if let Some(v) = &descriptor.schema_default {
        return ResolvedDefault::Value(v.clone());
    }
    ResolvedDefault::Absent
}

/// Render a JSON value as a Python literal for embedding in synthesized
/// source text. Strings are quoted and escaped; everything else uses its
/// Python textual form.
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(entries) => {
            let rendered: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("\"{}\": {}", k, python_literal(v)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}
