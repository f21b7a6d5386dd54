//! Compiled method → invocable unit (Dynamic Binder)
//!
//! Instead of compiling the synthesized source at runtime, binding validates
//! the text and then wraps the method's [`MethodPlan`] in a [`BoundMethod`]
//! whose `invoke` interprets the plan with a generic request routine. The
//! observable behavior matches what executing the generated Python would do.

use serde_json::{Map, Value};

use crate::document::{ResponseKind, Verb};
use crate::error::{BindingError, CompilationError, DispatchError, Error};
use crate::synth::{GeneratedMethod, MethodPlan, ParamSlot, ParamSource};

/// An invocable method bound to a client-instance property map. The binder
/// does not construct client instances; callers pass the properties at
/// invocation time.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    name: String,
    doc: String,
    plan: MethodPlan,
    defaults: Vec<Value>,
}

impl BoundMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn plan(&self) -> &MethodPlan {
        &self.plan
    }

    /// Values attached to the trailing defaulted slots, in signature order.
    pub fn default_arguments(&self) -> &[Value] {
        &self.defaults
    }

    /// Execute the dispatch plan: one GET with query parameters or one POST
    /// with a JSON body. Inherited slots read from `instance`; caller slots
    /// read from `kwargs`, falling back to the bound default.
    pub fn invoke(
        &self,
        http: &reqwest::blocking::Client,
        instance: &Map<String, Value>,
        kwargs: &Map<String, Value>,
    ) -> Result<Value, DispatchError> {
        let request = match self.plan.verb {
            Verb::Get => {
                let mut pairs: Vec<(String, String)> = Vec::new();
                for slot in &self.plan.params {
                    let value = self.slot_value(slot, instance, kwargs)?;
                    pairs.push((slot.name.clone(), query_text(&value)));
                }
                http.get(&self.plan.url).query(&pairs)
            }
            Verb::Post => {
                let mut body = Map::new();
                for slot in &self.plan.params {
                    let value = self.slot_value(slot, instance, kwargs)?;
                    body.insert(slot.name.clone(), value);
                }
                if self.plan.forward_extra {
                    for (key, value) in kwargs {
                        if !self.plan.params.iter().any(|slot| &slot.name == key) {
                            body.insert(key.clone(), value.clone());
                        }
                    }
                }
                http.post(&self.plan.url).json(&body)
            }
        };

        let response = request.send().map_err(DispatchError::RequestFailed)?;
        let status = response.status();
        let text = response.text().map_err(DispatchError::ResponseRead)?;

        if !status.is_success() {
            return Err(DispatchError::HttpError { status, body: text });
        }

        match self.plan.response {
            Some(ResponseKind::Json) => {
                serde_json::from_str(&text).map_err(DispatchError::ResponseDecode)
            }
            Some(ResponseKind::Raw) | None => Ok(Value::String(text)),
        }
    }

    fn slot_value(
        &self,
        slot: &ParamSlot,
        instance: &Map<String, Value>,
        kwargs: &Map<String, Value>,
    ) -> Result<Value, DispatchError> {
        match &slot.source {
            ParamSource::Inherited => instance
                .get(&slot.name)
                .cloned()
                .ok_or_else(|| DispatchError::MissingProperty {
                    name: slot.name.clone(),
                }),
            ParamSource::Caller { default } => kwargs
                .get(&slot.name)
                .or(default.as_ref())
                .cloned()
                .ok_or_else(|| DispatchError::MissingArgument {
                    name: slot.name.clone(),
                }),
        }
    }
}

fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Turn a compiled method into an invocable unit. Validates the synthesized
/// text and checks default arity against the signature before wrapping the
/// plan.
pub fn bind(method: &GeneratedMethod) -> Result<BoundMethod, Error> {
    let def_line = validate_source(method)?;

    let expected = defaulted_slot_count(def_line);
    if expected != method.default_arguments.len() {
        return Err(BindingError {
            method: method.name.clone(),
            expected,
            actual: method.default_arguments.len(),
        }
        .into());
    }

    Ok(BoundMethod {
        name: method.name.clone(),
        doc: method.doc.clone(),
        plan: method.plan.clone(),
        defaults: method.default_arguments.clone(),
    })
}

/// Structural validation of the synthesized text. Returns the `def` line.
fn validate_source(method: &GeneratedMethod) -> Result<&str, CompilationError> {
    let fail = |reason: &str| CompilationError {
        method: method.name.clone(),
        reason: reason.to_string(),
        text: method.source(),
    };

    let mut lines = method.signature.lines().rev();
    let def_line = lines.next().ok_or_else(|| fail("empty signature"))?;
    for decorator_line in lines {
        if !decorator_line.trim_start_matches('\t').starts_with('@') {
            return Err(fail("expected decorator line before def"));
        }
    }

    let trimmed = def_line.trim_start_matches('\t');
    if !trimmed.starts_with("def ") {
        return Err(fail("signature does not start with def"));
    }
    if !trimmed.ends_with("):") {
        return Err(fail("signature does not end with ):"));
    }
    let opens = trimmed.matches('(').count();
    let closes = trimmed.matches(')').count();
    if opens != closes {
        return Err(fail("unbalanced parentheses in signature"));
    }
    if !trimmed.contains("**") {
        return Err(fail("signature is missing the catch-all parameter"));
    }
    if method.body.trim().is_empty() {
        return Err(fail("empty body"));
    }

    Ok(def_line)
}

/// Count `name=value` entries in the def line's argument list. The catch-all
/// is not a defaulted slot.
fn defaulted_slot_count(def_line: &str) -> usize {
    let open = match def_line.find('(') {
        Some(i) => i + 1,
        None => return 0,
    };
    let close = match def_line.rfind(')') {
        Some(i) => i,
        None => return 0,
    };
    split_args(&def_line[open..close])
        .into_iter()
        .map(str::trim)
        .filter(|arg| !arg.starts_with("**") && arg.contains('='))
        .count()
}

/// Split a rendered argument list on commas. A comma inside a string
/// literal (a quoted default value, possibly with escapes) does not
/// delimit an argument.
fn split_args(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in list.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            parts.push(&list[start..i]);
            start = i + 1;
        }
    }
    parts.push(&list[start..]);
    parts
}
