//! Endpoint → method text + dispatch plan (Method Synthesizer)
//!
//! Renders one Python method per endpoint: signature, request-dispatch body,
//! and docstring. Alongside the text it builds a structured [`MethodPlan`]
//! that the binder interprets directly, so nothing ever has to compile the
//! generated source at runtime.

use std::collections::HashSet;

use serde_json::Value;

use crate::defaults::{python_literal, resolve_default, Overrides, ResolvedDefault};
use crate::document::{Endpoint, ParamDescriptor, ResponseKind, Verb};
use crate::error::{Error, SchemaResolutionError};

/// Nesting depth for rendered text. Copied, never shared: a synthesis call
/// cannot disturb its caller's depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indent(usize);

impl Indent {
    pub fn new(depth: usize) -> Self {
        Self(depth)
    }

    pub fn depth(&self) -> usize {
        self.0
    }

    pub fn deeper(self) -> Self {
        Self(self.0 + 1)
    }

    fn prefix(&self) -> String {
        "\t".repeat(self.0)
    }
}

/// Where a dispatched parameter value comes from at call time.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSource {
    /// Supplied by the caller, optionally falling back to a resolved default.
    Caller { default: Option<Value> },
    /// Read from the client instance's own stored attributes.
    Inherited,
}

/// One parameter slot of a dispatch plan, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSlot {
    pub name: String,
    pub source: ParamSource,
}

/// Structured dispatch plan for one endpoint: everything the generic
/// request routine needs, with no source text involved.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodPlan {
    pub verb: Verb,
    /// Base URL concatenated with the raw endpoint path.
    pub url: String,
    pub params: Vec<ParamSlot>,
    /// Whether extra keyword arguments are forwarded into the body mapping
    /// (write-style only).
    pub forward_extra: bool,
    pub response: Option<ResponseKind>,
}

/// One compiled endpoint: generated text plus its dispatch plan.
#[derive(Debug, Clone)]
pub struct GeneratedMethod {
    /// Exposed identifier, including the internal `_` prefix when applied.
    pub name: String,
    pub is_internal: bool,
    /// Decorator lines plus the `def` line.
    pub signature: String,
    /// Docstring, dispatch call, and optional response accessor suffix.
    pub body: String,
    pub doc: String,
    /// Values for the defaulted slots, in signature order.
    pub default_arguments: Vec<Value>,
    pub plan: MethodPlan,
}

impl GeneratedMethod {
    /// Full method text as it appears in the emitted module.
    pub fn source(&self) -> String {
        format!("{}\n{}", self.signature, self.body)
    }
}

/// Method synthesizer. Borrows the builder's configuration; one call per
/// endpoint, no state carried between calls.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'a> {
    pub base_url: &'a str,
    pub decorators: &'a [String],
    pub inherited: &'a [String],
    pub overrides: &'a Overrides,
    pub internal_functions: &'a HashSet<String>,
    pub include_response_parsing: bool,
}

impl<'a> Synthesizer<'a> {
    pub fn synthesize(&self, endpoint: &Endpoint, indent: Indent) -> Result<GeneratedMethod, Error> {
        let base_name = endpoint.path.split('/').next_back().unwrap_or_default();
        let is_internal = self.internal_functions.contains(base_name);
        let name = if is_internal {
            format!("_{base_name}")
        } else {
            base_name.to_string()
        };

        let defaults: Vec<ResolvedDefault> = endpoint
            .parameters
            .iter()
            .map(|p| resolve_default(p, self.overrides))
            .collect();

        let response = self.response_kind(endpoint)?;
        let doc = self.documentation(endpoint);
        let (signature, default_arguments) =
            self.render_signature(&name, endpoint, &defaults, indent);
        let body = self.render_body(endpoint, &defaults, &doc, response, indent);
        let plan = self.build_plan(endpoint, &defaults, response);

        Ok(GeneratedMethod {
            name,
            is_internal,
            signature,
            body,
            doc,
            default_arguments,
            plan,
        })
    }

    fn is_inherited(&self, name: &str) -> bool {
        self.inherited.iter().any(|p| p == name)
    }

    /// Signature rule: required parameters first, then the deferred
    /// defaulted parameters in their original relative order, then the
    /// catch-all. Inherited parameters never appear.
    fn render_signature(
        &self,
        name: &str,
        endpoint: &Endpoint,
        defaults: &[ResolvedDefault],
        indent: Indent,
    ) -> (String, Vec<Value>) {
        let mut signature = String::new();
        for decorator in self.decorators {
            signature.push_str(&format!("{}@{}\n", indent.prefix(), decorator));
        }
        signature.push_str(&format!("{}def {}(self, ", indent.prefix(), name));

        let mut deferred: Vec<(&str, &Value)> = Vec::new();
        for (param, default) in endpoint.parameters.iter().zip(defaults) {
            if self.is_inherited(&param.name) {
                continue;
            }
            match default.value() {
                Some(value) => deferred.push((param.name.as_str(), value)),
                None => {
                    signature.push_str(&param.name);
                    signature.push_str(", ");
                }
            }
        }

        let mut default_arguments = Vec::with_capacity(deferred.len());
        for (param_name, value) in deferred {
            signature.push_str(&format!("{}={}, ", param_name, python_literal(value)));
            default_arguments.push(value.clone());
        }

        signature.push_str("**kwargs):");
        (signature, default_arguments)
    }

    fn render_body(
        &self,
        endpoint: &Endpoint,
        defaults: &[ResolvedDefault],
        doc: &str,
        response: Option<ResponseKind>,
        indent: Indent,
    ) -> String {
        let inner = indent.deeper();
        let call = inner.deeper();
        let entry = call.deeper();

        let mut body = String::new();
        body.push_str(&format!("{}\"\"\"{}\"\"\"\n", inner.prefix(), doc));
        body.push_str(&format!(
            "{}return requests.{}(\n",
            inner.prefix(),
            endpoint.verb.as_str()
        ));
        body.push_str(&format!(
            "{}url='{}{}',\n",
            call.prefix(),
            self.base_url,
            endpoint.path
        ));
        let mapping = match endpoint.verb {
            Verb::Get => "params",
            Verb::Post => "json",
        };
        body.push_str(&format!("{}{}=dict(\n", call.prefix(), mapping));

        for (param, default) in endpoint.parameters.iter().zip(defaults) {
            let reference = if self.is_inherited(&param.name) && default.is_absent() {
                format!("self.{}", param.name)
            } else {
                param.name.clone()
            };
            body.push_str(&format!("{}{}={},\n", entry.prefix(), param.name, reference));
        }

        match endpoint.verb {
            Verb::Get => body.push_str(&format!("{}))", call.prefix())),
            Verb::Post => body.push_str(&format!("{}**kwargs))", entry.prefix())),
        }

        match response {
            Some(ResponseKind::Json) => body.push_str(".json()"),
            Some(ResponseKind::Raw) => body.push_str(".content"),
            None => {}
        }

        body
    }

    /// Docstring: summary and description, then one line per parameter.
    fn documentation(&self, endpoint: &Endpoint) -> String {
        let mut doc = String::new();
        doc.push_str(&endpoint.summary);
        doc.push('\n');
        doc.push_str(&endpoint.description);
        doc.push('\n');
        doc.push_str("Args\n========\n");
        for param in &endpoint.parameters {
            doc.push_str(&param.name);
            doc.push_str(": ");
            if let Some(description) = &param.description {
                doc.push_str(description);
            }
            doc.push('\n');
        }
        doc.push('\n');
        doc
    }

    fn response_kind(
        &self,
        endpoint: &Endpoint,
    ) -> Result<Option<ResponseKind>, SchemaResolutionError> {
        if !self.include_response_parsing {
            return Ok(None);
        }
        match &endpoint.response_content {
            None => Err(SchemaResolutionError::MissingKey {
                path: endpoint.path.clone(),
                key: "responses.200.content".to_string(),
            }),
            Some(content_type) if content_type.contains("json") => Ok(Some(ResponseKind::Json)),
            Some(content_type) if content_type.contains("html") => Ok(Some(ResponseKind::Raw)),
            Some(content_type) => Err(SchemaResolutionError::UnsupportedContentType {
                path: endpoint.path.clone(),
                content_type: content_type.clone(),
            }),
        }
    }

    fn build_plan(
        &self,
        endpoint: &Endpoint,
        defaults: &[ResolvedDefault],
        response: Option<ResponseKind>,
    ) -> MethodPlan {
        let params = endpoint
            .parameters
            .iter()
            .zip(defaults)
            .map(|(param, default)| self.plan_slot(param, default))
            .collect();

        MethodPlan {
            verb: endpoint.verb,
            url: format!("{}{}", self.base_url, endpoint.path),
            params,
            forward_extra: endpoint.verb == Verb::Post,
            response,
        }
    }

    fn plan_slot(&self, param: &ParamDescriptor, default: &ResolvedDefault) -> ParamSlot {
        let source = if self.is_inherited(&param.name) && default.is_absent() {
            ParamSource::Inherited
        } else {
            ParamSource::Caller {
                default: default.value().cloned(),
            }
        };
        ParamSlot {
            name: param.name.clone(),
            source,
        }
    }
}
