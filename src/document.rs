//! OpenAPI document → endpoint view (Schema Navigator)
//!
//! Wraps the parsed document and resolves one path into a uniform
//! `Endpoint`: verb, parameter descriptors, doc text, response content type.
//! Query parameters and request-body schema properties are normalized into
//! the same `ParamDescriptor` shape so the synthesizer never branches on
//! where a parameter came from.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, SchemaResolutionError, UnsupportedVerbError};

/// The two supported HTTP verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Read-style: query parameters, no body.
    Get,
    /// Write-style: JSON request body.
    Post,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
        }
    }

    pub fn parse(s: &str) -> Result<Self, UnsupportedVerbError> {
        match s {
            "get" => Ok(Verb::Get),
            "post" => Ok(Verb::Post),
            other => Err(UnsupportedVerbError {
                verb: other.to_string(),
            }),
        }
    }
}

/// How a 200 response should be post-processed by generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// JSON content → decode accessor (`.json()`).
    Json,
    /// HTML content → raw content accessor (`.content`).
    Raw,
}

/// Uniform view of one parameter, across both supported shapes
/// (query parameter object, post body property object).
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// `default` declared directly on the descriptor.
    pub default: Option<Value>,
    /// `default` nested under the descriptor's `schema`.
    pub schema_default: Option<Value>,
}

/// One resolved endpoint: the unit of compilation.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub verb: Verb,
    pub summary: String,
    pub description: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParamDescriptor>,
    /// First content-type key of the 200 response, if declared.
    pub response_content: Option<String>,
}

/// The full parsed API description. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    root: Value,
}

impl ApiDocument {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Load a previously serialized document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::DocumentRead {
            path: path.display().to_string(),
            source,
        })?;
        let root = serde_json::from_reader(BufReader::new(file)).map_err(Error::DocumentParse)?;
        Ok(Self { root })
    }

    /// Fetch `<base_url>/openapi.json` and parse it.
    pub fn fetch(client: &reqwest::blocking::Client, base_url: &str) -> Result<Self, Error> {
        let url = format!("{base_url}/openapi.json");
        let root = client
            .get(url)
            .send()
            .map_err(Error::DocumentFetch)?
            .json()
            .map_err(Error::DocumentFetch)?;
        Ok(Self { root })
    }

    /// All declared paths, in document order.
    pub fn paths(&self) -> Vec<String> {
        self.root
            .get("paths")
            .and_then(Value::as_object)
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn endpoint_metadata(&self, path: &str) -> Result<&Map<String, Value>, SchemaResolutionError> {
        self.root
            .get("paths")
            .and_then(|p| p.get(path))
            .and_then(Value::as_object)
            .ok_or_else(|| SchemaResolutionError::PathNotFound {
                path: path.to_string(),
            })
    }

    /// Resolve an endpoint, inferring the verb from the single verb key
    /// present. More than one verb is an error; use [`resolve_verb`] to
    /// name the verb explicitly.
    ///
    /// [`resolve_verb`]: ApiDocument::resolve_verb
    pub fn resolve(&self, path: &str) -> Result<Endpoint, Error> {
        let metadata = self.endpoint_metadata(path)?;
        let verbs: Vec<&String> = metadata.keys().collect();
        match verbs.as_slice() {
            [] => Err(SchemaResolutionError::NoVerb {
                path: path.to_string(),
            }
            .into()),
            [single] => {
                let verb = Verb::parse(single)?;
                self.resolve_endpoint(path, verb)
            }
            many => Err(SchemaResolutionError::AmbiguousVerb {
                path: path.to_string(),
                verbs: many.iter().map(|v| v.to_string()).collect(),
            }
            .into()),
        }
    }

    /// Resolve an endpoint for an explicitly named verb.
    pub fn resolve_verb(&self, path: &str, verb: Verb) -> Result<Endpoint, Error> {
        let metadata = self.endpoint_metadata(path)?;
        if !metadata.contains_key(verb.as_str()) {
            return Err(SchemaResolutionError::VerbNotDeclared {
                path: path.to_string(),
                verb: verb.as_str().to_string(),
            }
            .into());
        }
        self.resolve_endpoint(path, verb)
    }

    fn resolve_endpoint(&self, path: &str, verb: Verb) -> Result<Endpoint, Error> {
        let metadata = self.endpoint_metadata(path)?;
        let operation = metadata
            .get(verb.as_str())
            .ok_or_else(|| SchemaResolutionError::VerbNotDeclared {
                path: path.to_string(),
                verb: verb.as_str().to_string(),
            })?;

        let parameters = match verb {
            Verb::Get => self.query_parameters(path, operation)?,
            Verb::Post => self.body_properties(path, operation)?,
        };

        Ok(Endpoint {
            path: path.to_string(),
            verb,
            summary: str_field(operation, "summary"),
            description: str_field(operation, "description"),
            parameters,
            response_content: response_content(operation),
        })
    }

    fn query_parameters(
        &self,
        path: &str,
        operation: &Value,
    ) -> Result<Vec<ParamDescriptor>, Error> {
        let params = operation
            .get("parameters")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaResolutionError::MissingKey {
                path: path.to_string(),
                key: "parameters".to_string(),
            })?;

        params
            .iter()
            .map(|raw| {
                let name = raw.get("name").and_then(Value::as_str).ok_or_else(|| {
                    SchemaResolutionError::MissingKey {
                        path: path.to_string(),
                        key: "name".to_string(),
                    }
                })?;
                Ok(descriptor(name, raw))
            })
            .collect()
    }

    fn body_properties(&self, path: &str, operation: &Value) -> Result<Vec<ParamDescriptor>, Error> {
        let reference = operation
            .get("requestBody")
            .and_then(|rb| rb.get("content"))
            .and_then(|c| c.get("application/json"))
            .and_then(|ct| ct.get("schema"))
            .and_then(|s| s.get("$ref"))
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaResolutionError::MissingKey {
                path: path.to_string(),
                key: "requestBody.content.application/json.schema.$ref".to_string(),
            })?;

        // "#/components/schemas/CreateBody" → "CreateBody"
        let component = reference.rsplit('/').next().unwrap_or(reference);

        let schema = self
            .root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get(component))
            .ok_or_else(|| SchemaResolutionError::UnknownComponent {
                name: component.to_string(),
            })?;

        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| SchemaResolutionError::MissingKey {
                path: path.to_string(),
                key: format!("components.schemas.{component}.properties"),
            })?;

        Ok(properties
            .iter()
            .map(|(name, raw)| descriptor(name, raw))
            .collect())
    }
}

fn descriptor(name: &str, raw: &Value) -> ParamDescriptor {
    ParamDescriptor {
        name: name.to_string(),
        title: raw
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        description: raw
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        default: raw.get("default").cloned(),
        schema_default: raw.get("schema").and_then(|s| s.get("default")).cloned(),
    }
}

fn str_field(operation: &Value, key: &str) -> String {
    operation
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn response_content(operation: &Value) -> Option<String> {
    operation
        .get("responses")
        .and_then(|r| r.get("200"))
        .and_then(|r| r.get("content"))
        .and_then(Value::as_object)
        .and_then(|content| content.keys().next().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> ApiDocument {
        ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "paths": {
                "/users/list": {
                    "get": {
                        "summary": "List users",
                        "description": "Paged listing.",
                        "parameters": [
                            {
                                "name": "page",
                                "description": "Page number",
                                "schema": { "default": 1 }
                            },
                            { "name": "username" }
                        ],
                        "responses": {
                            "200": { "content": { "application/json": {} } }
                        }
                    }
                },
                "/collections/create": {
                    "post": {
                        "summary": "Create a collection",
                        "description": "",
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBody" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "content": { "text/html": {} } }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "CreateBody": {
                        "properties": {
                            "name": { "title": "Name", "description": "Collection name" },
                            "api_key": { "title": "Api Key" }
                        }
                    }
                }
            }
        }))
    }

    #[test]
    fn resolve_get_endpoint_returns_declared_parameters_in_order() {
        let doc = sample_document();
        let ep = doc.resolve("/users/list").unwrap();

        assert_eq!(ep.verb, Verb::Get);
        assert_eq!(ep.summary, "List users");
        assert_eq!(ep.parameters.len(), 2);
        assert_eq!(ep.parameters[0].name, "page");
        assert_eq!(ep.parameters[0].schema_default, Some(json!(1)));
        assert_eq!(ep.parameters[1].name, "username");
        assert_eq!(ep.response_content.as_deref(), Some("application/json"));
    }

    #[test]
    fn resolve_post_endpoint_dereferences_component_schema() {
        let doc = sample_document();
        let ep = doc.resolve("/collections/create").unwrap();

        assert_eq!(ep.verb, Verb::Post);
        let names: Vec<&str> = ep.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "api_key"]);
        assert_eq!(ep.parameters[0].title.as_deref(), Some("Name"));
        assert_eq!(ep.response_content.as_deref(), Some("text/html"));
    }

    #[test]
    fn resolve_unknown_path_fails() {
        let doc = sample_document();
        let err = doc.resolve("/missing").unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaResolution(SchemaResolutionError::PathNotFound { .. })
        ));
    }

    #[test]
    fn resolve_unknown_component_fails() {
        let doc = ApiDocument::from_value(json!({
            "paths": {
                "/x": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Nope" }
                                }
                            }
                        }
                    }
                }
            },
            "components": { "schemas": {} }
        }));
        let err = doc.resolve("/x").unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaResolution(SchemaResolutionError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn resolve_missing_ref_reports_missing_key() {
        let doc = ApiDocument::from_value(json!({
            "paths": {
                "/x": { "post": { "requestBody": { "content": {} } } }
            }
        }));
        let err = doc.resolve("/x").unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaResolution(SchemaResolutionError::MissingKey { .. })
        ));
    }

    #[test]
    fn resolve_rejects_multiple_verbs() {
        let doc = ApiDocument::from_value(json!({
            "paths": {
                "/both": {
                    "get": { "parameters": [] },
                    "post": {}
                }
            }
        }));
        let err = doc.resolve("/both").unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaResolution(SchemaResolutionError::AmbiguousVerb { .. })
        ));
    }

    #[test]
    fn resolve_verb_selects_named_verb_when_multiple_declared() {
        let doc = ApiDocument::from_value(json!({
            "paths": {
                "/both": {
                    "get": { "parameters": [{ "name": "q" }] },
                    "post": {}
                }
            }
        }));
        let ep = doc.resolve_verb("/both", Verb::Get).unwrap();
        assert_eq!(ep.verb, Verb::Get);
        assert_eq!(ep.parameters[0].name, "q");
    }

    #[test]
    fn resolve_verb_fails_for_undeclared_verb() {
        let doc = sample_document();
        let err = doc.resolve_verb("/users/list", Verb::Post).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaResolution(SchemaResolutionError::VerbNotDeclared { .. })
        ));
    }

    #[test]
    fn resolve_rejects_unsupported_verb() {
        let doc = ApiDocument::from_value(json!({
            "paths": { "/x": { "delete": {} } }
        }));
        let err = doc.resolve("/x").unwrap_err();
        assert!(matches!(err, Error::UnsupportedVerb(_)));
    }

    #[test]
    fn query_parameter_without_name_fails() {
        let doc = ApiDocument::from_value(json!({
            "paths": {
                "/x": { "get": { "parameters": [ { "description": "no name" } ] } }
            }
        }));
        let err = doc.resolve("/x").unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaResolution(SchemaResolutionError::MissingKey { .. })
        ));
    }

    #[test]
    fn paths_preserve_document_order() {
        let doc = sample_document();
        assert_eq!(doc.paths(), vec!["/users/list", "/collections/create"]);
    }
}
