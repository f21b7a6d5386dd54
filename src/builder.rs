//! Endpoint compiler and configuration surface.
//!
//! `SdkBuilder` owns the loaded document and the caller-supplied
//! configuration, and composes the navigator, resolver, synthesizer, binder,
//! and emitter. Compilation is per endpoint and stateless: compiling the
//! same path twice yields byte-identical text.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use serde_json::{Map, Value};

use crate::bind::{bind, BoundMethod};
use crate::defaults::Overrides;
use crate::document::{ApiDocument, Verb};
use crate::error::Error;
use crate::synth::{GeneratedMethod, Indent, Synthesizer};
use crate::writer::ModuleWriter;

/// Depth of a method inside the generated class body.
const METHOD_DEPTH: usize = 1;

/// Compiles an API document into generated methods and bound callables.
#[derive(Debug, Clone)]
pub struct SdkBuilder {
    base_url: String,
    document: ApiDocument,
    inherited_properties: Vec<String>,
    decorators: Vec<String>,
    overrides: Overrides,
    internal_functions: HashSet<String>,
    include_response_parsing: bool,
}

impl SdkBuilder {
    pub fn new(base_url: impl Into<String>, document: ApiDocument) -> Self {
        Self {
            base_url: base_url.into(),
            document,
            inherited_properties: Vec::new(),
            decorators: Vec::new(),
            overrides: Overrides::default(),
            internal_functions: HashSet::new(),
            include_response_parsing: false,
        }
    }

    /// Fetch `<base_url>/openapi.json` and build from it.
    pub fn from_url(base_url: impl Into<String>) -> Result<Self, Error> {
        let base_url = base_url.into();
        let client = reqwest::blocking::Client::new();
        let document = ApiDocument::fetch(&client, &base_url)?;
        Ok(Self::new(base_url, document))
    }

    /// Load a serialized document from disk and build from it.
    pub fn from_file(
        base_url: impl Into<String>,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Error> {
        let document = ApiDocument::from_file(path)?;
        Ok(Self::new(base_url, document))
    }

    /// Parameter names satisfied by the client instance itself rather than
    /// by the caller.
    pub fn inherited_properties(mut self, properties: Vec<String>) -> Self {
        self.inherited_properties = properties;
        self
    }

    /// Decorator names prepended to every generated method.
    pub fn decorators(mut self, decorators: Vec<String>) -> Self {
        self.decorators = decorators;
        self
    }

    /// Forced defaults keyed by a parameter's `title` or `name`.
    pub fn override_defaults(mut self, table: Map<String, Value>) -> Self {
        self.overrides.by_field = table;
        self
    }

    /// Forced defaults keyed by parameter name only.
    pub fn override_defaults_by_name(mut self, table: Map<String, Value>) -> Self {
        self.overrides.by_name = table;
        self
    }

    /// Method names to expose with the internal `_` prefix.
    pub fn internal_functions(mut self, names: HashSet<String>) -> Self {
        self.internal_functions = names;
        self
    }

    /// Append a response accessor suffix chosen from the declared response
    /// content type.
    pub fn include_response_parsing(mut self, enabled: bool) -> Self {
        self.include_response_parsing = enabled;
        self
    }

    pub fn document(&self) -> &ApiDocument {
        &self.document
    }

    fn synthesizer(&self) -> Synthesizer<'_> {
        Synthesizer {
            base_url: &self.base_url,
            decorators: &self.decorators,
            inherited: &self.inherited_properties,
            overrides: &self.overrides,
            internal_functions: &self.internal_functions,
            include_response_parsing: self.include_response_parsing,
        }
    }

    /// Compile one endpoint, inferring its verb.
    pub fn compile_endpoint(&self, path: &str) -> Result<GeneratedMethod, Error> {
        let endpoint = self.document.resolve(path)?;
        self.synthesizer()
            .synthesize(&endpoint, Indent::new(METHOD_DEPTH))
    }

    /// Compile one endpoint for an explicitly named verb.
    pub fn compile_endpoint_verb(&self, path: &str, verb: Verb) -> Result<GeneratedMethod, Error> {
        let endpoint = self.document.resolve_verb(path, verb)?;
        self.synthesizer()
            .synthesize(&endpoint, Indent::new(METHOD_DEPTH))
    }

    /// Compile every endpoint in document order. A failing endpoint does not
    /// stop the others; failures are returned alongside the successes.
    pub fn compile_all(&self) -> (Vec<GeneratedMethod>, Vec<(String, Error)>) {
        let mut methods = Vec::new();
        let mut failures = Vec::new();
        for path in self.document.paths() {
            match self.compile_endpoint(&path) {
                Ok(method) => methods.push(method),
                Err(err) => failures.push((path, err)),
            }
        }
        (methods, failures)
    }

    /// Compile and bind every endpoint into a name → callable registry.
    pub fn build_method_map(&self) -> (BTreeMap<String, BoundMethod>, Vec<(String, Error)>) {
        let (methods, mut failures) = self.compile_all();
        let mut map = BTreeMap::new();
        for method in &methods {
            match bind(method) {
                Ok(bound) => {
                    map.insert(bound.name().to_string(), bound);
                }
                Err(err) => failures.push((method.name.clone(), err)),
            }
        }
        (map, failures)
    }

    /// Emit the full module: header, imports, class with constructor, then
    /// one method block per endpoint in document order. Any endpoint failure
    /// aborts emission so a partial artifact is never produced.
    pub fn write_python_module<W: Write>(
        &self,
        out: W,
        class_name: &str,
        imports: &[String],
    ) -> Result<(), Error> {
        let mut writer = ModuleWriter::new(out);
        writer.write_header()?;
        writer.write_imports(imports)?;
        writer.write_class(class_name, &self.inherited_properties)?;
        for path in self.document.paths() {
            let method = self.compile_endpoint(&path)?;
            writer.write_method(&method)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaResolutionError;
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
                            { "name": "page", "schema": { "default": 1 } }
                        ],
                        "responses": {
                            "200": { "content": { "application/json": {} } }
                        }
                    }
                },
                "/collections/create": {
                    "post": {
                        "summary": "Create a collection",
                        "description": "Creates one collection.",
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBody" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "content": { "application/json": {} } }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "CreateBody": {
                        "properties": {
                            "name": { "title": "Name" },
                            "api_key": { "title": "Api Key" }
                        }
                    }
                }
            }
        }))
    }

    fn builder() -> SdkBuilder {
        SdkBuilder::new("https://api.example.com", sample_document())
    }

    #[test]
    fn scenario_get_endpoint_defers_defaulted_parameter() {
        let method = builder().compile_endpoint("/users/list").unwrap();

        assert_eq!(method.signature, "\tdef list(self, page=1, **kwargs):");
        assert!(method.body.contains("page=page,"));
        assert!(method
            .body
            .contains("url='https://api.example.com/users/list',"));
    }

    #[test]
    fn scenario_override_table_replaces_schema_default() {
        let mut table = Map::new();
        table.insert("page".to_string(), json!(50));
        let method = builder()
            .override_defaults(table)
            .compile_endpoint("/users/list")
            .unwrap();

        assert!(method.signature.contains("page=50"));
        assert_eq!(method.default_arguments, vec![json!(50)]);
    }

    #[test]
    fn scenario_inherited_property_excluded_and_read_from_self() {
        let method = builder()
            .inherited_properties(vec!["api_key".to_string()])
            .compile_endpoint("/collections/create")
            .unwrap();

        assert_eq!(method.signature, "\tdef create(self, name, **kwargs):");
        assert!(method.body.contains("api_key=self.api_key,"));
    }

    #[test]
    fn scenario_response_parsing_appends_json_suffix() {
        let method = builder()
            .include_response_parsing(true)
            .compile_endpoint("/users/list")
            .unwrap();

        assert!(method.body.ends_with(".json()"));
    }

    #[test]
    fn scenario_absent_endpoint_is_a_resolution_error() {
        let err = builder().compile_endpoint("/does/not/exist").unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaResolution(SchemaResolutionError::PathNotFound { .. })
        ));
    }

    #[test]
    fn compiling_twice_is_byte_identical() {
        let b = builder();
        let first = b.compile_endpoint("/users/list").unwrap();
        let second = b.compile_endpoint("/users/list").unwrap();
        assert_eq!(first.source(), second.source());
    }

    #[test]
    fn compile_all_collects_per_endpoint_failures() {
        let document = ApiDocument::from_value(json!({
            "paths": {
                "/ok": {
                    "get": { "parameters": [] }
                },
                "/broken": {
                    "post": { "requestBody": { "content": {} } }
                }
            }
        }));
        let b = SdkBuilder::new("https://x", document);

        let (methods, failures) = b.compile_all();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "ok");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "/broken");
    }

    #[test]
    fn method_map_keys_use_exposed_names() {
        let mut internal = HashSet::new();
        internal.insert("list".to_string());
        let (map, failures) = builder().internal_functions(internal).build_method_map();

        assert!(failures.is_empty());
        assert!(map.contains_key("_list"));
        assert!(map.contains_key("create"));
    }

    #[test]
    fn written_module_contains_header_class_and_methods() {
        let mut buf = Vec::new();
        builder()
            .inherited_properties(vec!["api_key".to_string()])
            .write_python_module(
                &mut buf,
                "ApiClient",
                &["import requests".to_string()],
            )
            .unwrap();

        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("# This python file is auto-generated."));
        assert!(out.contains("import requests\n"));
        assert!(out.contains("class ApiClient:\n"));
        assert!(out.contains("\t\tself.api_key = api_key\n"));
        assert!(out.contains("\tdef list(self, page=1, **kwargs):\n"));
        assert!(out.contains("\tdef create(self, name, **kwargs):\n"));
        // Methods are indented one level inside the class body.
        assert!(out.contains("\n\t\treturn requests.get(\n"));
        assert!(out.contains("\n\t\treturn requests.post(\n"));
    }

    #[test]
    fn written_module_is_idempotent() {
        let b = builder();
        let mut first = Vec::new();
        let mut second = Vec::new();
        b.write_python_module(&mut first, "ApiClient", &[]).unwrap();
        b.write_python_module(&mut second, "ApiClient", &[]).unwrap();
        assert_eq!(first, second);
    }
}
