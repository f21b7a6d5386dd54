//! Error types for the openapi-sdk-gen crate.

use thiserror::Error;

/// A referenced path, verb, schema component, or required nested key is
/// absent from the document. Aborts compilation of the one endpoint that
/// referenced it; other endpoints may still compile.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaResolutionError {
    #[error("path not found in document: {path}")]
    PathNotFound { path: String },

    #[error("endpoint {path} declares no operations")]
    NoVerb { path: String },

    #[error("endpoint {path} declares multiple verbs ({verbs:?}); name the verb explicitly")]
    AmbiguousVerb { path: String, verbs: Vec<String> },

    #[error("endpoint {path} does not declare verb {verb}")]
    VerbNotDeclared { path: String, verb: String },

    #[error("endpoint {path} is missing required key: {key}")]
    MissingKey { path: String, key: String },

    #[error("unknown component schema: {name}")]
    UnknownComponent { name: String },

    #[error("endpoint {path} has unsupported response content type: {content_type}")]
    UnsupportedContentType { path: String, content_type: String },
}

/// Verb is neither read-style (`get`) nor write-style (`post`).
#[derive(Debug, Error)]
#[error("unsupported HTTP verb: {verb}")]
pub struct UnsupportedVerbError {
    pub verb: String,
}

/// Synthesized method text is not structurally valid source. Carries the
/// offending text for diagnosis.
#[derive(Debug, Error)]
#[error("synthesized text for {method} is not valid source ({reason}):\n{text}")]
pub struct CompilationError {
    pub method: String,
    pub reason: String,
    pub text: String,
}

/// Arity mismatch between synthesized default values and the defaulted
/// slots declared in the signature.
#[derive(Debug, Error)]
#[error("default arity mismatch for {method}: signature declares {expected} defaulted slots, \
         {actual} default values supplied")]
pub struct BindingError {
    pub method: String,
    pub expected: usize,
    pub actual: usize,
}

/// Top-level error for document loading and endpoint compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    SchemaResolution(#[from] SchemaResolutionError),

    #[error(transparent)]
    UnsupportedVerb(#[from] UnsupportedVerbError),

    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("failed to fetch document")]
    DocumentFetch(#[source] reqwest::Error),

    #[error("failed to read document from {path}")]
    DocumentRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document is not valid JSON")]
    DocumentParse(#[source] serde_json::Error),

    #[error("failed to write generated module")]
    Write(#[from] std::io::Error),
}

/// Errors that can occur when a bound method executes its request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("missing required argument: {name}")]
    MissingArgument { name: String },

    #[error("client instance has no property: {name}")]
    MissingProperty { name: String },

    #[error("HTTP request failed")]
    RequestFailed(#[source] reqwest::Error),

    #[error("failed to read response body")]
    ResponseRead(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpError {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response body is not valid JSON")]
    ResponseDecode(#[source] serde_json::Error),
}
