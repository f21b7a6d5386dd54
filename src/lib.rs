//! Auto-generate a thin SDK client from an OpenAPI document.
//!
//! Walks an OpenAPI-style JSON document, resolves each endpoint's parameters
//! and effective defaults, and synthesizes one Python method per endpoint.
//! The same compilation also yields a structured dispatch plan, so every
//! method can be bound as a live callable that issues the request directly
//! via `reqwest` — no runtime source compilation involved.
//!
//! # Usage
//!
//! ```
//! use openapi_sdk_gen::{ApiDocument, SdkBuilder};
//!
//! let document = ApiDocument::from_value(serde_json::json!({
//!     "paths": {
//!         "/users/list": {
//!             "get": {
//!                 "summary": "List users",
//!                 "parameters": [
//!                     { "name": "page", "schema": { "default": 1 } }
//!                 ]
//!             }
//!         }
//!     }
//! }));
//!
//! let builder = SdkBuilder::new("https://api.example.com", document);
//! let method = builder.compile_endpoint("/users/list").unwrap();
//! assert_eq!(method.signature, "\tdef list(self, page=1, **kwargs):");
//!
//! let (methods, failures) = builder.build_method_map();
//! assert!(failures.is_empty());
//! assert!(methods.contains_key("list"));
//! ```

pub mod bind;
pub mod builder;
pub mod defaults;
pub mod document;
pub mod error;
pub mod synth;
pub mod writer;

pub use bind::{bind, BoundMethod};
pub use builder::SdkBuilder;
pub use defaults::{python_literal, resolve_default, Overrides, ResolvedDefault};
pub use document::{ApiDocument, Endpoint, ParamDescriptor, ResponseKind, Verb};
pub use error::{
    BindingError, CompilationError, DispatchError, Error, SchemaResolutionError,
    UnsupportedVerbError,
};
pub use synth::{GeneratedMethod, Indent, MethodPlan, ParamSlot, ParamSource, Synthesizer};
pub use writer::ModuleWriter;

// Re-export dependencies for downstream crates
pub use reqwest;
pub use serde_json;
