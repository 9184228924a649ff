//! `OpenAPI` -> tool schema conversion.
//!
//! Turns the operations of an `OpenAPI` v3.0/v3.1 document into self-contained tool definitions
//! for model-driven invocation. Every tool gets a bounded unique name, a description, a flat
//! object input schema and an optional return schema; each schema carries the minimal `$defs`
//! block its local pointers need.
//!
//! The crate is synchronous and does no I/O. Loading the document and wiring the output into a
//! transport is the caller's job (see the `unrelated-openapi-schema` binary).
//!
//! ```no_run
//! use unrelated_openapi_schema::{ConverterConfig, SchemaDocument, build_tool_set};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = SchemaDocument::from_yaml_str(&std::fs::read_to_string("openapi.yaml")?)?;
//! let tools = build_tool_set(&document, &ConverterConfig::default());
//! for tool in tools.function_tools() {
//!     println!("{}", tool.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod closure;
pub mod config;
pub mod context;
pub mod convert;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod filter;
pub mod mcp;
pub mod naming;
pub mod operation;
pub mod pointer;
pub mod resolver;
pub mod schema;
pub mod tool;
pub mod toolset;
mod visit;

pub use config::{BrandingRule, ConverterConfig, FilterConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingDiagnostics};
pub use document::{HttpMethod, SchemaDocument};
pub use filter::OperationFilter;
pub use schema::SchemaNode;
pub use tool::{ToolMethod, ToolSchema};
pub use toolset::{
    FunctionTool, ToolRegistry, ToolSet, ToolSetBuilder, ToolUseTool, build_tool_set,
};
