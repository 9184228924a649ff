//! Whole-document conversion and its projections.
//!
//! [`ToolSetBuilder::build`] walks every `path x method`, filters, compiles, and collects the
//! results into one [`ToolSet`]. The registry, function-call list, tool-use list and MCP list are
//! all read off that one compiled set, so names, descriptions and schemas agree across them.

use crate::config::ConverterConfig;
use crate::context::ConversionContext;
use crate::convert::SchemaConverter;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingDiagnostics};
use crate::document::{HttpMethod, Operation, SchemaDocument, path_item_parameters};
use crate::filter::OperationFilter;
use crate::operation::{OperationCompiler, OperationTarget};
use crate::tool::ToolMethod;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

pub struct ToolSetBuilder<'a> {
    document: &'a SchemaDocument,
    config: &'a ConverterConfig,
    filter: &'a dyn OperationFilter,
}

impl<'a> ToolSetBuilder<'a> {
    /// A builder that filters with `config.filter`.
    #[must_use]
    pub fn new(document: &'a SchemaDocument, config: &'a ConverterConfig) -> Self {
        Self {
            document,
            config,
            filter: &config.filter,
        }
    }

    /// Replace the configured filter.
    #[must_use]
    pub fn with_filter(mut self, filter: &'a dyn OperationFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run one conversion. Every call starts from a fresh context, so repeated builds of the same
    /// document produce identical tool sets.
    pub fn build(&self, sink: &mut dyn DiagnosticSink) -> ToolSet {
        let mut ctx = ConversionContext::new(self.document, self.config, sink);
        SchemaConverter::new(&mut ctx).build_component_table();

        let mut tools = Vec::new();
        for (path, item) in self.document.paths() {
            let path_parameters = path_item_parameters(item);

            for method in HttpMethod::ALL {
                let Some(raw) = item.iter().find_map(|(key, value)| {
                    (HttpMethod::parse(key) == Some(method)).then_some(value)
                }) else {
                    continue;
                };
                if !raw.is_object() {
                    tracing::debug!(method = %method, path = %path, "skipping non-object operation");
                    continue;
                }

                let operation_id = raw.get("operationId").and_then(Value::as_str);
                if !self.filter.should_include(operation_id, path) {
                    tracing::debug!(
                        method = %method,
                        path = %path,
                        operation_id = operation_id.unwrap_or_default(),
                        "operation excluded by filter"
                    );
                    continue;
                }

                let operation: Operation = match serde_json::from_value(raw.clone()) {
                    Ok(operation) => operation,
                    Err(e) => {
                        ctx.report(Diagnostic::MalformedOperation {
                            method: method.to_string(),
                            path: path.to_string(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                };

                let target = OperationTarget {
                    method,
                    path,
                    operation: &operation,
                    path_parameters: &path_parameters,
                };
                let Some(tool) = OperationCompiler::new(&mut ctx).compile(&target) else {
                    continue;
                };

                tools.push(CompiledTool {
                    key: format!("{}-{}", self.config.api_name, tool.name()),
                    method,
                    path: path.to_string(),
                    operation: raw.clone(),
                    tool,
                });
            }
        }

        tracing::info!(
            api = %self.config.api_name,
            tools = tools.len(),
            diagnostics = ctx.reported(),
            "converted OpenAPI document"
        );

        ToolSet {
            api_name: self.config.api_name.clone(),
            tools,
        }
    }
}

/// Convert a document with its configured filter, logging diagnostics through `tracing`.
#[must_use]
pub fn build_tool_set(document: &SchemaDocument, config: &ConverterConfig) -> ToolSet {
    ToolSetBuilder::new(document, config).build(&mut TracingDiagnostics)
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledTool {
    pub(crate) key: String,
    pub(crate) method: HttpMethod,
    pub(crate) path: String,
    pub(crate) operation: Value,
    pub(crate) tool: ToolMethod,
}

/// The compiled tools of one run, in document order.
#[derive(Debug, Clone)]
pub struct ToolSet {
    api_name: String,
    tools: Vec<CompiledTool>,
}

impl ToolSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tools(&self) -> impl Iterator<Item = &ToolMethod> {
        self.tools.iter().map(|compiled| &compiled.tool)
    }

    pub(crate) fn compiled(&self) -> &[CompiledTool] {
        &self.tools
    }

    /// Provider-neutral registry.
    #[must_use]
    pub fn registry(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::default();
        let bucket = registry
            .tools_by_api
            .entry(self.api_name.clone())
            .or_default();
        for compiled in &self.tools {
            bucket.push(compiled.tool.clone());
        }

        for compiled in &self.tools {
            registry.operation_lookup.insert(
                compiled.key.clone(),
                OperationRef {
                    operation: compiled.operation.clone(),
                    method: compiled.method,
                    path: compiled.path.clone(),
                },
            );
            registry.pairing.insert(
                compiled.key.clone(),
                ToolPairing {
                    operation: compiled.operation.clone(),
                    tool: compiled.tool.clone(),
                },
            );
        }
        registry
    }

    /// `{name, description, parameters}` entries.
    #[must_use]
    pub fn function_tools(&self) -> Vec<FunctionTool> {
        self.tools()
            .map(|tool| FunctionTool {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.input_schema().to_value(),
            })
            .collect()
    }

    /// `{name, description, input_schema}` entries.
    #[must_use]
    pub fn tool_use_tools(&self) -> Vec<ToolUseTool> {
        self.tools()
            .map(|tool| ToolUseTool {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema().to_value(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRegistry {
    pub tools_by_api: IndexMap<String, Vec<ToolMethod>>,
    pub operation_lookup: IndexMap<String, OperationRef>,
    pub pairing: IndexMap<String, ToolPairing>,
}

/// Where a tool came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRef {
    /// The raw operation object as it appears in the document.
    pub operation: Value,
    pub method: HttpMethod,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolPairing {
    pub operation: Value,
    pub tool: ToolMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionTool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUseTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}
