//! MCP projection.
//!
//! Same compiled model as the other projections, rendered as `rmcp` [`Tool`]s with annotations
//! derived from HTTP method semantics.

use crate::document::HttpMethod;
use crate::pointer::DEFS_KEY;
use crate::tool::ToolSchema;
use crate::toolset::ToolSet;
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde_json::{Value, json};
use std::sync::Arc;

/// MCP tool annotations from RFC 9110-style method semantics.
///
/// `openWorldHint` is always `true`: every tool stands for a call into an external system.
#[must_use]
pub fn annotations_for_method(method: HttpMethod) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match method {
        HttpMethod::Get => (true, false, Some(true)),
        HttpMethod::Post => (false, false, Some(false)),
        HttpMethod::Put | HttpMethod::Delete => (false, true, Some(true)),
        // PATCH may or may not be idempotent; do not guess.
        HttpMethod::Patch => (false, true, None),
    };

    ToolAnnotations {
        title: None,
        read_only_hint: Some(read_only),
        destructive_hint: Some(destructive),
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}

impl ToolSet {
    /// The tool set as MCP tools.
    #[must_use]
    pub fn mcp_tools(&self) -> Vec<Tool> {
        self.compiled()
            .iter()
            .map(|compiled| {
                let method = &compiled.tool;
                let input = match method.input_schema().to_value() {
                    Value::Object(obj) => obj,
                    _ => JsonObject::new(),
                };
                let mut tool = Tool::new(
                    method.name().to_string(),
                    method.description().to_string(),
                    Arc::new(input),
                );
                tool.output_schema = method.return_schema().and_then(output_schema);
                tool.annotations = Some(annotations_for_method(compiled.method));
                tool
            })
            .collect()
    }
}

/// MCP requires an object at the root of an output schema. Anything else is wrapped as the
/// `body` property, with `$defs` moved up so local pointers still resolve from the root.
fn output_schema(schema: &ToolSchema) -> Option<Arc<JsonObject>> {
    let Value::Object(mut root) = schema.to_value() else {
        return None;
    };
    if root.get("type").and_then(Value::as_str) == Some("object") {
        return Some(Arc::new(root));
    }

    let defs = root.remove(DEFS_KEY);
    let mut wrapped = JsonObject::new();
    wrapped.insert("type".to_string(), json!("object"));
    wrapped.insert("required".to_string(), json!(["body"]));
    wrapped.insert(
        "properties".to_string(),
        json!({ "body": Value::Object(root) }),
    );
    if let Some(defs) = defs {
        wrapped.insert(DEFS_KEY.to_string(), defs);
    }
    Some(Arc::new(wrapped))
}
