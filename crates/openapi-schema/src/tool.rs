//! Compiled tool records.

use crate::pointer::DEFS_KEY;
use crate::schema::SchemaNode;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A converted schema together with the local definitions its pointers resolve against.
///
/// Serializes as the schema with a `$defs` key merged into the root object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    pub schema: SchemaNode,
    pub defs: Option<IndexMap<String, SchemaNode>>,
}

impl ToolSchema {
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut value = self.schema.to_value();
        if let (Some(defs), Value::Object(root)) = (&self.defs, &mut value) {
            let defs: Map<String, Value> = defs
                .iter()
                .map(|(name, schema)| (name.clone(), schema.to_value()))
                .collect();
            root.insert(DEFS_KEY.to_string(), Value::Object(defs));
        }
        value
    }
}

impl Serialize for ToolSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// One callable tool compiled from one HTTP operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMethod {
    name: String,
    description: String,
    input_schema: ToolSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_schema: Option<ToolSchema>,
}

impl ToolMethod {
    pub(crate) fn new(
        name: String,
        description: String,
        input_schema: ToolSchema,
        return_schema: Option<ToolSchema>,
    ) -> Self {
        Self {
            name,
            description,
            input_schema,
            return_schema,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn input_schema(&self) -> &ToolSchema {
        &self.input_schema
    }

    #[must_use]
    pub fn return_schema(&self) -> Option<&ToolSchema> {
        self.return_schema.as_ref()
    }
}
