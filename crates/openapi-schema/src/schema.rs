//! Schema node model.
//!
//! A [`SchemaNode`] is either a [`Reference`] (a `$ref` pointer plus an optional description) or a
//! [`Concrete`] node. The same type represents both the `OpenAPI` input and the converted output;
//! conversion only changes which fields are populated.
//!
//! Parsing is lenient by construction: anything that is not a JSON object becomes an empty
//! (unconstrained) concrete node, and fields of the wrong JSON type are ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

/// A schema node: either a pointer to a schema defined elsewhere, or a concrete schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Reference(Reference),
    Concrete(Box<Concrete>),
}

/// A `$ref` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub pointer: String,
    pub description: Option<String>,
}

/// A concrete (non-`$ref`) schema node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Concrete {
    pub schema_type: Option<SchemaType>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub enumeration: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub properties: Option<IndexMap<String, SchemaNode>>,
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,
    pub items: Option<Items>,
    pub one_of: Vec<SchemaNode>,
    pub any_of: Vec<SchemaNode>,
    pub all_of: Vec<SchemaNode>,
}

/// The `type` keyword: a single type name, or a list of them (`OpenAPI` 3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Single(String),
    Union(Vec<String>),
}

/// The `additionalProperties` keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// The `items` keyword: one schema for every element, or a positional (tuple) list.
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    Single(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

impl SchemaNode {
    /// A `$ref` node without description.
    #[must_use]
    pub fn reference(pointer: impl Into<String>) -> Self {
        SchemaNode::Reference(Reference {
            pointer: pointer.into(),
            description: None,
        })
    }

    /// A concrete node with only `type` set.
    #[must_use]
    pub fn of_type(type_name: &str) -> Self {
        SchemaNode::Concrete(Box::new(Concrete {
            schema_type: Some(SchemaType::Single(type_name.to_string())),
            ..Concrete::default()
        }))
    }

    #[must_use]
    pub fn as_concrete(&self) -> Option<&Concrete> {
        match self {
            SchemaNode::Concrete(c) => Some(c),
            SchemaNode::Reference(_) => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            SchemaNode::Reference(r) => Some(r),
            SchemaNode::Concrete(_) => None,
        }
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            SchemaNode::Reference(r) => r.description.as_deref(),
            SchemaNode::Concrete(c) => c.description.as_deref(),
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = Some(description.into());
        match self {
            SchemaNode::Reference(r) => r.description = description,
            SchemaNode::Concrete(c) => c.description = description,
        }
    }

    /// Whether this node is an object with declared properties, i.e. whether its properties can
    /// be spread into a flat argument list.
    #[must_use]
    pub fn is_flat_object(&self) -> bool {
        self.as_concrete().is_some_and(|c| {
            c.properties.is_some() && (c.has_type("object") || c.schema_type.is_none())
        })
    }

    /// Parse a node from a JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return SchemaNode::Concrete(Box::default());
        };

        if let Some(pointer) = obj.get("$ref").and_then(Value::as_str) {
            return SchemaNode::Reference(Reference {
                pointer: pointer.to_string(),
                description: string_field(obj, "description"),
            });
        }

        SchemaNode::Concrete(Box::new(Concrete::from_object(obj)))
    }

    /// Render this node as JSON Schema.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            SchemaNode::Reference(r) => {
                let mut out = Map::new();
                out.insert("$ref".to_string(), json!(r.pointer));
                if let Some(desc) = &r.description {
                    out.insert("description".to_string(), json!(desc));
                }
                Value::Object(out)
            }
            SchemaNode::Concrete(c) => Value::Object(c.to_object()),
        }
    }
}

impl Concrete {
    #[must_use]
    pub fn has_type(&self, type_name: &str) -> bool {
        match &self.schema_type {
            Some(SchemaType::Single(t)) => t == type_name,
            Some(SchemaType::Union(ts)) => ts.iter().any(|t| t == type_name),
            None => false,
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let schema_type = match obj.get("type") {
            Some(Value::String(t)) => Some(SchemaType::Single(t.clone())),
            Some(Value::Array(ts)) => Some(SchemaType::Union(
                ts.iter().filter_map(Value::as_str).map(str::to_string).collect(),
            )),
            _ => None,
        };

        let properties = obj.get("properties").and_then(Value::as_object).map(|props| {
            props
                .iter()
                .map(|(name, schema)| (name.clone(), SchemaNode::from_value(schema)))
                .collect()
        });

        let required = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let additional_properties = match obj.get("additionalProperties") {
            Some(Value::Bool(b)) => Some(AdditionalProperties::Allowed(*b)),
            Some(v @ Value::Object(_)) => Some(AdditionalProperties::Schema(Box::new(
                SchemaNode::from_value(v),
            ))),
            _ => None,
        };

        let items = match obj.get("items") {
            Some(Value::Array(list)) => {
                Some(Items::Tuple(list.iter().map(SchemaNode::from_value).collect()))
            }
            Some(v @ Value::Object(_)) => Some(Items::Single(Box::new(SchemaNode::from_value(v)))),
            _ => None,
        };

        Concrete {
            schema_type,
            format: string_field(obj, "format"),
            description: string_field(obj, "description"),
            enumeration: obj.get("enum").and_then(Value::as_array).cloned(),
            default: obj.get("default").cloned(),
            properties,
            required,
            additional_properties,
            items,
            one_of: schema_list(obj, "oneOf"),
            any_of: schema_list(obj, "anyOf"),
            all_of: schema_list(obj, "allOf"),
        }
    }

    fn to_object(&self) -> Map<String, Value> {
        let mut out = Map::new();

        match &self.schema_type {
            Some(SchemaType::Single(t)) => {
                out.insert("type".to_string(), json!(t));
            }
            Some(SchemaType::Union(ts)) => {
                out.insert("type".to_string(), json!(ts));
            }
            None => {}
        }
        if let Some(format) = &self.format {
            out.insert("format".to_string(), json!(format));
        }
        if let Some(desc) = &self.description {
            out.insert("description".to_string(), json!(desc));
        }
        if let Some(values) = &self.enumeration {
            out.insert("enum".to_string(), Value::Array(values.clone()));
        }
        if let Some(default) = &self.default {
            out.insert("default".to_string(), default.clone());
        }
        if let Some(props) = &self.properties {
            let props: Map<String, Value> = props
                .iter()
                .map(|(name, schema)| (name.clone(), schema.to_value()))
                .collect();
            out.insert("properties".to_string(), Value::Object(props));
        }
        if !self.required.is_empty() {
            out.insert("required".to_string(), json!(self.required));
        }
        match &self.additional_properties {
            Some(AdditionalProperties::Allowed(b)) => {
                out.insert("additionalProperties".to_string(), json!(b));
            }
            Some(AdditionalProperties::Schema(s)) => {
                out.insert("additionalProperties".to_string(), s.to_value());
            }
            None => {}
        }
        match &self.items {
            Some(Items::Single(s)) => {
                out.insert("items".to_string(), s.to_value());
            }
            Some(Items::Tuple(list)) => {
                out.insert(
                    "items".to_string(),
                    Value::Array(list.iter().map(SchemaNode::to_value).collect()),
                );
            }
            None => {}
        }
        for (key, list) in [
            ("oneOf", &self.one_of),
            ("anyOf", &self.any_of),
            ("allOf", &self.all_of),
        ] {
            if !list.is_empty() {
                out.insert(
                    key.to_string(),
                    Value::Array(list.iter().map(SchemaNode::to_value).collect()),
                );
            }
        }

        out
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn schema_list(obj: &Map<String, Value>, key: &str) -> Vec<SchemaNode> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|list| list.iter().map(SchemaNode::from_value).collect())
        .unwrap_or_default()
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(SchemaNode::from_value(&value))
    }
}
