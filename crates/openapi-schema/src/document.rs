//! `OpenAPI` document model.
//!
//! The document is kept as raw JSON (so `$ref` pointers can be walked segment by segment) plus a
//! few typed views: the path table, `info.title`, and the parsed `components.schemas`.
//! Operations are parsed lazily, one at a time, so a single malformed operation degrades to a
//! diagnostic instead of failing the whole document.
//!
//! Only presence checks are made here; structural validation is the loader's job.

use crate::error::{OpenApiSchemaError, Result};
use crate::schema::SchemaNode;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A parsed `OpenAPI` v3.0/v3.1 document. Read-only to the conversion core.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    raw: Value,
    title: Option<String>,
    paths: IndexMap<String, Map<String, Value>>,
    schemas: IndexMap<String, SchemaNode>,
}

impl SchemaDocument {
    /// Build a document from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not an object, or if `paths` / `components.schemas` are
    /// present but not objects.
    pub fn from_value(raw: Value) -> Result<Self> {
        let root = raw.as_object().ok_or_else(|| {
            OpenApiSchemaError::OpenApi("document root must be an object".to_string())
        })?;

        let title = root
            .get("info")
            .and_then(|info| info.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let paths = match root.get("paths") {
            None | Some(Value::Null) => IndexMap::new(),
            Some(Value::Object(paths)) => paths
                .iter()
                .filter_map(|(path, item)| match item {
                    Value::Object(item) => Some((path.clone(), item.clone())),
                    _ => {
                        tracing::debug!(path = %path, "ignoring non-object path item");
                        None
                    }
                })
                .collect(),
            Some(_) => {
                return Err(OpenApiSchemaError::OpenApi(
                    "'paths' must be an object".to_string(),
                ));
            }
        };

        let schemas = match root.get("components").and_then(|c| c.get("schemas")) {
            None | Some(Value::Null) => IndexMap::new(),
            Some(Value::Object(schemas)) => schemas
                .iter()
                .map(|(name, schema)| (name.clone(), SchemaNode::from_value(schema)))
                .collect(),
            Some(_) => {
                return Err(OpenApiSchemaError::OpenApi(
                    "'components.schemas' must be an object".to_string(),
                ));
            }
        };

        Ok(Self {
            raw,
            title,
            paths,
            schemas,
        })
    }

    /// Parse a document from YAML or JSON text (JSON is a subset of YAML).
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML/JSON, or if [`Self::from_value`] rejects it.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: Value = serde_yaml::from_str(text)?;
        Self::from_value(raw)
    }

    /// The whole document as JSON.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// `info.title`, if present.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Path items in document order.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.paths.iter().map(|(path, item)| (path.as_str(), item))
    }

    /// `components.schemas` in document order.
    #[must_use]
    pub fn schemas(&self) -> &IndexMap<String, SchemaNode> {
        &self.schemas
    }
}

/// HTTP methods that carry convertible operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Iteration order used when walking a path item.
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
        }
    }

    /// Case-insensitive lookup of a path-item key.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Either a `$ref` or an inline item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReferenceOr<T> {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

/// One operation under a path item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_parameters")]
    pub parameters: Vec<ReferenceOr<Parameter>>,
    #[serde(default)]
    pub request_body: Option<ReferenceOr<RequestBody>>,
    /// Keyed by status code. Extension keys (`x-*`) and entries that are not a response are
    /// dropped.
    #[serde(default, deserialize_with = "lenient_responses")]
    pub responses: IndexMap<String, ReferenceOr<Response>>,
}

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema: Option<SchemaNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<SchemaNode>,
}

/// Parameters declared on a path item (shared by every operation under it).
///
/// Entries that do not parse as a parameter or a `$ref` are skipped.
#[must_use]
pub fn path_item_parameters(item: &Map<String, Value>) -> Vec<ReferenceOr<Parameter>> {
    item.get("parameters")
        .map(parse_parameters)
        .unwrap_or_default()
}

fn parse_parameters(raw: &Value) -> Vec<ReferenceOr<Parameter>> {
    let Value::Array(params) = raw else {
        tracing::debug!("ignoring non-array parameter list");
        return Vec::new();
    };
    params
        .iter()
        .filter_map(|param| match serde_json::from_value(param.clone()) {
            Ok(param) => Some(param),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed parameter");
                None
            }
        })
        .collect()
}

fn lenient_parameters<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<ReferenceOr<Parameter>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_parameters(&raw))
}

fn lenient_responses<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, ReferenceOr<Response>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(raw) = Value::deserialize(deserializer)? else {
        tracing::debug!("ignoring non-object responses");
        return Ok(IndexMap::new());
    };
    Ok(raw
        .into_iter()
        .filter(|(code, _)| !code.starts_with("x-"))
        .filter_map(|(code, value)| match serde_json::from_value(value) {
            Ok(response) => Some((code, response)),
            Err(e) => {
                tracing::debug!(code = %code, error = %e, "ignoring malformed response");
                None
            }
        })
        .collect())
}

/// Pick the JSON media type: `application/json` first, then anything JSON-ish
/// (`application/problem+json`, `application/vnd.api+json`, ...).
#[must_use]
pub fn json_media_type(content: &IndexMap<String, MediaType>) -> Option<&MediaType> {
    content.get("application/json").or_else(|| {
        content
            .iter()
            .find_map(|(k, v)| k.to_ascii_lowercase().contains("json").then_some(v))
    })
}

/// Pick a `multipart/form-data` media type (with or without parameters such as a boundary).
#[must_use]
pub fn multipart_media_type(content: &IndexMap<String, MediaType>) -> Option<&MediaType> {
    content.iter().find_map(|(k, v)| {
        k.to_ascii_lowercase()
            .starts_with("multipart/form-data")
            .then_some(v)
    })
}

/// Whether any media type is an image.
#[must_use]
pub fn has_image_media_type(content: &IndexMap<String, MediaType>) -> bool {
    content
        .keys()
        .any(|k| k.to_ascii_lowercase().starts_with("image/"))
}
