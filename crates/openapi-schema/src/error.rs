//! Error types for `unrelated-openapi-schema`.
//!
//! Conversion itself never fails (degraded input becomes a [`crate::diagnostics::Diagnostic`]);
//! these errors only surface at the document and config boundary.

use thiserror::Error;

/// Main error type for schema conversion.
#[derive(Error, Debug)]
pub enum OpenApiSchemaError {
    /// Configuration errors (invalid config values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// `OpenAPI` document shape errors (root is not an object, malformed `paths`/`components`).
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// JSON parsing errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for schema conversion operations.
pub type Result<T> = std::result::Result<T, OpenApiSchemaError>;
