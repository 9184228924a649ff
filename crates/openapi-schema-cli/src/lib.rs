//! Command-line front end: load an `OpenAPI` document, convert it, render one projection as JSON.
//!
//! All schema logic lives in `unrelated-openapi-schema`; this crate only does file I/O and
//! argument handling.

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use unrelated_openapi_schema::{ConverterConfig, SchemaDocument, build_tool_set};

#[derive(Debug, Parser)]
#[command(
    name = "unrelated-openapi-schema",
    version,
    about = "Convert an OpenAPI document into tool schemas"
)]
pub struct Cli {
    /// `OpenAPI` v3.0/v3.1 document (YAML or JSON).
    #[arg(long, env = "OPENAPI_SCHEMA_SPEC")]
    pub spec: PathBuf,

    /// Converter config (YAML or JSON). Defaults apply when omitted.
    #[arg(long, env = "OPENAPI_SCHEMA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Which projection to print.
    #[arg(long, value_enum, default_value_t = Projection::Registry)]
    pub format: Projection,

    /// Override `apiName` from the config.
    #[arg(long)]
    pub api_name: Option<String>,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Projection {
    /// `{toolsByApi, operationLookup, pairing}`.
    Registry,
    /// `[{name, description, parameters}]`.
    Function,
    /// `[{name, description, input_schema}]`.
    ToolUse,
    /// MCP `Tool` list.
    Mcp,
}

/// Load the converter config, applying CLI overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the resulting config is invalid.
pub fn load_config(
    path: Option<&Path>,
    api_name: Option<&str>,
) -> anyhow::Result<ConverterConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            ConverterConfig::from_yaml_str(&text)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => ConverterConfig::default(),
    };
    if let Some(api_name) = api_name {
        config.api_name = api_name.to_string();
        config.validate().context("apply --api-name")?;
    }
    Ok(config)
}

/// # Errors
///
/// Returns an error if the file cannot be read or is not an `OpenAPI`-shaped document.
pub fn load_document(path: &Path) -> anyhow::Result<SchemaDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read OpenAPI document {}", path.display()))?;
    SchemaDocument::from_yaml_str(&text)
        .with_context(|| format!("parse OpenAPI document {}", path.display()))
}

/// Run one conversion and render the requested projection.
///
/// # Errors
///
/// Returns an error if loading fails or the output cannot be serialized.
pub fn render(cli: &Cli) -> anyhow::Result<String> {
    let config = load_config(cli.config.as_deref(), cli.api_name.as_deref())?;
    let document = load_document(&cli.spec)?;
    let tools = build_tool_set(&document, &config);

    let value = match cli.format {
        Projection::Registry => serde_json::to_value(tools.registry()),
        Projection::Function => serde_json::to_value(tools.function_tools()),
        Projection::ToolUse => serde_json::to_value(tools.tool_use_tools()),
        Projection::Mcp => serde_json::to_value(tools.mcp_tools()),
    }
    .context("serialize output")?;

    let rendered = if cli.compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    };
    rendered.context("render output")
}
