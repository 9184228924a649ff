use crate::error::{OpenApiSchemaError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for one document conversion run.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConverterConfig {
    /// Registry bucket name; also the prefix of every registry key.
    #[serde(default = "default_api_name")]
    pub api_name: String,

    /// Operation inclusion/exclusion.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Description prefixes keyed by document title.
    #[serde(default = "default_branding")]
    pub branding: Vec<BrandingRule>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            api_name: default_api_name(),
            filter: FilterConfig::default(),
            branding: default_branding(),
        }
    }
}

fn default_api_name() -> String {
    "API".to_string()
}

fn default_branding() -> Vec<BrandingRule> {
    vec![BrandingRule {
        title: "Notion API".to_string(),
        label: "Notion".to_string(),
    }]
}

impl ConverterConfig {
    /// Parse a config from YAML or JSON text and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or [`Self::validate`] rejects it.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`OpenApiSchemaError::Config`] for an empty `apiName`, an empty filter pattern, or
    /// a branding rule with an empty title or label.
    pub fn validate(&self) -> Result<()> {
        if self.api_name.trim().is_empty() {
            return Err(OpenApiSchemaError::Config(
                "apiName must not be empty".to_string(),
            ));
        }
        for pattern in self.filter.include.iter().chain(&self.filter.exclude) {
            if pattern.is_empty() {
                return Err(OpenApiSchemaError::Config(
                    "filter patterns must not be empty".to_string(),
                ));
            }
        }
        for rule in &self.branding {
            if rule.title.trim().is_empty() || rule.label.trim().is_empty() {
                return Err(OpenApiSchemaError::Config(format!(
                    "branding rule '{}' needs both a title and a label",
                    rule.title
                )));
            }
        }
        Ok(())
    }

    /// The branding label for a document title, if any rule matches (case-insensitive).
    #[must_use]
    pub fn branding_label(&self, title: Option<&str>) -> Option<&str> {
        let title = title?.trim();
        self.branding
            .iter()
            .find(|rule| rule.title.eq_ignore_ascii_case(title))
            .map(|rule| rule.label.as_str())
    }
}

/// Include/exclude glob patterns (`*`, `?`), matched against operation ids and paths.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BrandingRule {
    /// Document `info.title` this rule applies to.
    pub title: String,
    /// Prefix label, rendered as `"{label} | "`.
    pub label: String,
}
