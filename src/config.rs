//! Pipeline configuration
//!
//! Loaded from TOML. Every section is optional and falls back to the built-in
//! string rules, so an empty file is a valid configuration.

use crate::rules::ITEM_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub classifier: ClassifierSection,
    #[serde(default)]
    pub transformer: TransformerSection,
}

/// Pipeline identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// Name used in logs (must match [a-zA-Z0-9._-]+)
    #[serde(default = "default_pipeline_name")]
    pub name: String,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
        }
    }
}

fn default_pipeline_name() -> String {
    "waste-manager".to_string()
}

/// Prefix classifier settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierSection {
    /// Items starting with this prefix are waste
    #[serde(default = "default_waste_prefix")]
    pub waste_prefix: String,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            waste_prefix: default_waste_prefix(),
        }
    }
}

fn default_waste_prefix() -> String {
    "waste".to_string()
}

/// Template transformer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransformerSection {
    /// Output template; `{item}` is replaced by the item text
    #[serde(default = "default_template")]
    pub template: String,
    /// Simulated per-item latency in milliseconds
    #[serde(default)]
    pub delay_ms: u64,
    /// Items starting with this prefix fail to transform
    pub fail_prefix: Option<String>,
}

impl Default for TransformerSection {
    fn default() -> Self {
        Self {
            template: default_template(),
            delay_ms: 0,
            fail_prefix: None,
        }
    }
}

fn default_template() -> String {
    "recycled goods from {item}".to_string()
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid pipeline name: {0}")]
    InvalidName(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.pipeline.name)?;

        if self.classifier.waste_prefix.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "classifier.waste_prefix must not be empty".to_string(),
            ));
        }

        if !self.transformer.template.contains(ITEM_PLACEHOLDER) {
            return Err(ConfigError::InvalidConfig(format!(
                "transformer.template must contain {ITEM_PLACEHOLDER}"
            )));
        }

        if matches!(&self.transformer.fail_prefix, Some(prefix) if prefix.is_empty()) {
            return Err(ConfigError::InvalidConfig(
                "transformer.fail_prefix must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if name.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidName(format!(
            "Pipeline name '{name}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[pipeline]
name = "sorting-line.2"

[classifier]
waste_prefix = "junk"

[transformer]
template = "refurbished {item}"
delay_ms = 25
fail_prefix = "broken"
"#;

        let config = PipelineConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.pipeline.name, "sorting-line.2");
        assert_eq!(config.classifier.waste_prefix, "junk");
        assert_eq!(config.transformer.template, "refurbished {item}");
        assert_eq!(config.transformer.delay_ms, 25);
        assert_eq!(config.transformer.fail_prefix.as_deref(), Some("broken"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.pipeline.name, "waste-manager");
        assert_eq!(config.classifier.waste_prefix, "waste");
        assert_eq!(config.transformer.template, "recycled goods from {item}");
        assert_eq!(config.transformer.delay_ms, 0);
        assert_eq!(config.transformer.fail_prefix, None);
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
[transformer]
delay_ms = 5
"#,
        )
        .unwrap();
        assert_eq!(config.transformer.template, "recycled goods from {item}");
        assert_eq!(config.transformer.delay_ms, 5);
    }

    #[test]
    fn test_invalid_name() {
        assert!(validate_name("bad name").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("good-name_1.0").is_ok());
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let result = PipelineConfig::from_toml_str(
            r#"
[transformer]
template = "constant"
"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_waste_prefix_rejected() {
        let result = PipelineConfig::from_toml_str(
            r#"
[classifier]
waste_prefix = ""
"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_fail_prefix_rejected() {
        let result = PipelineConfig::from_toml_str(
            r#"
[transformer]
fail_prefix = ""
"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = PipelineConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }
}
