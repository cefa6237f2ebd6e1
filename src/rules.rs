//! Built-in string classifier and transformer
//!
//! These back the command-line tool and the integration tests. Library users
//! normally bring their own closures.

use crate::config::{ClassifierSection, TransformerSection};
use crate::error::TransformError;
use crate::pipeline::classify::{Classification, Classifier};
use crate::pipeline::transform::{TransformOutcome, Transformer};
use std::time::Duration;

/// Placeholder replaced by the item text in a transformer template
pub const ITEM_PLACEHOLDER: &str = "{item}";

/// Items starting with `waste_prefix` are waste; the waste value is the item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixClassifier {
    waste_prefix: String,
}

impl PrefixClassifier {
    pub fn new<S: Into<String>>(waste_prefix: S) -> Self {
        Self {
            waste_prefix: waste_prefix.into(),
        }
    }

    pub fn waste_prefix(&self) -> &str {
        &self.waste_prefix
    }
}

impl Default for PrefixClassifier {
    fn default() -> Self {
        Self::new("waste")
    }
}

impl From<&ClassifierSection> for PrefixClassifier {
    fn from(section: &ClassifierSection) -> Self {
        Self::new(section.waste_prefix.clone())
    }
}

impl Classifier<String, String> for PrefixClassifier {
    fn classify(&self, item: &String) -> Classification<String> {
        (!item.starts_with(&self.waste_prefix), item.clone()).into()
    }
}

/// Renders `template` with the item substituted for `{item}`
///
/// `delay` simulates a slow transform. Items starting with `fail_prefix`
/// (when set) fail instead of rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTransformer {
    template: String,
    delay: Duration,
    fail_prefix: Option<String>,
}

impl TemplateTransformer {
    pub fn new<S: Into<String>>(template: S) -> Self {
        Self {
            template: template.into(),
            delay: Duration::ZERO,
            fail_prefix: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_fail_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.fail_prefix = Some(prefix.into());
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, item: &str) -> String {
        self.template.replace(ITEM_PLACEHOLDER, item)
    }
}

impl Default for TemplateTransformer {
    fn default() -> Self {
        Self::new("recycled goods from {item}")
    }
}

impl From<&TransformerSection> for TemplateTransformer {
    fn from(section: &TransformerSection) -> Self {
        let transformer = Self::new(section.template.clone())
            .with_delay(Duration::from_millis(section.delay_ms));
        match &section.fail_prefix {
            Some(prefix) => transformer.with_fail_prefix(prefix.clone()),
            None => transformer,
        }
    }
}

impl Transformer<String, String> for TemplateTransformer {
    fn transform(&self, item: String) -> TransformOutcome<String> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if let Some(prefix) = &self.fail_prefix {
            if item.starts_with(prefix.as_str()) {
                return Err(TransformError::failed(format!(
                    "item '{item}' matches failure prefix '{prefix}'"
                )));
            }
        }
        Ok(self.render(&item))
    }
}
