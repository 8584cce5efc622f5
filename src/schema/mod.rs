//! Declarative schema: which sections and keys exist, their kinds, defaults,
//! descriptions and rules.
//!
//! The schema is the source of truth for the key set of a
//! [`ConfigStore`](crate::ConfigStore). It seeds defaults, drives per-key
//! parsing while loading, and is rendered into a fresh commented file by
//! [`generate_config`] when none exists yet.
//!
//! ## Example
//!
//! ```
//! use typed_ini::{Kind, Rule, Schema, SchemaItem, SchemaSection};
//!
//! let schema = Schema::new()
//!     .section(
//!         SchemaSection::new("ABT")
//!             .item(
//!                 SchemaItem::new("kor", Kind::Float, "500.0", "ABT kor value")
//!                     .with_rule(Rule::AlwaysPositive),
//!             )
//!             .item(SchemaItem::new("koh", Kind::Integer, "1", "ABT koh value")),
//!     );
//!
//! assert!(schema.validate().is_ok());
//! assert_eq!(schema.find("ABT", "koh").map(|item| item.kind), Some(Kind::Integer));
//! ```

mod document;
mod generate;

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{ConfigError, Kind, Rule, Value};

pub use generate::generate_config;

/// One declared key.
#[derive(Debug, Clone)]
pub struct SchemaItem {
    pub name: String,
    pub kind: Kind,
    /// Default value as it would be written in the file.
    pub default: String,
    pub description: String,
    pub rule: Option<Arc<Rule>>,
}

impl SchemaItem {
    pub fn new(
        name: impl Into<String>,
        kind: Kind,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            default: default.into(),
            description: description.into(),
            rule: None,
        }
    }

    /// Attaches a rule. Pass an `Arc<Rule>` to share one rule across items.
    pub fn with_rule(mut self, rule: impl Into<Arc<Rule>>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Parses the default text and checks it against the item's own rule.
    pub fn default_value(&self) -> Result<Value, ConfigError> {
        let value = Value::parse(self.kind, &self.default)?;
        match &self.rule {
            Some(rule) if !rule.evaluate(&value) => Err(ConfigError::Validation {
                key: self.name.clone(),
                rule: rule.describe(),
            }),
            _ => Ok(value),
        }
    }
}

/// A declared `[Section]` and its items, in declaration order.
#[derive(Debug, Clone)]
pub struct SchemaSection {
    pub name: String,
    pub items: Vec<SchemaItem>,
}

impl SchemaSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn item(mut self, item: SchemaItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn find(&self, key: &str) -> Option<&SchemaItem> {
        self.items.iter().find(|item| item.name == key)
    }
}

/// Ordered set of declared sections.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    sections: Vec<SchemaSection>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, section: SchemaSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn sections(&self) -> &[SchemaSection] {
        &self.sections
    }

    /// Looks up the declaration for `key` in `section`.
    pub fn find(&self, section: &str, key: &str) -> Option<&SchemaItem> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .and_then(|s| s.find(key))
    }

    /// Checks the schema for authoring defects.
    ///
    /// Fails on duplicate section names, duplicate keys within a section,
    /// and defaults that do not parse as their kind or fail their own rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_sections = HashSet::new();
        for section in &self.sections {
            if !seen_sections.insert(section.name.as_str()) {
                return Err(ConfigError::DuplicateSection(section.name.clone()));
            }

            let mut seen_keys = HashSet::new();
            for item in &section.items {
                if !seen_keys.insert(item.name.as_str()) {
                    return Err(ConfigError::DuplicateKey {
                        section: section.name.clone(),
                        key: item.name.clone(),
                    });
                }
                item.default_value()
                    .map_err(|e| invalid_default(&section.name, &item.name, e))?;
            }
        }
        Ok(())
    }
}

pub(crate) fn invalid_default(section: &str, key: &str, source: ConfigError) -> ConfigError {
    ConfigError::InvalidDefault {
        section: section.to_string(),
        key: key.to_string(),
        source: Box::new(source),
    }
}
