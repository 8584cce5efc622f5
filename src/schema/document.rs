//! Schemas declared in TOML documents.
//!
//! ```toml
//! [[section]]
//! name = "ABT"
//!
//! [[section.item]]
//! name = "kor"
//! kind = "float"
//! default = 500.0
//! description = "ABT kor value"
//! rule = { type = "always_positive" }
//! ```
//!
//! `default` may be written as a string or as a native TOML number or array
//! of numbers. Custom rules cannot be declared in a document; attach them to
//! the loaded [`Schema`] programmatically.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::{Schema, SchemaItem, SchemaSection};
use crate::config::{ConfigError, Kind, Rule, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    #[serde(default)]
    section: Vec<SectionDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionDocument {
    name: String,
    #[serde(default)]
    item: Vec<ItemDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemDocument {
    name: String,
    kind: Kind,
    default: toml::Value,
    #[serde(default)]
    description: String,
    rule: Option<Rule>,
}

impl Schema {
    /// Parses and validates a schema from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let document: SchemaDocument = toml::from_str(text)?;
        let schema = document.into_schema();
        schema.validate()?;
        Ok(schema)
    }

    /// Reads, parses and validates a schema document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::SchemaRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }
}

impl SchemaDocument {
    fn into_schema(self) -> Schema {
        self.section
            .into_iter()
            .fold(Schema::new(), |schema, section| {
                schema.section(section.into_section())
            })
    }
}

impl SectionDocument {
    fn into_section(self) -> SchemaSection {
        self.item
            .into_iter()
            .fold(SchemaSection::new(self.name), |section, item| {
                section.item(item.into_item())
            })
    }
}

impl ItemDocument {
    fn into_item(self) -> SchemaItem {
        let mut item = SchemaItem::new(
            self.name,
            self.kind,
            default_text(&self.default),
            self.description,
        );
        item.rule = self.rule.map(Arc::new);
        item
    }
}

/// Renders a TOML default the way it would be written in the config file.
fn default_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => Value::Float(*f).to_text(),
        toml::Value::Array(items) => items
            .iter()
            .map(default_text)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
