use std::path::PathBuf;
use thiserror::Error;

use super::value::Kind;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot parse '{text}' as {kind}")]
    Parse { kind: Kind, text: String },

    #[error("value for '{key}' rejected: {rule}")]
    Validation { key: String, rule: String },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("section not found: {0}")]
    SectionNotFound(String),

    #[error("type mismatch for '{key}': requested {expected}, stored {found}")]
    TypeMismatch {
        key: String,
        expected: Kind,
        found: Kind,
    },

    #[error("config file I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot save [{section}] {key}: {reason}")]
    NotSaveable {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid schema default for [{section}] {key}: {source}")]
    InvalidDefault {
        section: String,
        key: String,
        source: Box<ConfigError>,
    },

    #[error("duplicate schema section: {0}")]
    DuplicateSection(String),

    #[error("duplicate schema key: [{section}] {key}")]
    DuplicateKey { section: String, key: String },

    #[error("unknown value kind: {0}")]
    UnknownKind(String),

    #[error("failed to read schema file '{path}': {source}")]
    SchemaRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse schema document: {0}")]
    SchemaParse(#[from] toml::de::Error),
}
