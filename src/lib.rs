pub mod config;
mod error;
pub mod schema;

pub use config::{
    ConfigError, ConfigStore, ConfigStoreBuilder, ConfigType, CustomRule, Fallback, Kind,
    LoadReport, Rule, Section, Value,
};
pub use error::Error;
pub use schema::{generate_config, Schema, SchemaItem, SchemaSection};
