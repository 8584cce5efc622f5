//! The configuration store and its typed-value machinery.

mod builder;
mod error;
pub(crate) mod ini;
mod rule;
mod section;
mod store;
mod value;

pub use builder::ConfigStoreBuilder;
pub use error::ConfigError;
pub use rule::{CustomRule, Rule};
pub use section::Section;
pub use store::{ConfigStore, Fallback, LoadReport};
pub use value::{ConfigType, Kind, Value};
