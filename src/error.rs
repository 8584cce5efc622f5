use crate::config::ConfigError;
use thiserror::Error;

/// Top-level error type for the typed-ini library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("config store requires a file path")]
    MissingPath,

    #[error("config store requires a schema")]
    MissingSchema,
}
