//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::plugin::PluginError;

/// Errors that can occur during configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Path to the file that couldn't be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration document could not be mapped onto the schema.
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        /// Origin of the document that couldn't be parsed.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// A configuration value is invalid.
    #[error("Invalid config value for {field}: {message}")]
    Invalid {
        /// The field name that has an invalid value.
        field: String,
        /// Description of why the value is invalid.
        message: String,
    },

    /// Plugin discovery or selection validation failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Failed to serialize configuration.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
