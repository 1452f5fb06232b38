//! Plugin discovery and validation error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering plugins or validating selections.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Failed to read a plugin definition file or search directory.
    #[error("Failed to read plugin definition {path}: {source}")]
    Read {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse a plugin definition file.
    #[error("Failed to parse plugin definition {path}: {source}")]
    Parse {
        /// Path to the definition that couldn't be parsed.
        path: PathBuf,
        /// The underlying TOML parse error.
        source: toml::de::Error,
    },

    /// Two definitions under the search path share a name.
    #[error("Duplicate plugin definition for '{name}' at {path}")]
    Duplicate {
        /// The name defined more than once.
        name: String,
        /// Path of the second definition encountered.
        path: PathBuf,
    },

    /// A selected plugin was not satisfied by discovery.
    #[error("Configured plugin '{0}' was not found under the plugin search path")]
    NotFound(String),
}
