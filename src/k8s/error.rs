//! Cluster client error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while constructing the cluster API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to read the kubeconfig or a credential file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path to the file that couldn't be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse a kubeconfig file.
    #[error("Failed to parse kubeconfig {path}: {source}")]
    Parse {
        /// Path to the kubeconfig that couldn't be parsed.
        path: PathBuf,
        /// The underlying YAML parse error.
        source: serde_yaml::Error,
    },

    /// The kubeconfig names no current context.
    #[error("Kubeconfig has no current-context")]
    NoCurrentContext,

    /// The current context doesn't exist in the kubeconfig.
    #[error("Kubeconfig context '{0}' not found")]
    ContextNotFound(String),

    /// The context references a cluster that doesn't exist.
    #[error("Kubeconfig cluster '{0}' not found")]
    ClusterNotFound(String),

    /// The context references a user that doesn't exist.
    #[error("Kubeconfig user '{0}' not found")]
    UserNotFound(String),

    /// The selected user entry carries no usable credentials.
    #[error("Kubeconfig user '{0}' has no token or client certificate")]
    MissingCredentials(String),

    /// No kubeconfig was given and the in-cluster environment is absent.
    #[error("No kubeconfig given and not running inside a cluster")]
    NotInCluster,
}
