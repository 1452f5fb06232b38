//! Plugin discovery and selection validation.
//!
//! Plugins are described by TOML definition files found under the configured
//! search path. Discovery constructs an inert handle per definition; at this
//! layer the only capability a handle must offer is its name, which is what
//! selection validation matches against. How a plugin actually runs in the
//! cluster is a later concern and deliberately not part of the handle
//! contract here.
//!
//! # Flow
//!
//! 1. `discover_plugins` scans the search path and builds handles for every
//!    definition that was selected or is flagged as a default.
//! 2. `validate_selections` checks that every requested name was satisfied,
//!    failing on the first that was not.
//! 3. The caller registers all discovered handles into the resolved
//!    configuration.

mod definition;
mod error;
pub mod loader;

pub use definition::{DriverKind, LoadedPlugin, PluginDefinition};
pub use error::PluginError;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A discovered plugin handle.
///
/// Only the name capability is required: selection validation matches on it,
/// and the resolved configuration keys its plugin registry by it.
pub trait Plugin: fmt::Debug + Send + Sync {
    /// The plugin's unique name.
    fn name(&self) -> &str;
}

/// A user request for a plugin by name.
///
/// Selections come from the `[[plugins.selections]]` entries of the resolved
/// configuration and must all be satisfied by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Selection {
    /// Name of the requested plugin (exact, case-sensitive match).
    pub name: String,
}

impl Selection {
    /// Convenience constructor used throughout the tests.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
