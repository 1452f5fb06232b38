//! Plugin definition files and the handles built from them.
//!
//! A definition describes how a plugin would run in the cluster (driver,
//! image, command). Discovery turns a definition into a [`LoadedPlugin`]
//! handle carrying the runtime namespace and the aggregator address the
//! plugin's pods will report results to. The handle stays inert here;
//! execution belongs to a later stage.

use serde::{Deserialize, Serialize};

use super::Plugin;

/// How a plugin's workload is scheduled in the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    /// Run once to completion as a single job.
    #[default]
    Job,
    /// Run on every node as a daemon set.
    DaemonSet,
}

/// A plugin definition as parsed from a `*.toml` file under the search path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginDefinition {
    /// Unique plugin name. Discovery rejects a search path that defines the
    /// same name twice.
    pub name: String,

    /// Scheduling driver for the plugin's workload.
    #[serde(default)]
    pub driver: DriverKind,

    /// Container image the plugin runs.
    pub image: String,

    /// Command to run in the container. Empty means the image entrypoint.
    #[serde(default)]
    pub command: Vec<String>,

    /// Load this plugin even when it is not explicitly selected.
    ///
    /// Default plugins ride along with every run; validation retains them in
    /// the registry alongside the selected ones.
    #[serde(default)]
    pub default: bool,
}

/// A discovered plugin handle: a definition bound to the namespace it will
/// run in and the aggregator address it will dial.
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    definition: PluginDefinition,
    namespace: String,
    aggregator_address: String,
}

impl LoadedPlugin {
    /// Bind a definition to its runtime context.
    pub fn new(
        definition: PluginDefinition,
        namespace: impl Into<String>,
        aggregator_address: impl Into<String>,
    ) -> Self {
        Self {
            definition,
            namespace: namespace.into(),
            aggregator_address: aggregator_address.into(),
        }
    }

    /// The definition this handle was built from.
    pub fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    /// Namespace the plugin's workload is created in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Address of the aggregator this plugin reports to.
    ///
    /// Empty when no advertise address could be derived; consumers treat
    /// empty as unset.
    pub fn aggregator_address(&self) -> &str {
        &self.aggregator_address
    }
}

impl Plugin for LoadedPlugin {
    fn name(&self) -> &str {
        &self.definition.name
    }
}
