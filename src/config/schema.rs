//! Configuration schema definitions.
//!
//! This module defines the resolved configuration consumed by the rest of
//! the tool. Every section has built-in defaults so a missing or partial
//! config document still resolves; the loader layers the document and
//! environment overrides on top.
//!
//! The value is constructed once per process during resolution and treated
//! as read-only afterward. There is no global configuration state; callers
//! receive the resolved `Config` explicitly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plugin::{Plugin, Selection};

/// Top-level resolved configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Free-form description of this run.
    pub description: String,

    /// Unique identifier for this run.
    pub uuid: String,

    /// Version of the build that produced this configuration.
    ///
    /// Always stamped from build metadata during resolution; any value a
    /// config source supplies is discarded.
    pub version: String,

    /// Path to a kubeconfig file. `None` means in-cluster credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Directory results are written to.
    pub results_dir: PathBuf,

    /// Cluster resource kinds to collect.
    ///
    /// Replaced wholesale (never appended) when the config document defines
    /// the key at all, including as an empty list.
    pub resources: Vec<String>,

    /// Filters narrowing what the tool queries.
    pub filters: FiltersConfig,

    /// Aggregator settings.
    pub aggregation: AggregationConfig,

    /// Plugin discovery settings.
    pub plugins: PluginConfig,

    /// Plugins registered after discovery and selection validation.
    ///
    /// Empty until validation succeeds; keyed by plugin name.
    #[serde(skip)]
    pub loaded_plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl Config {
    /// Register a discovered plugin handle, keyed by name.
    pub fn add_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        self.loaded_plugins.insert(plugin.name().to_string(), plugin);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            description: "DEFAULT".to_string(),
            uuid: Uuid::new_v4().to_string(),
            version: String::new(),
            kubeconfig: None,
            results_dir: PathBuf::from("/tmp/sonde"),
            resources: default_resources(),
            filters: FiltersConfig::default(),
            aggregation: AggregationConfig::default(),
            plugins: PluginConfig::default(),
            loaded_plugins: HashMap::new(),
        }
    }
}

/// Resource kinds collected when the config document doesn't say otherwise.
fn default_resources() -> Vec<String> {
    [
        "certificatesigningrequests",
        "clusterrolebindings",
        "clusterroles",
        "componentstatuses",
        "configmaps",
        "daemonsets",
        "deployments",
        "endpoints",
        "events",
        "limitranges",
        "namespaces",
        "nodes",
        "persistentvolumeclaims",
        "persistentvolumes",
        "pods",
        "podtemplates",
        "replicasets",
        "replicationcontrollers",
        "resourcequotas",
        "rolebindings",
        "roles",
        "serviceaccounts",
        "services",
        "statefulsets",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Query filters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Regex selecting which namespaces to query.
    pub namespaces: String,

    /// Label selector applied to queried objects. Empty selects everything.
    pub label_selector: String,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            namespaces: ".*".to_string(),
            label_selector: String::new(),
        }
    }
}

/// Aggregator settings: where the aggregation service binds and the address
/// pod-side agents use to reach it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Address the aggregation service binds to.
    pub bind_address: String,

    /// Port the aggregation service binds to.
    pub bind_port: u16,

    /// `host:port` pods dial to reach the aggregator.
    ///
    /// Derived during resolution when the document leaves it empty. Empty
    /// after resolution means no host could be determined; consumers must
    /// treat that as unset, not as a valid endpoint.
    pub advertise_address: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            bind_port: 8080,
            advertise_address: String::new(),
        }
    }
}

/// Plugin discovery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Namespace plugin workloads are created in.
    pub namespace: String,

    /// Directories searched for plugin definition files, in order.
    pub search_path: Vec<PathBuf>,

    /// Plugins this run requires. Every selection must be satisfied by
    /// discovery or resolution fails.
    pub selections: Vec<Selection>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            namespace: "sonde".to_string(),
            search_path: vec![
                PathBuf::from("/etc/sonde/plugins.d"),
                PathBuf::from("./plugins.d"),
            ],
            selections: Vec::new(),
        }
    }
}
