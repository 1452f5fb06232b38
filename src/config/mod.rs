//! Configuration resolution for sonde.
//!
//! # Data Flow
//! ```text
//! built-in defaults (schema.rs)
//!     + config document (document.rs, located by loader.rs)
//!     + environment overrides (env.rs)
//!     → ConfigLoader::resolve (merge precedence, derived fields)
//!     → plugin discovery + selection validation (plugin::loader)
//!     → Config (resolved, read-only from here on)
//! ```
//!
//! # Merge Behavior
//!
//! - **Scalars** are overridden by the document, and `RESULTS_DIR` /
//!   `KUBECONFIG` environment overrides beat both.
//! - **Lists** are merged (appended). The exception is `resources`, which is
//!   replaced wholesale whenever the document defines the key at all, even as
//!   an empty list. The raw document keeps a presence query for exactly this.
//! - **`aggregation.advertise_address`** is derived when the document leaves
//!   it empty: `SONDE_ADVERTISE_IP`, else the machine hostname, else unset.
//! - **`version`** always comes from build metadata.
//!
//! A missing config file is not an error (the defaults resolve on their
//! own); a file named by `SONDE_CONFIG` or `--config` must exist.

mod document;
mod env;
mod error;
mod loader;
mod schema;

pub use document::RawDocument;
pub use env::{Environment, MapEnvironment, SystemEnvironment};
pub use error::ConfigError;
pub use loader::{
    load_config, load_config_with, ConfigLoader, ENV_ADVERTISE_IP, ENV_CONFIG_FILE,
    ENV_KUBECONFIG, ENV_RESULTS_DIR,
};
pub use schema::{AggregationConfig, Config, FiltersConfig, PluginConfig};
