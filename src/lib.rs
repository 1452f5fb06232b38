//! sonde: cluster test orchestration.
//!
//! This crate implements the startup phase of the tool: resolving one
//! authoritative runtime configuration from layered sources and validating
//! it before anything runs against the cluster.
//!
//! # Resolution Pipeline
//!
//! ```text
//! defaults + config document + environment   (config)
//!     → resolved Config
//!     → plugin discovery over the search path (plugin)
//!     → selection validation + registration
//!     → cluster client construction           (k8s)
//! ```
//!
//! Any failure along the pipeline aborts startup; the rest of the tool only
//! ever sees a fully resolved, fully validated configuration.

pub mod buildinfo;
pub mod cli;
pub mod config;
pub mod k8s;
pub mod plugin;

pub use config::{load_config, Config, ConfigError, ConfigLoader};
pub use plugin::Plugin;
