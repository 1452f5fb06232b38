//! Command-line interface definitions for sonde.
//!
//! Uses clap's derive API for type-safe argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Cluster test orchestration.
///
/// sonde resolves its runtime configuration from defaults, an on-disk
/// config file and environment overrides, discovers the configured test
/// plugins, and validates that every requested plugin is available before
/// anything touches the cluster. The fully resolved configuration is
/// printed so a run can be inspected or archived.
#[derive(Parser, Debug)]
#[command(name = "sonde")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a specific config file.
    ///
    /// Equivalent to the SONDE_CONFIG environment variable: the file must
    /// exist and the default search path is not consulted.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to a kubeconfig file.
    ///
    /// Overrides the KUBECONFIG environment variable. Without either, the
    /// cluster client uses in-cluster credentials.
    #[arg(long = "kubeconfig", value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Also resolve cluster client connection material.
    ///
    /// Fails fast when neither a kubeconfig nor in-cluster credentials are
    /// available.
    #[arg(long = "check-cluster")]
    pub check_cluster: bool,

    /// Increase log verbosity.
    ///
    /// Can be specified multiple times:
    /// -v    = info level
    /// -vv   = debug level
    /// -vvv  = trace level
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
