//! sonde: cluster test orchestration.
//!
//! This binary performs the startup resolution pass: it loads and layers
//! the runtime configuration, discovers the configured test plugins,
//! validates that every requested plugin is available, optionally resolves
//! cluster client connection material, and prints the fully resolved
//! configuration. Any failure aborts before the tool would touch the
//! cluster.

use anyhow::{Context, Result};
use clap::Parser;
use sonde::{
    cli::Cli,
    config::{self, ConfigLoader, SystemEnvironment},
    k8s::ClusterClient,
};
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    debug!("Parsed CLI arguments: {:?}", cli);

    let env = SystemEnvironment;
    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_explicit_path(path.clone()),
        None => ConfigLoader::from_env(&env),
    };

    let config =
        config::load_config_with(&loader, &env).context("Failed to load configuration")?;

    info!(
        version = %config.version,
        uuid = %config.uuid,
        plugins = config.loaded_plugins.len(),
        results_dir = %config.results_dir.display(),
        "Configuration resolved"
    );

    if cli.check_cluster {
        // CLI flag beats the KUBECONFIG-sourced path in the config.
        let kubeconfig = cli.kubeconfig.as_deref().or(config.kubeconfig.as_deref());
        let client = ClusterClient::new(kubeconfig, &env)
            .context("Failed to build cluster client")?;
        info!(server = %client.server(), "Cluster client ready");
    }

    let rendered =
        toml::to_string_pretty(&config).context("Failed to render resolved configuration")?;
    print!("{rendered}");

    Ok(())
}

/// Initialize the tracing subscriber.
///
/// Logs go to stderr so the rendered configuration on stdout stays clean.
///
/// # Verbosity Levels
/// - 0 (default): Only warnings and errors
/// - 1 (-v): Info level
/// - 2 (-vv): Debug level
/// - 3+ (-vvv): Trace level
fn init_tracing(verbose: u8) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
