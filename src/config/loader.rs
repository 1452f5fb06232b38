//! Configuration loading and resolution.
//!
//! One configuration is resolved per process from layered sources, highest
//! precedence first:
//!
//! 1. Environment overrides (`RESULTS_DIR`, `KUBECONFIG`)
//! 2. The config document (explicit `SONDE_CONFIG`/`--config` file, or the
//!    first existing file on the search path)
//! 3. Built-in defaults
//!
//! Two fields get special treatment: the resource list is replaced wholesale
//! whenever the document defines it at all (see [`ConfigLoader::resolve`]),
//! and the advertise address is derived from the environment when the
//! document leaves it empty. The build version is always stamped last and is
//! never user-settable.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::document::RawDocument;
use super::env::Environment;
use super::error::ConfigError;
use super::schema::Config;
use crate::buildinfo;
use crate::plugin;

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/sonde/config.toml";

/// User configuration directory name.
pub const USER_CONFIG_DIR: &str = "sonde";

/// User configuration filename.
pub const USER_CONFIG_FILE: &str = "config.toml";

/// Config filename searched in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sonde.toml";

/// Environment variable naming an alternate config file.
///
/// Unlike the search-path files, a file named here must exist.
pub const ENV_CONFIG_FILE: &str = "SONDE_CONFIG";

/// Environment variable overriding the advertise-address host.
pub const ENV_ADVERTISE_IP: &str = "SONDE_ADVERTISE_IP";

/// Environment variable overriding the results directory.
pub const ENV_RESULTS_DIR: &str = "RESULTS_DIR";

/// Environment variable supplying the kubeconfig path consumed by the
/// cluster client.
pub const ENV_KUBECONFIG: &str = "KUBECONFIG";

/// Locates the config document and resolves it against defaults and the
/// environment.
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with the default search path, honoring the
    /// `SONDE_CONFIG` override.
    pub fn from_env(env: &dyn Environment) -> Self {
        let explicit_path = env
            .var(ENV_CONFIG_FILE)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let mut search_paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
        if let Some(dir) = dirs::config_dir() {
            search_paths.push(dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE));
        }
        search_paths.push(PathBuf::from(LOCAL_CONFIG_FILE));

        Self {
            explicit_path,
            search_paths,
        }
    }

    /// Use one specific config file (the `--config` flag). The file must
    /// exist; the search path is not consulted.
    pub fn with_explicit_path(path: PathBuf) -> Self {
        Self {
            explicit_path: Some(path),
            search_paths: Vec::new(),
        }
    }

    /// Create a loader with custom search paths (for testing).
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self {
            explicit_path: None,
            search_paths,
        }
    }

    /// Locate and parse the raw config document.
    ///
    /// An explicitly named file must exist. Otherwise the first existing
    /// file on the search path wins, and if none exists the document is
    /// empty (a defaults-only run).
    pub fn read_document(&self) -> Result<RawDocument, ConfigError> {
        if let Some(path) = &self.explicit_path {
            return match Self::read_file(path)? {
                Some(document) => Ok(document),
                None => Err(ConfigError::Read {
                    path: path.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "specified config file not found",
                    ),
                }),
            };
        }

        for path in &self.search_paths {
            if let Some(document) = Self::read_file(path)? {
                debug!(path = %path.display(), "Loaded config document");
                return Ok(document);
            }
        }

        debug!("No config file found, resolving from defaults");
        Ok(RawDocument::empty())
    }

    /// Resolve one configuration from layered sources.
    ///
    /// Pure apart from reads through `env`; resolving the same inputs twice
    /// yields the same configuration.
    pub fn resolve(
        &self,
        defaults: Config,
        document: &RawDocument,
        env: &dyn Environment,
    ) -> Result<Config, ConfigError> {
        let mut config = document.merged_over(&defaults)?;

        // Use the exact user list for resources whenever the key is set at
        // all. The generic document merge appends lists, so leaving the key
        // out keeps the default set while setting it (even to an empty
        // list) replaces the set outright.
        if document.has_key("resources") {
            config.resources = document.get("resources")?.unwrap_or_default();
        }

        // Environment overrides beat the document.
        if let Some(dir) = env.var(ENV_RESULTS_DIR) {
            config.results_dir = PathBuf::from(dir);
        }
        if let Some(path) = env.var(ENV_KUBECONFIG).filter(|v| !v.is_empty()) {
            config.kubeconfig = Some(PathBuf::from(path));
        }

        // The document wins outright for the advertise address; otherwise
        // derive the host from the environment, falling back to the machine
        // hostname. With no host the address stays empty, meaning unset.
        if config.aggregation.advertise_address.is_empty() {
            let host = env
                .var(ENV_ADVERTISE_IP)
                .or_else(|| env.hostname())
                .filter(|h| !h.is_empty());
            if let Some(host) = host {
                config.aggregation.advertise_address =
                    format!("{}:{}", host, config.aggregation.bind_port);
            }
        }

        // The version always comes from the build, never from a config
        // source.
        config.version = buildinfo::VERSION.to_string();

        Ok(config)
    }

    /// Read the document and resolve it against the built-in defaults.
    pub fn load(&self, env: &dyn Environment) -> Result<Config, ConfigError> {
        let document = self.read_document()?;
        self.resolve(Config::default(), &document, env)
    }

    /// Read a config file, returning `None` if it doesn't exist.
    fn read_file(path: &Path) -> Result<Option<RawDocument>, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => RawDocument::parse(path, &contents)
                .map(Some)
                .map_err(|e| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: e,
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

/// Load the full runtime configuration.
///
/// Resolves the config document, discovers plugins for the configured
/// namespace and search path, validates that every selection was satisfied,
/// and registers the discovered handles. The first error at any stage
/// surfaces unchanged; the returned configuration is fully resolved.
pub fn load_config(env: &dyn Environment) -> Result<Config, ConfigError> {
    load_config_with(&ConfigLoader::from_env(env), env)
}

/// [`load_config`] with a caller-supplied loader (used for the `--config`
/// flag and by tests).
pub fn load_config_with(
    loader: &ConfigLoader,
    env: &dyn Environment,
) -> Result<Config, ConfigError> {
    let mut config = loader.load(env)?;
    load_all_plugins(&mut config)?;
    info!(
        version = %config.version,
        plugins = config.loaded_plugins.len(),
        "Configuration resolved"
    );
    Ok(config)
}

/// Discover plugins, validate the selections against them, and register
/// every discovered handle (selected or not) into the configuration.
fn load_all_plugins(config: &mut Config) -> Result<(), ConfigError> {
    let discovered = plugin::loader::discover_plugins(
        &config.plugins.namespace,
        &config.plugins.search_path,
        &config.plugins.selections,
        &config.aggregation.advertise_address,
    )?;

    plugin::loader::validate_selections(&config.plugins.selections, &discovered)?;

    for plugin in discovered {
        config.add_plugin(plugin);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::MapEnvironment;
    use crate::plugin::PluginError;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    fn loader_for(path: PathBuf) -> ConfigLoader {
        ConfigLoader::with_search_paths(vec![path])
    }

    #[test]
    fn test_no_config_file_resolves_defaults() {
        let dir = tempdir().unwrap();
        let loader = loader_for(dir.path().join("missing.toml"));

        let config = loader.load(&MapEnvironment::new()).unwrap();

        assert_eq!(config.results_dir, PathBuf::from("/tmp/sonde"));
        assert_eq!(config.resources, Config::default().resources);
        assert_eq!(config.version, buildinfo::VERSION);
    }

    #[test]
    fn test_document_overrides_scalars() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            description = "nightly"
            results_dir = "/var/lib/sonde"
            "#,
        );

        let config = loader_for(path).load(&MapEnvironment::new()).unwrap();

        assert_eq!(config.description, "nightly");
        assert_eq!(config.results_dir, PathBuf::from("/var/lib/sonde"));
    }

    #[test]
    fn test_resources_absent_keeps_default_list() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), r#"description = "no resources key""#);

        let config = loader_for(path).load(&MapEnvironment::new()).unwrap();

        assert_eq!(config.resources, Config::default().resources);
    }

    #[test]
    fn test_resources_present_replaces_wholesale() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), r#"resources = ["pods", "nodes"]"#);

        let config = loader_for(path).load(&MapEnvironment::new()).unwrap();

        // Exactly the user's list: no defaults mixed in, no appending.
        assert_eq!(config.resources, vec!["pods".to_string(), "nodes".to_string()]);
    }

    #[test]
    fn test_resources_empty_list_replaces_with_empty() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), r#"resources = []"#);

        let config = loader_for(path).load(&MapEnvironment::new()).unwrap();

        assert!(config.resources.is_empty());
    }

    #[test]
    fn test_env_results_dir_beats_document() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), r#"results_dir = "/var/lib/sonde""#);
        let env = MapEnvironment::new().with_var(ENV_RESULTS_DIR, "/data/results");

        let config = loader_for(path).load(&env).unwrap();

        assert_eq!(config.results_dir, PathBuf::from("/data/results"));
    }

    #[test]
    fn test_env_kubeconfig_sets_path() {
        let dir = tempdir().unwrap();
        let loader = loader_for(dir.path().join("missing.toml"));
        let env = MapEnvironment::new().with_var(ENV_KUBECONFIG, "/home/dev/.kube/config");

        let config = loader.load(&env).unwrap();

        assert_eq!(config.kubeconfig, Some(PathBuf::from("/home/dev/.kube/config")));
    }

    #[test]
    fn test_kubeconfig_defaults_to_in_cluster() {
        let dir = tempdir().unwrap();
        let loader = loader_for(dir.path().join("missing.toml"));

        let config = loader.load(&MapEnvironment::new()).unwrap();

        assert!(config.kubeconfig.is_none());
    }

    #[test]
    fn test_advertise_address_from_env_ip() {
        let dir = tempdir().unwrap();
        let loader = loader_for(dir.path().join("missing.toml"));
        let env = MapEnvironment::new()
            .with_var(ENV_ADVERTISE_IP, "10.0.0.5")
            .with_hostname("node-a");

        let config = loader.load(&env).unwrap();

        // The env IP wins over the hostname; port is the bind port.
        assert_eq!(config.aggregation.advertise_address, "10.0.0.5:8080");
    }

    #[test]
    fn test_advertise_address_falls_back_to_hostname() {
        let dir = tempdir().unwrap();
        let loader = loader_for(dir.path().join("missing.toml"));
        let env = MapEnvironment::new().with_hostname("node-a");

        let config = loader.load(&env).unwrap();

        assert_eq!(config.aggregation.advertise_address, "node-a:8080");
    }

    #[test]
    fn test_advertise_address_empty_when_underivable() {
        let dir = tempdir().unwrap();
        let loader = loader_for(dir.path().join("missing.toml"));

        let config = loader.load(&MapEnvironment::new()).unwrap();

        assert!(config.aggregation.advertise_address.is_empty());
    }

    #[test]
    fn test_advertise_address_from_document_is_untouched() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            [aggregation]
            advertise_address = "agg.example.com:7070"
            "#,
        );
        let env = MapEnvironment::new().with_var(ENV_ADVERTISE_IP, "10.0.0.5");

        let config = loader_for(path).load(&env).unwrap();

        assert_eq!(config.aggregation.advertise_address, "agg.example.com:7070");
    }

    #[test]
    fn test_advertise_uses_configured_bind_port() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            [aggregation]
            bind_port = 9443
            "#,
        );
        let env = MapEnvironment::new().with_var(ENV_ADVERTISE_IP, "10.0.0.5");

        let config = loader_for(path).load(&env).unwrap();

        assert_eq!(config.aggregation.advertise_address, "10.0.0.5:9443");
    }

    #[test]
    fn test_version_is_never_user_settable() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), r#"version = "9.9.9""#);

        let config = loader_for(path).load(&MapEnvironment::new()).unwrap();

        assert_eq!(config.version, buildinfo::VERSION);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::with_explicit_path(dir.path().join("missing.toml"));

        let err = loader.load(&MapEnvironment::new()).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "this is not valid TOML [[[");

        let err = loader_for(path).load(&MapEnvironment::new()).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_wrong_value_type_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), r#"results_dir = 42"#);

        let err = loader_for(path).load(&MapEnvironment::new()).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_first_existing_search_path_wins() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.toml");
        let second = dir.path().join("second.toml");
        fs::write(&first, r#"description = "from first""#).unwrap();
        fs::write(&second, r#"description = "from second""#).unwrap();

        let loader = ConfigLoader::with_search_paths(vec![
            dir.path().join("missing.toml"),
            first,
            second,
        ]);
        let config = loader.load(&MapEnvironment::new()).unwrap();

        assert_eq!(config.description, "from first");
    }

    #[test]
    fn test_env_config_file_override() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), r#"description = "from override""#);
        let env = MapEnvironment::new().with_var(ENV_CONFIG_FILE, path.display().to_string());

        let config = ConfigLoader::from_env(&env).load(&env).unwrap();

        assert_eq!(config.description, "from override");
    }

    #[test]
    fn test_load_config_registers_selected_and_default_plugins() {
        let dir = tempdir().unwrap();
        let plugins_dir = dir.path().join("plugins.d");
        fs::create_dir(&plugins_dir).unwrap();
        fs::write(
            plugins_dir.join("smoke.toml"),
            r#"
            name = "smoke"
            image = "example.com/smoke:v1"
            "#,
        )
        .unwrap();
        fs::write(
            plugins_dir.join("node-logs.toml"),
            r#"
            name = "node-logs"
            image = "example.com/node-logs:v1"
            default = true
            "#,
        )
        .unwrap();
        let path = write_config(
            dir.path(),
            &format!(
                r#"
                [plugins]
                search_path = ["{}"]

                [[plugins.selections]]
                name = "smoke"
                "#,
                plugins_dir.display()
            ),
        );

        let config = load_config_with(&loader_for(path), &MapEnvironment::new()).unwrap();

        // The selected plugin and the unselected default are both retained.
        assert_eq!(config.loaded_plugins.len(), 2);
        assert!(config.loaded_plugins.contains_key("smoke"));
        assert!(config.loaded_plugins.contains_key("node-logs"));
    }

    #[test]
    fn test_load_config_fails_on_unsatisfied_selection() {
        let dir = tempdir().unwrap();
        let plugins_dir = dir.path().join("plugins.d");
        fs::create_dir(&plugins_dir).unwrap();
        fs::write(
            plugins_dir.join("a.toml"),
            r#"
            name = "a"
            image = "example.com/a:v1"
            "#,
        )
        .unwrap();
        let path = write_config(
            dir.path(),
            &format!(
                r#"
                [plugins]
                search_path = ["{}"]

                [[plugins.selections]]
                name = "a"

                [[plugins.selections]]
                name = "b"
                "#,
                plugins_dir.display()
            ),
        );

        let err = load_config_with(&loader_for(path), &MapEnvironment::new()).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Plugin(PluginError::NotFound(ref name)) if name == "b"
        ));
    }
}
