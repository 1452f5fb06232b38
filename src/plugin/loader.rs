//! Plugin discovery from the filesystem and selection validation.
//!
//! Discovery scans each directory on the search path for `*.toml` definition
//! files. Missing directories are skipped; an unreadable or unparseable
//! definition fails discovery outright. A definition becomes a handle when
//! its name was selected or it is flagged as a default plugin.
//!
//! Validation checks the selections against the discovered handles and fails
//! on the first name that went unsatisfied. Discovered sets are small (low
//! tens at most), so a linear scan per selection is fine.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::{LoadedPlugin, Plugin, PluginDefinition, PluginError, Selection};

/// Discover plugin handles for the given selections.
///
/// Returns one handle per definition found under `search_path` whose name is
/// selected or which is flagged `default = true`. The same name defined twice
/// anywhere under the search path is an error; the discovery contract
/// guarantees unique names to the validator.
pub fn discover_plugins(
    namespace: &str,
    search_path: &[PathBuf],
    selections: &[Selection],
    aggregator_address: &str,
) -> Result<Vec<Arc<dyn Plugin>>, PluginError> {
    let mut definitions: Vec<PluginDefinition> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for dir in search_path {
        for path in definition_files(dir)? {
            let def = read_definition(&path)?;
            if seen.contains_key(&def.name) {
                return Err(PluginError::Duplicate {
                    name: def.name,
                    path,
                });
            }
            debug!(name = %def.name, path = %path.display(), "Found plugin definition");
            seen.insert(def.name.clone(), path);
            definitions.push(def);
        }
    }

    let plugins = definitions
        .into_iter()
        .filter(|def| def.default || selections.iter().any(|sel| sel.name == def.name))
        .map(|def| {
            Arc::new(LoadedPlugin::new(def, namespace, aggregator_address)) as Arc<dyn Plugin>
        })
        .collect::<Vec<_>>();

    debug!(count = plugins.len(), "Plugin discovery complete");
    Ok(plugins)
}

/// Verify that every selection was satisfied by discovery.
///
/// Fails with [`PluginError::NotFound`] naming the first selection, in
/// selection order, that no discovered handle matches. Later unmatched
/// selections are not reported.
pub fn validate_selections(
    selections: &[Selection],
    discovered: &[Arc<dyn Plugin>],
) -> Result<(), PluginError> {
    for selection in selections {
        if !discovered.iter().any(|p| p.name() == selection.name) {
            return Err(PluginError::NotFound(selection.name.clone()));
        }
    }
    Ok(())
}

/// List the `*.toml` definition files in one search directory, sorted by
/// file name so discovery order is stable across platforms.
///
/// A directory that doesn't exist simply contributes nothing.
fn definition_files(dir: &Path) -> Result<Vec<PathBuf>, PluginError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %dir.display(), "Plugin search directory not present, skipping");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(PluginError::Read {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PluginError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_definition(path: &Path) -> Result<PluginDefinition, PluginError> {
    let contents = fs::read_to_string(path).map_err(|e| PluginError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| PluginError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
