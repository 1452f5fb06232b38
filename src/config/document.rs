//! Raw configuration documents.
//!
//! A [`RawDocument`] is the parsed-but-untyped form of a config file: a TOML
//! table plus the path it came from. Keeping the table around (instead of
//! deserializing straight into [`Config`]) preserves the one piece of
//! information a typed struct loses: whether a key was present at all. The
//! loader needs that distinction for the resource-list replacement rule,
//! where "set to an empty list" and "not set" mean different things.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use toml::Value;

use super::error::ConfigError;
use super::schema::Config;

/// Origin recorded for a document that didn't come from a file.
const DEFAULTS_ORIGIN: &str = "<defaults>";

/// A parsed, untyped configuration document.
#[derive(Debug, Clone)]
pub struct RawDocument {
    origin: PathBuf,
    table: toml::Table,
}

impl RawDocument {
    /// Parse a document from file contents.
    pub fn parse(origin: &Path, contents: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(contents)?;
        Ok(Self {
            origin: origin.to_path_buf(),
            table,
        })
    }

    /// An empty document, used when no config file exists anywhere on the
    /// search path. Resolving it yields the defaults untouched.
    pub fn empty() -> Self {
        Self {
            origin: PathBuf::from(DEFAULTS_ORIGIN),
            table: toml::Table::new(),
        }
    }

    /// Where this document came from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Whether the document defines a top-level key at all.
    ///
    /// This is a presence check, not a truthiness check: a key set to an
    /// empty list or empty string is present.
    pub fn has_key(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Extract a top-level key as a typed value. Returns `None` when the key
    /// is absent, an error when it is present with the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.table.get(key) {
            None => Ok(None),
            Some(value) => value
                .clone()
                .try_into()
                .map(Some)
                .map_err(|e| ConfigError::Parse {
                    path: self.origin.clone(),
                    source: e,
                }),
        }
    }

    /// Layer this document over a baseline configuration.
    ///
    /// Tables merge recursively, so a partial `[aggregation]` section keeps
    /// the baseline's other fields. Lists append and scalars override.
    /// Callers that need replace-not-append semantics for a list (the
    /// resource list) check `has_key` and assign the exact value afterward.
    pub fn merged_over(&self, defaults: &Config) -> Result<Config, ConfigError> {
        let mut base = Value::try_from(defaults)?;
        merge_value(&mut base, Value::Table(self.table.clone()));
        base.try_into().map_err(|e| ConfigError::Parse {
            path: self.origin.clone(),
            source: e,
        })
    }
}

fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base), Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base), Value::Array(overlay)) => base.extend(overlay),
        (base, overlay) => *base = overlay,
    }
}
