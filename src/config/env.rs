//! Read access to the process environment.
//!
//! Resolution consults environment variables and the machine hostname.
//! Hiding both behind a trait keeps `ConfigLoader::resolve` a pure function
//! of its inputs and lets tests supply a fixed environment instead of
//! mutating the real one.

use std::collections::HashMap;

/// Read accessor over environment variables and the machine hostname.
pub trait Environment {
    /// Look up an environment variable.
    fn var(&self, key: &str) -> Option<String>;

    /// The machine hostname, if it can be resolved.
    fn hostname(&self) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn hostname(&self) -> Option<String> {
        hostname::get().ok().and_then(|h| h.into_string().ok())
    }
}

/// A fixed in-memory environment (for testing and hermetic runs).
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
    hostname: Option<String>,
}

impl MapEnvironment {
    /// An environment with no variables and no hostname.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, builder-style.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set the hostname, builder-style.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn hostname(&self) -> Option<String> {
        self.hostname.clone()
    }
}
