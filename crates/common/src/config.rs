//! Host configuration service contract.
//!
//! Components look up their settings by dotted property name
//! (e.g. `org.jitsi.jicofo.auth.URL`). Lookups never fail: a missing or
//! unparseable value is reported as absent and the caller applies its own
//! default.
//!
//! Two sources are provided:
//! - [`MapConfigSource`] - backed by a `HashMap` (tests, embedding)
//! - [`EnvConfigSource`] - backed by process environment variables, with the
//!   property name mapped via [`env_var_name`]

use std::collections::HashMap;
use std::env;

/// Read-only configuration lookup.
pub trait ConfigSource: Send + Sync {
    /// Raw string value of a property, `None` if not set.
    fn get_string(&self, name: &str) -> Option<String>;

    /// Boolean property. Accepts `true`/`false` in any case; anything else
    /// is treated as absent.
    fn get_bool(&self, name: &str) -> Option<bool> {
        let value = self.get_string(name)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Signed integer property. Unparseable values are treated as absent.
    fn get_i64(&self, name: &str) -> Option<i64> {
        self.get_string(name)?.trim().parse().ok()
    }
}

/// Map a dotted property name to its environment variable name.
///
/// `org.jitsi.jicofo.auth.jetty.tls.port` → `ORG_JITSI_JICOFO_AUTH_JETTY_TLS_PORT`
#[must_use]
pub fn env_var_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Configuration source backed by an in-memory map of property names.
#[derive(Debug, Clone, Default)]
pub struct MapConfigSource {
    values: HashMap<String, String>,
}

impl MapConfigSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl From<HashMap<String, String>> for MapConfigSource {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl ConfigSource for MapConfigSource {
    fn get_string(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Configuration source backed by environment variables.
///
/// The variables are snapshotted at construction so repeated lookups are
/// consistent for the lifetime of the source.
#[derive(Debug, Clone)]
pub struct EnvConfigSource {
    vars: HashMap<String, String>,
}

impl EnvConfigSource {
    /// Snapshot the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars().collect())
    }

    /// Build from an explicit variable map (for testing).
    #[must_use]
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

impl ConfigSource for EnvConfigSource {
    fn get_string(&self, name: &str) -> Option<String> {
        self.vars.get(&env_var_name(name)).cloned()
    }
}
