//! Auth gateway configuration.
//!
//! Two layers of configuration are read:
//!
//! - Gateway properties under the `org.jitsi.jicofo.auth` namespace, looked up
//!   through the host [`ConfigSource`]. These decide whether authentication is
//!   enabled, which authority runs, and how the embedded HTTP server binds.
//!   Missing or malformed values fall back to defaults and are never errors.
//! - Process settings for the `auth-gateway` binary (metrics listener),
//!   loaded from environment variables like the other service binaries.

use common::config::ConfigSource;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Namespace prefix of every gateway property.
pub const AUTH_PNAME: &str = "org.jitsi.jicofo.auth";

/// Login URL pattern. Absent or empty disables the gateway.
pub const LOGIN_URL_PNAME: &str = "org.jitsi.jicofo.auth.URL";

/// Logout URL pattern (Shibboleth only).
pub const LOGOUT_URL_PNAME: &str = "org.jitsi.jicofo.auth.LOGOUT_URL";

/// Destroy authentication sessions as soon as the conference ends.
pub const DISABLE_AUTOLOGIN_PNAME: &str = "org.jitsi.jicofo.auth.DISABLE_AUTOLOGIN";

/// Authentication session lifetime in milliseconds.
pub const AUTH_LIFETIME_PNAME: &str = "org.jitsi.jicofo.auth.AUTH_LIFETIME";

/// Start the HTTP server for every authority variant, not only web-based SSO.
pub const HTTP_ALWAYS_START_PNAME: &str = "org.jitsi.jicofo.auth.HTTP_ALWAYS_START";

/// Embedded server host to bind.
pub const JETTY_HOST_PNAME: &str = "org.jitsi.jicofo.auth.jetty.host";

/// Embedded server plain HTTP port. Negative disables the connector.
pub const JETTY_PORT_PNAME: &str = "org.jitsi.jicofo.auth.jetty.port";

/// Embedded server TLS port.
pub const JETTY_TLS_PORT_PNAME: &str = "org.jitsi.jicofo.auth.jetty.tls.port";

/// Key store path. TLS is only enabled when this is set.
pub const JETTY_KEY_STORE_PATH_PNAME: &str =
    "org.jitsi.jicofo.auth.jetty.sslContextFactory.keyStorePath";

/// Default plain HTTP port. Differs from the media server's default so both
/// can run on the same host.
pub const DEFAULT_HTTP_PORT: u16 = 8888;

/// Default TLS port, for the same reason as [`DEFAULT_HTTP_PORT`].
pub const DEFAULT_TLS_PORT: u16 = 8843;

/// Default authentication session lifetime (24 hours).
pub const DEFAULT_AUTH_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Default metrics listener bind address for the binary.
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:9888";

/// Whether the embedded HTTP server runs for variants without a web surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerPolicy {
    /// Run only when the active authority needs a web surface.
    #[default]
    WebVariantOnly,
    /// Run for every active authority, serving at least the health checks.
    Always,
}

/// Snapshot of the gateway properties, read once per startup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Login URL pattern; `None` when absent or empty.
    pub login_url: Option<String>,
    /// Logout URL pattern; `None` when absent or empty.
    pub logout_url: Option<String>,
    /// Destroy sessions when the conference ends.
    pub disable_autologin: bool,
    /// Authentication session lifetime.
    pub auth_lifetime: Duration,
    /// HTTP server start policy.
    pub server_policy: ServerPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            login_url: None,
            logout_url: None,
            disable_autologin: false,
            auth_lifetime: DEFAULT_AUTH_LIFETIME,
            server_policy: ServerPolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// Read the gateway properties from the host configuration service.
    ///
    /// Pure and idempotent; missing values yield their defaults.
    pub fn resolve(source: &dyn ConfigSource) -> Self {
        let auth_lifetime = source
            .get_i64(AUTH_LIFETIME_PNAME)
            .and_then(|ms| u64::try_from(ms).ok())
            .filter(|ms| *ms > 0)
            .map_or(DEFAULT_AUTH_LIFETIME, Duration::from_millis);

        let server_policy = if source.get_bool(HTTP_ALWAYS_START_PNAME).unwrap_or(false) {
            ServerPolicy::Always
        } else {
            ServerPolicy::WebVariantOnly
        };

        Self {
            login_url: non_empty(source.get_string(LOGIN_URL_PNAME)),
            logout_url: non_empty(source.get_string(LOGOUT_URL_PNAME)),
            disable_autologin: source.get_bool(DISABLE_AUTOLOGIN_PNAME).unwrap_or(false),
            auth_lifetime,
            server_policy,
        }
    }
}

/// Shared embedded HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig {
    /// Host to bind; all interfaces when `None`.
    pub host: Option<String>,
    /// Plain HTTP port; `None` when disabled.
    pub port: Option<u16>,
    /// TLS port.
    pub tls_port: u16,
    /// Key store path; TLS is enabled only when present.
    pub key_store_path: Option<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: Some(DEFAULT_HTTP_PORT),
            tls_port: DEFAULT_TLS_PORT,
            key_store_path: None,
        }
    }
}

impl HttpServerConfig {
    /// Read the embedded server properties from the host configuration
    /// service.
    ///
    /// A negative plain port disables the plain connector. A port outside the
    /// `u16` range is ignored in favour of the default.
    pub fn resolve(source: &dyn ConfigSource) -> Self {
        let port = match source.get_i64(JETTY_PORT_PNAME) {
            Some(p) if p < 0 => None,
            Some(p) => Some(u16::try_from(p).unwrap_or(DEFAULT_HTTP_PORT)),
            None => Some(DEFAULT_HTTP_PORT),
        };

        let tls_port = source
            .get_i64(JETTY_TLS_PORT_PNAME)
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(DEFAULT_TLS_PORT);

        Self {
            host: non_empty(source.get_string(JETTY_HOST_PNAME)),
            port,
            tls_port,
            key_store_path: non_empty(source.get_string(JETTY_KEY_STORE_PATH_PNAME)),
        }
    }

    /// Whether TLS is configured.
    #[must_use]
    pub fn tls_enabled(&self) -> bool {
        self.key_store_path.is_some()
    }

    /// Whether the server would have anything to listen on.
    #[must_use]
    pub fn has_connectors(&self) -> bool {
        self.port.is_some() || self.tls_enabled()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Process settings for the `auth-gateway` binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prometheus listener bind address (default: "0.0.0.0:9888").
    pub metrics_bind_address: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let metrics_bind_address = vars
            .get("GATEWAY_METRICS_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_METRICS_BIND_ADDRESS.to_string());

        if metrics_bind_address
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::InvalidValue(format!(
                "GATEWAY_METRICS_BIND_ADDRESS is not a socket address: {metrics_bind_address}"
            )));
        }

        Ok(Config {
            metrics_bind_address,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::config::MapConfigSource;

    #[test]
    fn test_resolve_empty_source_uses_defaults() {
        let config = GatewayConfig::resolve(&MapConfigSource::new());

        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.login_url, None);
        assert_eq!(config.logout_url, None);
        assert!(!config.disable_autologin);
        assert_eq!(config.auth_lifetime, DEFAULT_AUTH_LIFETIME);
        assert_eq!(config.server_policy, ServerPolicy::WebVariantOnly);
    }

    #[test]
    fn test_resolve_reads_all_properties() {
        let source = MapConfigSource::new()
            .with(LOGIN_URL_PNAME, "https://sso.example.com/login")
            .with(LOGOUT_URL_PNAME, "https://sso.example.com/logout")
            .with(DISABLE_AUTOLOGIN_PNAME, "true")
            .with(AUTH_LIFETIME_PNAME, "60000")
            .with(HTTP_ALWAYS_START_PNAME, "true");

        let config = GatewayConfig::resolve(&source);

        assert_eq!(
            config.login_url.as_deref(),
            Some("https://sso.example.com/login")
        );
        assert_eq!(
            config.logout_url.as_deref(),
            Some("https://sso.example.com/logout")
        );
        assert!(config.disable_autologin);
        assert_eq!(config.auth_lifetime, Duration::from_secs(60));
        assert_eq!(config.server_policy, ServerPolicy::Always);
    }

    #[test]
    fn test_resolve_empty_strings_are_absent() {
        let source = MapConfigSource::new()
            .with(LOGIN_URL_PNAME, "")
            .with(LOGOUT_URL_PNAME, "");

        let config = GatewayConfig::resolve(&source);
        assert_eq!(config.login_url, None);
        assert_eq!(config.logout_url, None);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let source = MapConfigSource::new().with(LOGIN_URL_PNAME, "XMPP:example.com");
        assert_eq!(GatewayConfig::resolve(&source), GatewayConfig::resolve(&source));
    }

    #[test]
    fn test_resolve_malformed_values_fall_back() {
        let source = MapConfigSource::new()
            .with(DISABLE_AUTOLOGIN_PNAME, "maybe")
            .with(AUTH_LIFETIME_PNAME, "-5");

        let config = GatewayConfig::resolve(&source);
        assert!(!config.disable_autologin);
        assert_eq!(config.auth_lifetime, DEFAULT_AUTH_LIFETIME);
    }

    #[test]
    fn test_http_config_defaults() {
        let http = HttpServerConfig::resolve(&MapConfigSource::new());

        assert_eq!(http, HttpServerConfig::default());
        assert_eq!(http.port, Some(8888));
        assert_eq!(http.tls_port, 8843);
        assert!(!http.tls_enabled());
        assert!(http.has_connectors());
    }

    #[test]
    fn test_http_config_overrides() {
        let source = MapConfigSource::new()
            .with(JETTY_HOST_PNAME, "127.0.0.1")
            .with(JETTY_PORT_PNAME, "18888")
            .with(JETTY_TLS_PORT_PNAME, "18843")
            .with(JETTY_KEY_STORE_PATH_PNAME, "/etc/focus/keystore");

        let http = HttpServerConfig::resolve(&source);

        assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(http.port, Some(18888));
        assert_eq!(http.tls_port, 18843);
        assert!(http.tls_enabled());
    }

    #[test]
    fn test_http_config_negative_port_disables_plain_connector() {
        let source = MapConfigSource::new().with(JETTY_PORT_PNAME, "-1");

        let http = HttpServerConfig::resolve(&source);

        assert_eq!(http.port, None);
        assert!(!http.has_connectors(), "No plain port and no key store");
    }

    #[test]
    fn test_process_config_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("defaults should load");
        assert_eq!(config.metrics_bind_address, DEFAULT_METRICS_BIND_ADDRESS);
    }

    #[test]
    fn test_process_config_rejects_bad_address() {
        let vars = HashMap::from([(
            "GATEWAY_METRICS_BIND_ADDRESS".to_string(),
            "not-an-address".to_string(),
        )]);

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }
}
