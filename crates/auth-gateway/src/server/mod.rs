//! Embedded HTTP server contract.
//!
//! The gateway treats the HTTP server as a collaborator: it is created from
//! the shared [`HttpServerConfig`], handed an ordered [`HandlerList`] and any
//! extra connectors, then started and stopped. [`axum_server`] provides the
//! implementation used by the binary; tests substitute their own.

pub mod axum_server;

pub use axum_server::{AxumServer, AxumServerFactory};

use crate::config::HttpServerConfig;
use crate::errors::GatewayError;
use crate::handlers::HandlerList;
use async_trait::async_trait;
use std::fmt;

/// Fixed port of the reverse-proxy connector the upstream web server
/// forwards SSO traffic to.
pub const REVERSE_PROXY_PORT: u16 = 8009;

/// Transport a connector speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Tls,
    /// Listener for traffic forwarded by an upstream web server.
    ReverseProxy,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectorKind::Http => "http",
            ConnectorKind::Tls => "tls",
            ConnectorKind::ReverseProxy => "reverse-proxy",
        })
    }
}

/// A network listener of the embedded server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub kind: ConnectorKind,
    /// Host to bind; all interfaces when `None`.
    pub host: Option<String>,
    pub port: u16,
}

impl Connector {
    #[must_use]
    pub fn http(host: Option<String>, port: u16) -> Self {
        Self {
            kind: ConnectorKind::Http,
            host,
            port,
        }
    }

    #[must_use]
    pub fn tls(host: Option<String>, port: u16) -> Self {
        Self {
            kind: ConnectorKind::Tls,
            host,
            port,
        }
    }

    /// Reverse-proxy connector on [`REVERSE_PROXY_PORT`], all interfaces.
    #[must_use]
    pub fn reverse_proxy() -> Self {
        Self {
            kind: ConnectorKind::ReverseProxy,
            host: None,
            port: REVERSE_PROXY_PORT,
        }
    }

    /// `host:port` suitable for binding; hostnames are resolved at bind time.
    /// IPv6 literals are bracketed (`[::1]:8888`).
    #[must_use]
    pub fn address(&self) -> String {
        match self.host.as_deref() {
            None => format!("0.0.0.0:{}", self.port),
            Some(host) if host.contains(':') && !host.starts_with('[') => {
                format!("[{host}]:{}", self.port)
            }
            Some(host) => format!("{host}:{}", self.port),
        }
    }
}

/// Connectors implied by the shared server configuration.
#[must_use]
pub fn configured_connectors(config: &HttpServerConfig) -> Vec<Connector> {
    let mut connectors = Vec::new();
    if let Some(port) = config.port {
        connectors.push(Connector::http(config.host.clone(), port));
    }
    if config.tls_enabled() {
        connectors.push(Connector::tls(config.host.clone(), config.tls_port));
    }
    connectors
}

/// Embedded HTTP server.
#[async_trait]
pub trait HttpServer: Send + Sync {
    /// Append handlers after those already installed.
    fn add_handlers(&mut self, handlers: HandlerList);

    /// Add a connector in addition to the configured ones.
    fn add_connector(&mut self, connector: Connector);

    /// Bind every connector and start serving.
    ///
    /// # Errors
    ///
    /// Fails fast if any connector cannot be bound; nothing is left serving.
    async fn start(&mut self) -> Result<(), GatewayError>;

    /// Stop serving. Safe to call on a server that never started.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Server` if a serving task failed.
    async fn stop(&mut self) -> Result<(), GatewayError>;
}

/// Creates embedded servers from the shared configuration.
pub trait HttpServerFactory: Send + Sync {
    fn create_server(&self, config: &HttpServerConfig) -> Box<dyn HttpServer>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_connectors_default() {
        let connectors = configured_connectors(&HttpServerConfig::default());
        assert_eq!(connectors, vec![Connector::http(None, 8888)]);
    }

    #[test]
    fn test_configured_connectors_with_tls() {
        let config = HttpServerConfig {
            host: Some("127.0.0.1".to_string()),
            port: None,
            tls_port: 8843,
            key_store_path: Some("/etc/keystore".to_string()),
        };

        let connectors = configured_connectors(&config);
        assert_eq!(
            connectors,
            vec![Connector::tls(Some("127.0.0.1".to_string()), 8843)]
        );
    }

    #[test]
    fn test_connector_address() {
        assert_eq!(Connector::reverse_proxy().address(), "0.0.0.0:8009");
        assert_eq!(
            Connector::http(Some("localhost".to_string()), 8888).address(),
            "localhost:8888"
        );
    }

    #[test]
    fn test_connector_address_brackets_ipv6() {
        assert_eq!(
            Connector::http(Some("::1".to_string()), 8888).address(),
            "[::1]:8888"
        );
        assert_eq!(
            Connector::http(Some("[::1]".to_string()), 8888).address(),
            "[::1]:8888",
            "already bracketed hosts are left alone"
        );
        assert!(Connector::http(Some("::1".to_string()), 8888)
            .address()
            .parse::<std::net::SocketAddr>()
            .is_ok());
    }
}
