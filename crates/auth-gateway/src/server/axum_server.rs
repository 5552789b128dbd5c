//! axum implementation of the embedded HTTP server.
//!
//! Every connector gets its own listener and serving task; all of them share
//! one router built from the handler list. Listeners are bound before any
//! task is spawned so a bind failure leaves nothing running.
//!
//! The reverse-proxy connector speaks HTTP/1.1: the upstream web server
//! forwards with `mod_proxy_http` (or equivalent) and passes the SSO
//! attributes as request headers. TLS is terminated upstream; a TLS connector
//! is rejected at start.

use super::{configured_connectors, Connector, ConnectorKind, HttpServer, HttpServerFactory};
use crate::config::HttpServerConfig;
use crate::errors::GatewayError;
use crate::handlers::HandlerList;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Embedded server backed by `axum::serve`.
pub struct AxumServer {
    connectors: Vec<Connector>,
    handlers: HandlerList,
    running: Option<Running>,
}

struct Running {
    shutdown_token: CancellationToken,
    tasks: Vec<JoinHandle<std::io::Result<()>>>,
    local_addrs: Vec<(ConnectorKind, SocketAddr)>,
}

impl AxumServer {
    /// Create a server with the connectors implied by `config`.
    #[must_use]
    pub fn new(config: &HttpServerConfig) -> Self {
        Self {
            connectors: configured_connectors(config),
            handlers: HandlerList::new(),
            running: None,
        }
    }

    #[must_use]
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerList {
        &self.handlers
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Bound address of the first connector of `kind`, once started.
    #[must_use]
    pub fn local_addr(&self, kind: ConnectorKind) -> Option<SocketAddr> {
        self.running.as_ref().and_then(|running| {
            running
                .local_addrs
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, addr)| *addr)
        })
    }
}

#[async_trait]
impl HttpServer for AxumServer {
    fn add_handlers(&mut self, handlers: HandlerList) {
        self.handlers.extend(handlers);
    }

    fn add_connector(&mut self, connector: Connector) {
        self.connectors.push(connector);
    }

    async fn start(&mut self) -> Result<(), GatewayError> {
        if self.running.is_some() {
            return Err(GatewayError::Server("server already running".to_string()));
        }
        if self.connectors.is_empty() {
            return Err(GatewayError::Server("no connectors configured".to_string()));
        }
        if self.connectors.iter().any(|c| c.kind == ConnectorKind::Tls) {
            error!(
                target: "auth_gateway.server",
                "TLS connector configured but TLS must be terminated upstream"
            );
            return Err(GatewayError::UnsupportedConnector(ConnectorKind::Tls));
        }

        // Bind everything first: fail fast without leaving tasks behind
        let mut listeners = Vec::with_capacity(self.connectors.len());
        for connector in &self.connectors {
            let addr = connector.address();
            let listener = TcpListener::bind(&addr).await.map_err(|e| {
                error!(
                    target: "auth_gateway.server",
                    error = %e,
                    kind = %connector.kind,
                    addr = %addr,
                    "Failed to bind connector"
                );
                GatewayError::Bind {
                    kind: connector.kind,
                    addr: addr.clone(),
                    reason: e.to_string(),
                }
            })?;
            let local_addr = listener
                .local_addr()
                .map_err(|e| GatewayError::Server(format!("Failed to read bound address: {e}")))?;
            info!(
                target: "auth_gateway.server",
                kind = %connector.kind,
                addr = %local_addr,
                "Connector bound successfully"
            );
            listeners.push((connector.kind, local_addr, listener));
        }

        let app = self
            .handlers
            .to_router()
            .layer(TraceLayer::new_for_http());

        let shutdown_token = CancellationToken::new();
        let mut tasks = Vec::with_capacity(listeners.len());
        let mut local_addrs = Vec::with_capacity(listeners.len());

        for (kind, addr, listener) in listeners {
            let connector_token = shutdown_token.child_token();
            let app = app.clone();
            tasks.push(tokio::spawn(async move {
                info!(target: "auth_gateway.server", kind = %kind, addr = %addr, "Connector serving");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        connector_token.cancelled().await;
                        info!(target: "auth_gateway.server", kind = %kind, addr = %addr, "Connector shutting down");
                    })
                    .await
            }));
            local_addrs.push((kind, addr));
        }

        info!(
            target: "auth_gateway.server",
            connectors = local_addrs.len(),
            handlers = self.handlers.len(),
            "Embedded HTTP server started"
        );

        self.running = Some(Running {
            shutdown_token,
            tasks,
            local_addrs,
        });
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), GatewayError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.shutdown_token.cancel();

        let mut result = Ok(());
        for task in running.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(target: "auth_gateway.server", error = %e, "Connector failed while serving");
                    result = Err(GatewayError::Server(format!("Connector failed: {e}")));
                }
                Err(e) => {
                    warn!(target: "auth_gateway.server", error = %e, "Connector task aborted");
                    result = Err(GatewayError::Server(format!("Connector task aborted: {e}")));
                }
            }
        }

        info!(target: "auth_gateway.server", "Embedded HTTP server stopped");
        result
    }
}

/// Factory producing [`AxumServer`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxumServerFactory;

impl HttpServerFactory for AxumServerFactory {
    fn create_server(&self, config: &HttpServerConfig) -> Box<dyn HttpServer> {
        Box::new(AxumServer::new(config))
    }
}
