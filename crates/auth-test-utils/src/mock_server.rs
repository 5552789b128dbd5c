//! Recording embedded server factory.
//!
//! Every server created by [`MockServerFactory`] reports into shared state,
//! so a test keeps its factory handle and inspects what the gateway did
//! after the server itself has been handed over.

use async_trait::async_trait;
use auth_gateway::config::HttpServerConfig;
use auth_gateway::errors::GatewayError;
use auth_gateway::handlers::{HandlerKind, HandlerList};
use auth_gateway::server::{configured_connectors, Connector, HttpServer, HttpServerFactory};
use std::sync::{Arc, Mutex};

/// What one mock server saw.
#[derive(Debug, Clone, Default)]
pub struct ServerRecord {
    pub config: Option<HttpServerConfig>,
    pub handlers: Vec<HandlerKind>,
    pub connectors: Vec<Connector>,
    pub started: bool,
    pub stop_calls: usize,
}

#[derive(Debug, Default)]
struct FactoryState {
    servers: Vec<ServerRecord>,
    fail_start: bool,
}

/// Factory of [`MockServer`]s.
#[derive(Debug, Clone, Default)]
pub struct MockServerFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockServerFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose servers fail to start, like a port already in use.
    #[must_use]
    pub fn failing_start() -> Self {
        let factory = Self::default();
        factory.state.lock().unwrap().fail_start = true;
        factory
    }

    /// Number of servers created.
    pub fn created_count(&self) -> usize {
        self.state.lock().unwrap().servers.len()
    }

    /// Number of servers currently started.
    pub fn started_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .servers
            .iter()
            .filter(|s| s.started)
            .count()
    }

    /// Record of the `index`-th created server.
    ///
    /// # Panics
    ///
    /// Panics if fewer servers were created.
    pub fn server(&self, index: usize) -> ServerRecord {
        self.state.lock().unwrap().servers[index].clone()
    }
}

impl HttpServerFactory for MockServerFactory {
    fn create_server(&self, config: &HttpServerConfig) -> Box<dyn HttpServer> {
        let mut state = self.state.lock().unwrap();
        let index = state.servers.len();
        state.servers.push(ServerRecord {
            config: Some(config.clone()),
            connectors: configured_connectors(config),
            ..ServerRecord::default()
        });
        Box::new(MockServer {
            state: Arc::clone(&self.state),
            index,
        })
    }
}

/// Server that records into its factory's state instead of binding.
#[derive(Debug)]
pub struct MockServer {
    state: Arc<Mutex<FactoryState>>,
    index: usize,
}

impl MockServer {
    fn with_record<R>(&self, f: impl FnOnce(&mut ServerRecord) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state.servers[self.index])
    }
}

#[async_trait]
impl HttpServer for MockServer {
    fn add_handlers(&mut self, handlers: HandlerList) {
        self.with_record(|r| r.handlers.extend(handlers.kinds()));
    }

    fn add_connector(&mut self, connector: Connector) {
        self.with_record(|r| r.connectors.push(connector));
    }

    async fn start(&mut self) -> Result<(), GatewayError> {
        if self.state.lock().unwrap().fail_start {
            return Err(GatewayError::Server("mock start failure".to_string()));
        }
        self.with_record(|r| r.started = true);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), GatewayError> {
        self.with_record(|r| {
            r.started = false;
            r.stop_calls += 1;
        });
        Ok(())
    }
}
