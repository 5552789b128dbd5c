//! Gateway lifecycle.
//!
//! [`AuthGateway`] owns every resource the gateway creates (authority,
//! registry entry, embedded server) and sequences their creation and release.
//!
//! ```text
//! Stopped -> ConfigLoaded -> AuthoritySelected -> Published -> Started
//!                 |
//!                 +-> Disabled (no login URL)
//! ```
//!
//! Startup: resolve config, build the authority, publish it, start the
//! authority, start the HTTP server if needed. Shutdown stops the server,
//! withdraws the registry entry, then stops the authority.

use crate::authority::{AuthenticationAuthority, AuthorityFactory, AuthorityHandle, AuthorityVariant};
use crate::config::{GatewayConfig, HttpServerConfig, ServerPolicy};
use crate::errors::GatewayError;
use crate::handlers::HandlerChainBuilder;
use crate::observability::{metrics, HealthState};
use crate::server::{HttpServer, HttpServerFactory};
use common::config::ConfigSource;
use common::registry::{RegistryEntry, ServiceRegistry};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registry service name the authority is published under.
pub const AUTHORITY_SERVICE: &str = "AuthenticationAuthority";

/// Lifecycle state of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    ConfigLoaded,
    AuthoritySelected,
    Published,
    Started,
    /// Started without authentication (no login URL configured).
    Disabled,
}

impl LifecycleState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Stopped => "stopped",
            LifecycleState::ConfigLoaded => "config_loaded",
            LifecycleState::AuthoritySelected => "authority_selected",
            LifecycleState::Published => "published",
            LifecycleState::Started => "started",
            LifecycleState::Disabled => "disabled",
        }
    }

    /// Whether the gateway counts as started.
    #[must_use]
    pub fn is_started(self) -> bool {
        matches!(self, LifecycleState::Started | LifecycleState::Disabled)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authentication gateway.
///
/// Collaborators are injected: the host configuration service, the service
/// registry and the embedded server factory.
pub struct AuthGateway {
    config_source: Arc<dyn ConfigSource>,
    registry: Arc<dyn ServiceRegistry>,
    server_factory: Arc<dyn HttpServerFactory>,
    health_state: Arc<HealthState>,
    state: LifecycleState,
    variant: Option<AuthorityVariant>,
    authority: Option<AuthorityHandle>,
    registration: Option<RegistryEntry>,
    server: Option<Box<dyn HttpServer>>,
}

impl fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGateway")
            .field("state", &self.state)
            .field("variant", &self.variant)
            .field("registration", &self.registration)
            .field("server_running", &self.server.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthGateway {
    #[must_use]
    pub fn new(
        config_source: Arc<dyn ConfigSource>,
        registry: Arc<dyn ServiceRegistry>,
        server_factory: Arc<dyn HttpServerFactory>,
        health_state: Arc<HealthState>,
    ) -> Self {
        Self {
            config_source,
            registry,
            server_factory,
            health_state,
            state: LifecycleState::Stopped,
            variant: None,
            authority: None,
            registration: None,
            server: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Variant selected by the last startup, if any.
    #[must_use]
    pub fn variant(&self) -> Option<&AuthorityVariant> {
        self.variant.as_ref()
    }

    /// The live authority; `Some` only between a successful start and the
    /// matching stop.
    #[must_use]
    pub fn authority(&self) -> Option<Arc<dyn AuthenticationAuthority>> {
        self.authority.as_ref().map(AuthorityHandle::as_authority)
    }

    #[must_use]
    pub fn registration(&self) -> Option<&RegistryEntry> {
        self.registration.as_ref()
    }

    #[must_use]
    pub fn has_server(&self) -> bool {
        self.server.is_some()
    }

    #[must_use]
    pub fn health_state(&self) -> &Arc<HealthState> {
        &self.health_state
    }

    /// Start the gateway.
    ///
    /// # Errors
    ///
    /// - `GatewayError::AlreadyStarted` if started twice without a stop
    /// - Any registry, server or authority failure. Resources created before
    ///   the failure are released first and the original error is returned.
    pub async fn start(&mut self) -> Result<(), GatewayError> {
        if self.state.is_started() {
            warn!(target: "auth_gateway.lifecycle", state = %self.state, "Start called twice");
            return Err(GatewayError::AlreadyStarted);
        }

        match self.try_start().await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(
                    target: "auth_gateway.lifecycle",
                    error = %e,
                    state = %self.state,
                    "Gateway startup failed, releasing partial state"
                );
                if let Err(unwind_err) = self.stop().await {
                    warn!(
                        target: "auth_gateway.lifecycle",
                        error = %unwind_err,
                        "Error while releasing partial startup state"
                    );
                }
                Err(e)
            }
        }
    }

    async fn try_start(&mut self) -> Result<(), GatewayError> {
        let config = GatewayConfig::resolve(self.config_source.as_ref());
        self.transition(LifecycleState::ConfigLoaded);

        let Some((variant, handle)) = AuthorityFactory::create(&config) else {
            info!(target: "auth_gateway.lifecycle", "No login URL configured, authentication disabled");
            self.transition(LifecycleState::Disabled);
            self.health_state.set_ready();
            return Ok(());
        };
        self.variant = Some(variant.clone());
        self.authority = Some(handle.clone());
        self.transition(LifecycleState::AuthoritySelected);

        let entry = self
            .registry
            .publish(AUTHORITY_SERVICE, Box::new(handle.as_authority()))?;
        info!(target: "auth_gateway.lifecycle", entry = %entry, "Authority published");
        self.registration = Some(entry);
        self.transition(LifecycleState::Published);

        // The SSO handler must never serve an authority that is not running
        handle.start()?;

        if should_start_server(&variant, config.server_policy) {
            let http_config = HttpServerConfig::resolve(self.config_source.as_ref());
            if http_config.has_connectors() {
                self.start_server(&http_config, &handle).await?;
            } else {
                warn!(
                    target: "auth_gateway.lifecycle",
                    kind = %variant.kind(),
                    "HTTP server required but no connector is enabled, not starting it"
                );
            }
        } else {
            debug!(
                target: "auth_gateway.lifecycle",
                kind = %variant.kind(),
                "Authority has no web surface, HTTP server not started"
            );
        }

        self.transition(LifecycleState::Started);
        self.health_state.set_ready();
        info!(
            target: "auth_gateway.lifecycle",
            kind = %handle.kind(),
            server = self.server.is_some(),
            "Auth gateway started"
        );
        Ok(())
    }

    async fn start_server(
        &mut self,
        http_config: &HttpServerConfig,
        handle: &AuthorityHandle,
    ) -> Result<(), GatewayError> {
        let mut server = self.server_factory.create_server(http_config);

        let (handlers, extra_connector) =
            HandlerChainBuilder::new(Arc::clone(&self.health_state)).build(Some(handle));
        server.add_handlers(handlers);
        if let Some(connector) = extra_connector {
            server.add_connector(connector);
        }

        // Kept before start so a failed start is still stopped on unwind
        let server = self.server.insert(server);
        server.start().await
    }

    /// Stop the gateway and release everything it created.
    ///
    /// Safe from any state, including after a failed start; a second call is
    /// a no-op. Every step runs even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first error met while stopping the server or withdrawing
    /// the registry entry.
    pub async fn stop(&mut self) -> Result<(), GatewayError> {
        self.health_state.set_not_ready();
        let mut result = Ok(());

        if let Some(mut server) = self.server.take() {
            if let Err(e) = server.stop().await {
                warn!(target: "auth_gateway.lifecycle", error = %e, "Failed to stop HTTP server");
                result = Err(e);
            }
        }

        if let Some(entry) = self.registration.take() {
            let id = entry.to_string();
            match self.registry.withdraw(entry) {
                Ok(()) => debug!(target: "auth_gateway.lifecycle", entry = %id, "Authority withdrawn"),
                Err(e) => {
                    warn!(target: "auth_gateway.lifecycle", error = %e, entry = %id, "Failed to withdraw authority");
                    if result.is_ok() {
                        result = Err(e.into());
                    }
                }
            }
        }

        if let Some(authority) = self.authority.take() {
            authority.stop();
            debug!(target: "auth_gateway.lifecycle", kind = %authority.kind(), "Authority stopped");
        }

        self.variant = None;
        if self.state != LifecycleState::Stopped {
            self.transition(LifecycleState::Stopped);
            info!(target: "auth_gateway.lifecycle", "Auth gateway stopped");
        }
        result
    }

    fn transition(&mut self, state: LifecycleState) {
        debug!(
            target: "auth_gateway.lifecycle",
            from = %self.state,
            to = %state,
            "Lifecycle transition"
        );
        self.state = state;
        metrics::record_lifecycle_transition(state.as_str());
    }
}

/// Whether the embedded server runs for `variant` under `policy`.
fn should_start_server(variant: &AuthorityVariant, policy: ServerPolicy) -> bool {
    variant.requires_web_surface() || policy == ServerPolicy::Always
}
