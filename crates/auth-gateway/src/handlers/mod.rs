//! HTTP handler chain of the embedded server.
//!
//! Handlers are matched in order and the first one that routes a request
//! serves it; anything it does not route falls through to the next handler.
//! The SSO callback, when present, therefore always sits in front of the
//! health checks.

pub mod login;

use crate::authority::{AuthorityHandle, ShibbolethAuthority};
use crate::observability::{health_router, HealthState};
use crate::server::Connector;
use axum::Router;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Kind of a handler, for inspection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Shibboleth SSO callback (`/login`).
    ShibbolethLogin,
    /// Mandatory health checks (`/about/health`, `/health`, `/ready`).
    HealthCheck,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandlerKind::ShibbolethLogin => "shibboleth_login",
            HandlerKind::HealthCheck => "health_check",
        })
    }
}

/// A request handler bound to its state.
#[derive(Debug, Clone)]
pub enum Handler {
    ShibbolethLogin(Arc<ShibbolethAuthority>),
    HealthCheck(Arc<HealthState>),
}

impl Handler {
    #[must_use]
    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::ShibbolethLogin(_) => HandlerKind::ShibbolethLogin,
            Handler::HealthCheck(_) => HandlerKind::HealthCheck,
        }
    }

    /// Router serving this handler's routes.
    #[must_use]
    pub fn router(&self) -> Router {
        match self {
            Handler::ShibbolethLogin(authority) => login::login_router(Arc::clone(authority)),
            Handler::HealthCheck(state) => health_router(Arc::clone(state)),
        }
    }
}

/// Ordered handler sequence.
#[derive(Debug, Clone, Default)]
pub struct HandlerList {
    handlers: Vec<Handler>,
}

impl HandlerList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler at the end of the chain.
    pub fn push(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    /// Append every handler of `other`, keeping its order.
    pub fn extend(&mut self, other: HandlerList) {
        self.handlers.extend(other.handlers);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handler> {
        self.handlers.iter()
    }

    /// Handler kinds in chain order.
    #[must_use]
    pub fn kinds(&self) -> Vec<HandlerKind> {
        self.handlers.iter().map(Handler::kind).collect()
    }

    /// Compose the chain into one router.
    ///
    /// Built back to front: each handler's router falls back to the router
    /// of everything after it, so the first handler that routes a request
    /// short-circuits the rest. Requests nobody routes get a 404.
    #[must_use]
    pub fn to_router(&self) -> Router {
        self.handlers
            .iter()
            .rev()
            .fold(Router::new(), |rest, handler| {
                handler.router().fallback_service(rest)
            })
    }
}

/// Assembles the handler chain for the active authority.
#[derive(Debug, Clone)]
pub struct HandlerChainBuilder {
    health_state: Arc<HealthState>,
}

impl HandlerChainBuilder {
    #[must_use]
    pub fn new(health_state: Arc<HealthState>) -> Self {
        Self { health_state }
    }

    /// Build the handler list and the extra connector the authority needs.
    ///
    /// Shibboleth gets its SSO callback in front and a reverse-proxy
    /// connector. The health check handler is always last, whatever the
    /// authority, including none.
    #[must_use]
    pub fn build(&self, authority: Option<&AuthorityHandle>) -> (HandlerList, Option<Connector>) {
        let mut handlers = HandlerList::new();
        let mut extra_connector = None;

        if let Some(handle) = authority {
            if let AuthorityHandle::Shibboleth(shibboleth) = handle {
                handlers.push(Handler::ShibbolethLogin(Arc::clone(shibboleth)));
            }
            extra_connector = handle.kind().extra_connector();
        }

        handlers.push(Handler::HealthCheck(Arc::clone(&self.health_state)));

        debug!(
            target: "auth_gateway.handlers",
            handlers = ?handlers.kinds(),
            extra_connector = ?extra_connector.as_ref().map(|c| c.kind),
            "Handler chain built"
        );

        (handlers, extra_connector)
    }
}
