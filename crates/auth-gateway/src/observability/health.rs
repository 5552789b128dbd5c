//! Mandatory health-check endpoints.
//!
//! Served by the embedded HTTP server behind any SSO handler:
//! - `GET /about/health` - Conference focus health check used by monitoring
//!   (200 with a JSON status when live and ready, 503 otherwise)
//! - `GET /health` - Liveness probe (is the process running?)
//! - `GET /ready` - Readiness probe (has the gateway finished starting?)
//!
//! # Health State
//!
//! The `HealthState` tracks:
//! - `live`: Always true after startup (process is running)
//! - `ready`: True between a successful gateway start and the next stop

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Health state for the auth gateway.
#[derive(Debug)]
pub struct HealthState {
    /// Whether the service is live (process running).
    live: AtomicBool,
    /// Whether the gateway has completed startup.
    ready: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (live=true, ready=false).
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            ready: AtomicBool::new(false),
        }
    }

    /// Mark the gateway as ready.
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Mark the gateway as not ready (e.g., during shutdown).
    pub fn set_not_ready(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Live and ready.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.is_live() && self.is_ready()
    }
}

/// Body of `GET /about/health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub live: bool,
    pub ready: bool,
}

/// Create the health router.
///
/// # Endpoints
///
/// - `GET /about/health` - 200 + JSON when healthy, 503 + JSON otherwise
/// - `GET /health` - 200 if process is running (liveness)
/// - `GET /ready` - 200 if ready to serve traffic, 503 otherwise (readiness)
pub fn health_router(health_state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/about/health", get(health_check_handler))
        .route("/health", get(liveness_handler))
        .route("/ready", get(readiness_handler))
        .with_state(health_state)
}

async fn health_check_handler(
    State(state): State<Arc<HealthState>>,
) -> (StatusCode, Json<HealthReport>) {
    let status = if state.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthReport {
            live: state.is_live(),
            ready: state.is_ready(),
        }),
    )
}

/// Liveness probe handler.
async fn liveness_handler(State(state): State<Arc<HealthState>>) -> StatusCode {
    if state.is_live() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Readiness probe handler.
async fn readiness_handler(State(state): State<Arc<HealthState>>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
