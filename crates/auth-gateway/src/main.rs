//! Auth Gateway
//!
//! Standalone host for the conference focus authentication gateway.
//!
//! # Startup Flow
//!
//! 1. Load process configuration from environment
//! 2. Initialize Prometheus metrics recorder and its scrape listener
//! 3. Create the service registry and the gateway with its collaborators
//! 4. Start the gateway (authority, registry entry, embedded HTTP server)
//! 5. Wait for shutdown signal, then stop the gateway

#![warn(clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use auth_gateway::authority::AuthenticationAuthority;
use auth_gateway::config::Config;
use auth_gateway::observability::HealthState;
use auth_gateway::server::AxumServerFactory;
use auth_gateway::{AuthGateway, AUTHORITY_SERVICE};
use common::config::EnvConfigSource;
use common::registry::{InMemoryServiceRegistry, ServiceRegistry};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Auth Gateway");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        metrics_bind_address = %config.metrics_bind_address,
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder
    // This must happen before any metrics are recorded
    let metrics_addr: SocketAddr = config.metrics_bind_address.parse().map_err(|e| {
        error!(error = %e, "Invalid metrics bind address");
        e
    })?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| {
            error!(error = %e, "Failed to install Prometheus metrics recorder");
            format!("Failed to install Prometheus metrics recorder: {e}")
        })?;
    info!(addr = %metrics_addr, "Prometheus metrics recorder initialized");

    let registry = InMemoryServiceRegistry::shared();
    let health_state = Arc::new(HealthState::new());

    let mut gateway = AuthGateway::new(
        Arc::new(EnvConfigSource::from_env()),
        Arc::clone(&registry) as Arc<dyn ServiceRegistry>,
        Arc::new(AxumServerFactory),
        Arc::clone(&health_state),
    );

    gateway.start().await.map_err(|e| {
        error!(error = %e, "Failed to start auth gateway");
        e
    })?;

    match registry.lookup::<Arc<dyn AuthenticationAuthority>>(AUTHORITY_SERVICE) {
        Some(authority) => info!(
            kind = %authority.kind(),
            external = authority.is_external(),
            "Authentication authority available"
        ),
        None => info!("Authentication disabled"),
    }

    info!(state = %gateway.state(), "Auth Gateway running - press Ctrl+C to shutdown");
    shutdown_signal().await;

    info!("Shutdown signal received, initiating graceful shutdown...");
    if let Err(e) = gateway.stop().await {
        warn!(error = %e, "Auth gateway shutdown error");
    }

    info!("Auth Gateway shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
