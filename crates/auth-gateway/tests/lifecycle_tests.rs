//! Gateway lifecycle integration tests.
//!
//! Drive [`AuthGateway`] against the recording registry and server factory
//! from `auth-test-utils`, covering the three deployment scenarios and the
//! shutdown/unwind guarantees.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use auth_gateway::authority::{AuthenticationAuthority, AuthorityKind, AuthorityVariant};
use auth_gateway::errors::GatewayError;
use auth_gateway::handlers::HandlerKind;
use auth_gateway::server::{Connector, ConnectorKind, REVERSE_PROXY_PORT};
use auth_gateway::{LifecycleState, AUTHORITY_SERVICE};
use auth_test_utils::*;

/// Disabled: nothing created, nothing published, nothing served.
#[tokio::test]
async fn test_disabled_gateway_creates_no_resources() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(disabled_config(), &registry, &servers);

    gateway.start().await?;

    assert_eq!(gateway.state(), LifecycleState::Disabled);
    assert!(gateway.authority().is_none());
    assert!(gateway.variant().is_none());
    assert!(registry.calls().is_empty());
    assert_eq!(servers.created_count(), 0);

    gateway.stop().await?;
    assert!(registry.calls().is_empty());
    Ok(())
}

/// Empty login URL behaves like an absent one.
#[tokio::test]
async fn test_empty_login_url_disables_gateway() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let source = disabled_config().with("org.jitsi.jicofo.auth.URL", "");
    let mut gateway = gateway_with(source, &registry, &servers);

    gateway.start().await?;

    assert_eq!(gateway.state(), LifecycleState::Disabled);
    assert_eq!(registry.published_count(), 0);
    Ok(())
}

/// XMPP: authority published and started, no HTTP server.
#[tokio::test]
async fn test_xmpp_gateway_has_no_server() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(xmpp_config(), &registry, &servers);

    gateway.start().await?;

    assert_eq!(gateway.state(), LifecycleState::Started);
    assert_eq!(
        gateway.variant(),
        Some(&AuthorityVariant::XmppDomain {
            domain: TEST_XMPP_DOMAIN.to_string()
        })
    );
    assert_eq!(servers.created_count(), 0, "XMPP needs no web surface");

    let authority = registry
        .lookup::<Arc<dyn AuthenticationAuthority>>(AUTHORITY_SERVICE)
        .expect("authority should be discoverable");
    assert_eq!(authority.kind(), AuthorityKind::XmppDomain);

    gateway.stop().await?;
    assert_eq!(registry.published_count(), 0);
    Ok(())
}

/// Shibboleth: SSO handler before health check, reverse-proxy connector.
#[tokio::test]
async fn test_shibboleth_gateway_starts_server() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(shibboleth_config(), &registry, &servers);

    gateway.start().await?;

    assert_eq!(gateway.state(), LifecycleState::Started);
    assert_eq!(servers.created_count(), 1);
    assert_eq!(servers.started_count(), 1);

    let server = servers.server(0);
    assert_eq!(
        server.handlers,
        vec![HandlerKind::ShibbolethLogin, HandlerKind::HealthCheck]
    );
    assert_eq!(
        server.connectors,
        vec![Connector::http(None, 8888), Connector::reverse_proxy()]
    );
    assert!(server
        .connectors
        .iter()
        .any(|c| c.kind == ConnectorKind::ReverseProxy && c.port == REVERSE_PROXY_PORT));

    let authority = gateway.authority().expect("authority live while started");
    assert_eq!(authority.kind(), AuthorityKind::ShibbolethSso);
    assert!(authority.is_external());

    gateway.stop().await?;
    assert_eq!(servers.started_count(), 0);
    assert_eq!(servers.server(0).stop_calls, 1);
    Ok(())
}

/// Shutdown order: server, then registry entry, then authority.
#[tokio::test]
async fn test_shutdown_releases_everything_once() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(shibboleth_config(), &registry, &servers);

    gateway.start().await?;
    gateway.stop().await?;
    gateway.stop().await?;

    let calls = registry.calls();
    assert_eq!(calls.len(), 2, "one publish, one withdraw: {calls:?}");
    assert!(matches!(calls[0], RegistryCall::Publish { .. }));
    assert!(matches!(calls[1], RegistryCall::Withdraw { .. }));
    assert_eq!(servers.server(0).stop_calls, 1, "server stopped exactly once");

    assert!(gateway.authority().is_none());
    assert_eq!(gateway.state(), LifecycleState::Stopped);
    Ok(())
}

/// Stop without start is a no-op.
#[tokio::test]
async fn test_stop_before_start_is_noop() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(shibboleth_config(), &registry, &servers);

    gateway.stop().await?;

    assert!(registry.calls().is_empty());
    assert_eq!(servers.created_count(), 0);
    assert_eq!(gateway.state(), LifecycleState::Stopped);
    Ok(())
}

/// Server start failure unwinds the publication and returns the original
/// error.
#[tokio::test]
async fn test_server_start_failure_unwinds() {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::failing_start();
    let mut gateway = gateway_with(shibboleth_config(), &registry, &servers);

    let result = gateway.start().await;

    assert!(
        matches!(result, Err(GatewayError::Server(ref msg)) if msg.contains("mock start failure")),
        "original error expected, got {result:?}"
    );
    assert_eq!(gateway.state(), LifecycleState::Stopped);
    assert!(gateway.authority().is_none());
    assert!(!gateway.has_server());
    assert_eq!(registry.published_count(), 0, "publication withdrawn");
    assert_eq!(servers.server(0).stop_calls, 1, "failed server still stopped");
    assert!(!gateway.health_state().is_ready());
}

/// Authority start failure: the registry entry is withdrawn and no server
/// is ever created, since the authority starts before the server.
#[test]
fn test_authority_start_failure_unwinds() {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(shibboleth_config(), &registry, &servers);

    // No tokio runtime: the session sweeper cannot be spawned
    let result = block_on_without_runtime(gateway.start());

    assert!(
        matches!(result, Err(GatewayError::Authority(_))),
        "authority error expected, got {result:?}"
    );
    let calls = registry.calls();
    assert_eq!(calls.len(), 2, "one publish, one withdraw: {calls:?}");
    assert!(matches!(calls[0], RegistryCall::Publish { .. }));
    assert!(matches!(calls[1], RegistryCall::Withdraw { .. }));
    assert_eq!(registry.published_count(), 0);
    assert_eq!(servers.created_count(), 0, "server never created");
    assert!(!gateway.has_server());
    assert!(gateway.authority().is_none());
    assert_eq!(gateway.state(), LifecycleState::Stopped);
    assert!(!gateway.health_state().is_ready());
}

/// With a server in play, the authority still starts first: its failure
/// leaves the server uncreated.
#[test]
fn test_authority_start_failure_with_always_start_creates_no_server() {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(xmpp_always_start_config(), &registry, &servers);

    let result = block_on_without_runtime(gateway.start());

    assert!(matches!(result, Err(GatewayError::Authority(_))));
    assert_eq!(servers.created_count(), 0);
    assert_eq!(registry.published_count(), 0);
    assert_eq!(gateway.state(), LifecycleState::Stopped);
}

/// Registry failure: nothing left behind, error propagated.
#[tokio::test]
async fn test_publish_failure_unwinds() {
    let registry = MockRegistry::new();
    registry.fail_publish();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(xmpp_config(), &registry, &servers);

    let result = gateway.start().await;

    assert!(matches!(result, Err(GatewayError::Registry(_))));
    assert!(gateway.authority().is_none());
    assert_eq!(servers.created_count(), 0);
    assert_eq!(gateway.state(), LifecycleState::Stopped);
}

/// After a failed start the gateway can be started again.
#[tokio::test]
async fn test_restart_after_failed_start() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(shibboleth_config(), &registry, &servers);

    registry.fail_publish();
    assert!(gateway.start().await.is_err());

    registry.allow_publish();
    gateway.start().await?;
    assert_eq!(gateway.state(), LifecycleState::Started);
    assert_eq!(registry.published_count(), 1);
    assert_eq!(servers.started_count(), 1);

    gateway.stop().await?;
    Ok(())
}

/// Always-start policy: XMPP gets a server with only the health check.
#[tokio::test]
async fn test_always_start_policy_serves_health_for_xmpp() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(xmpp_always_start_config(), &registry, &servers);

    gateway.start().await?;

    assert_eq!(servers.started_count(), 1);
    let server = servers.server(0);
    assert_eq!(server.handlers, vec![HandlerKind::HealthCheck]);
    assert!(
        server
            .connectors
            .iter()
            .all(|c| c.kind != ConnectorKind::ReverseProxy),
        "No reverse-proxy connector without Shibboleth"
    );

    gateway.stop().await?;
    Ok(())
}

/// Always-start policy has no effect on a disabled gateway.
#[tokio::test]
async fn test_always_start_policy_does_not_enable_disabled_gateway() -> Result<(), anyhow::Error>
{
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let source = disabled_config().with("org.jitsi.jicofo.auth.HTTP_ALWAYS_START", "true");
    let mut gateway = gateway_with(source, &registry, &servers);

    gateway.start().await?;

    assert_eq!(gateway.state(), LifecycleState::Disabled);
    assert_eq!(servers.created_count(), 0);
    Ok(())
}

/// Shibboleth with the plain connector disabled and no TLS: no server.
#[tokio::test]
async fn test_shibboleth_without_connectors_skips_server() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let source = shibboleth_config().with("org.jitsi.jicofo.auth.jetty.port", "-1");
    let mut gateway = gateway_with(source, &registry, &servers);

    gateway.start().await?;

    assert_eq!(gateway.state(), LifecycleState::Started);
    assert_eq!(servers.created_count(), 0);
    assert_eq!(registry.published_count(), 1);

    gateway.stop().await?;
    Ok(())
}

/// Start twice without stop is rejected and changes nothing.
#[tokio::test]
async fn test_double_start_rejected() -> Result<(), anyhow::Error> {
    let registry = MockRegistry::new();
    let servers = MockServerFactory::new();
    let mut gateway = gateway_with(shibboleth_config(), &registry, &servers);

    gateway.start().await?;
    let second = gateway.start().await;

    assert!(matches!(second, Err(GatewayError::AlreadyStarted)));
    assert_eq!(servers.created_count(), 1);
    assert_eq!(registry.published_count(), 1);
    assert_eq!(gateway.state(), LifecycleState::Started);

    gateway.stop().await?;
    Ok(())
}
