//! Configuration fixtures for the common deployment scenarios.

use crate::{MockRegistry, MockServerFactory};
use auth_gateway::config::{
    DISABLE_AUTOLOGIN_PNAME, HTTP_ALWAYS_START_PNAME, LOGIN_URL_PNAME, LOGOUT_URL_PNAME,
};
use auth_gateway::observability::HealthState;
use auth_gateway::AuthGateway;
use common::config::MapConfigSource;
use common::registry::ServiceRegistry;
use std::sync::Arc;

pub const TEST_SSO_LOGIN_URL: &str = "https://sso.example.com/Shibboleth.sso/Login";
pub const TEST_SSO_LOGOUT_URL: &str = "https://sso.example.com/Shibboleth.sso/Logout";
pub const TEST_XMPP_DOMAIN: &str = "auth.meet.example.com";

/// No login URL: authentication disabled.
#[must_use]
pub fn disabled_config() -> MapConfigSource {
    MapConfigSource::new()
}

/// `XMPP:<domain>` login URL.
#[must_use]
pub fn xmpp_config() -> MapConfigSource {
    MapConfigSource::new().with(LOGIN_URL_PNAME, format!("XMPP:{TEST_XMPP_DOMAIN}"))
}

/// Shibboleth login and logout URLs.
#[must_use]
pub fn shibboleth_config() -> MapConfigSource {
    MapConfigSource::new()
        .with(LOGIN_URL_PNAME, TEST_SSO_LOGIN_URL)
        .with(LOGOUT_URL_PNAME, TEST_SSO_LOGOUT_URL)
        .with(DISABLE_AUTOLOGIN_PNAME, "true")
}

/// XMPP variant with the HTTP server forced on.
#[must_use]
pub fn xmpp_always_start_config() -> MapConfigSource {
    xmpp_config().with(HTTP_ALWAYS_START_PNAME, "true")
}

/// Gateway wired to the mock collaborators.
#[must_use]
pub fn gateway_with(
    source: MapConfigSource,
    registry: &Arc<MockRegistry>,
    servers: &MockServerFactory,
) -> AuthGateway {
    AuthGateway::new(
        Arc::new(source),
        Arc::clone(registry) as Arc<dyn ServiceRegistry>,
        Arc::new(servers.clone()),
        Arc::new(HealthState::new()),
    )
}
