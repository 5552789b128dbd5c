//! Shibboleth single-sign-on authority.
//!
//! Shibboleth sits behind an upstream web server that authenticates the user
//! and forwards the request, with the identity attributes attached, over the
//! reverse-proxy connector. This authority only turns a forwarded identity
//! into an authentication session; everything about the IdP round trip is
//! the upstream's business.

use super::session::{AuthSession, AuthorityCore};
use super::{AuthenticationAuthority, AuthorityKind};
use crate::errors::GatewayError;
use std::fmt;
use std::time::Duration;

/// Web-based SSO authority.
#[derive(Debug)]
pub struct ShibbolethAuthority {
    login_url: String,
    logout_url: Option<String>,
    core: AuthorityCore,
}

impl ShibbolethAuthority {
    /// Construct without starting.
    #[must_use]
    pub fn new(
        login_url: impl Into<String>,
        logout_url: Option<String>,
        lifetime: Duration,
        disable_autologin: bool,
    ) -> Self {
        Self {
            login_url: login_url.into(),
            logout_url,
            core: AuthorityCore::new(lifetime, disable_autologin),
        }
    }

    /// Login URL pattern, passed through uninterpreted.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Logout URL pattern, if configured.
    #[must_use]
    pub fn logout_url(&self) -> Option<&str> {
        self.logout_url.as_deref()
    }

    /// Create a session for an identity the upstream already authenticated.
    pub fn authenticate_user(&self, machine_uid: &str, identity: &str, room: &str) -> AuthSession {
        self.core.sessions().create(machine_uid, identity, room)
    }

    /// Whether the session sweeper is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.core.is_running()
    }
}

impl fmt::Display for ShibbolethAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shibboleth authority (login: {})", self.login_url)
    }
}

impl AuthenticationAuthority for ShibbolethAuthority {
    fn kind(&self) -> AuthorityKind {
        AuthorityKind::ShibbolethSso
    }

    fn is_external(&self) -> bool {
        true
    }

    fn session(&self, session_id: &str) -> Option<AuthSession> {
        self.core.sessions().get(session_id)
    }

    fn conference_ended(&self, room: &str) {
        self.core.conference_ended(room);
    }

    fn start(&self) -> Result<(), GatewayError> {
        self.core.start()
    }

    fn stop(&self) {
        self.core.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn authority() -> ShibbolethAuthority {
        ShibbolethAuthority::new(
            "https://sso.example.com/login",
            Some("https://sso.example.com/logout".to_string()),
            Duration::from_secs(60),
            false,
        )
    }

    #[test]
    fn test_accessors() {
        let authority = authority();
        assert_eq!(authority.login_url(), "https://sso.example.com/login");
        assert_eq!(
            authority.logout_url(),
            Some("https://sso.example.com/logout")
        );
        assert_eq!(authority.kind(), AuthorityKind::ShibbolethSso);
        assert!(authority.is_external());
        assert!(!authority.is_running(), "Construction does not start");
    }

    #[test]
    fn test_authenticate_user_creates_session() {
        let authority = authority();
        let session = authority.authenticate_user("machine-1", "alice@example.com", "room1");

        let found = authority
            .session(&session.session_id)
            .expect("session should exist");
        assert_eq!(found.identity, "alice@example.com");
        assert_eq!(found.machine_uid, "machine-1");
    }

    #[tokio::test]
    async fn test_stop_drops_sessions() {
        let authority = authority();
        authority.start().expect("start should succeed");
        let session = authority.authenticate_user("machine-1", "alice", "room1");

        authority.stop();

        assert!(!authority.is_running());
        assert!(authority.session(&session.session_id).is_none());
    }
}
