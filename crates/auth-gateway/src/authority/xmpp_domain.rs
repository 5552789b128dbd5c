//! XMPP domain authority.
//!
//! Users are authenticated by the XMPP server itself: anyone whose JID
//! belongs to the configured domain is considered authenticated. There is
//! no web surface.

use super::session::{AuthSession, AuthorityCore};
use super::{AuthenticationAuthority, AuthorityKind};
use crate::errors::GatewayError;
use std::fmt;
use std::time::Duration;

/// Domain-based authority.
#[derive(Debug)]
pub struct XmppDomainAuthority {
    domain: String,
    core: AuthorityCore,
}

impl XmppDomainAuthority {
    /// Construct without starting.
    #[must_use]
    pub fn new(domain: impl Into<String>, lifetime: Duration, disable_autologin: bool) -> Self {
        Self {
            domain: domain.into(),
            core: AuthorityCore::new(lifetime, disable_autologin),
        }
    }

    /// Domain whose users are trusted.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Whether `jid` (`user@domain/resource`) belongs to the trusted domain.
    #[must_use]
    pub fn is_trusted_jid(&self, jid: &str) -> bool {
        let bare = jid.split('/').next().unwrap_or(jid);
        let domain = bare.rsplit_once('@').map_or(bare, |(_, domain)| domain);
        domain.eq_ignore_ascii_case(&self.domain)
    }

    /// Create a session for `jid` if it belongs to the trusted domain.
    pub fn authenticate_jid(&self, machine_uid: &str, jid: &str, room: &str) -> Option<AuthSession> {
        if !self.is_trusted_jid(jid) {
            return None;
        }
        Some(self.core.sessions().create(machine_uid, jid, room))
    }

    /// Whether the session sweeper is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.core.is_running()
    }
}

impl fmt::Display for XmppDomainAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XMPP domain authority (domain: {})", self.domain)
    }
}

impl AuthenticationAuthority for XmppDomainAuthority {
    fn kind(&self) -> AuthorityKind {
        AuthorityKind::XmppDomain
    }

    fn is_external(&self) -> bool {
        false
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
