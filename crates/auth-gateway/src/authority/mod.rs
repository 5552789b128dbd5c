//! Authentication authorities and their selection.
//!
//! Exactly one authority is active at a time, or none when authentication is
//! disabled. Which one is decided from the login URL:
//!
//! | Login URL | Authority |
//! |-----------|-----------|
//! | absent or empty | none (gateway disabled) |
//! | `XMPP:<domain>` (any case) | [`XmppDomainAuthority`] for `<domain>` |
//! | anything else | [`ShibbolethAuthority`] with the URL as given |
//!
//! The selection is a sum type ([`AuthorityVariant`]) and the live authority
//! is a sum type as well ([`AuthorityHandle`]), so everything downstream
//! (handler chain, connectors, server start decision) pattern-matches on the
//! variant instead of inspecting the authority object.

pub mod session;
pub mod shibboleth;
pub mod xmpp_domain;

pub use session::{AuthSession, SessionStore};
pub use shibboleth::ShibbolethAuthority;
pub use xmpp_domain::XmppDomainAuthority;

use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::server::Connector;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Case-insensitive login URL prefix selecting the XMPP domain authority.
pub const XMPP_PREFIX: &str = "XMPP:";

/// Capability published to the service registry.
///
/// Consumers discover it as `Arc<dyn AuthenticationAuthority>`.
pub trait AuthenticationAuthority: Send + Sync + fmt::Debug {
    /// Which variant this authority implements.
    fn kind(&self) -> AuthorityKind;

    /// Whether users authenticate outside the conference signalling (web SSO).
    fn is_external(&self) -> bool;

    /// Look up an authentication session.
    fn session(&self, session_id: &str) -> Option<AuthSession>;

    /// Notify the authority that a conference room has ended.
    fn conference_ended(&self, room: &str);

    /// Start background activity (session expiry).
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Authority` if the background task cannot start.
    fn start(&self) -> Result<(), GatewayError>;

    /// Stop background activity and drop sessions. Idempotent.
    fn stop(&self);
}

/// Authority variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorityKind {
    ShibbolethSso,
    XmppDomain,
}

impl AuthorityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthorityKind::ShibbolethSso => "shibboleth",
            AuthorityKind::XmppDomain => "xmpp_domain",
        }
    }

    /// Whether the variant needs the embedded HTTP server to function.
    #[must_use]
    pub fn requires_web_surface(self) -> bool {
        matches!(self, AuthorityKind::ShibbolethSso)
    }

    /// Extra connector the variant needs on the embedded server.
    #[must_use]
    pub fn extra_connector(self) -> Option<Connector> {
        match self {
            AuthorityKind::ShibbolethSso => Some(Connector::reverse_proxy()),
            AuthorityKind::XmppDomain => None,
        }
    }
}

impl fmt::Display for AuthorityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authority selected from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityVariant {
    ShibbolethSso {
        login_url: String,
        logout_url: Option<String>,
    },
    XmppDomain {
        domain: String,
    },
}

impl AuthorityVariant {
    /// Select the variant for a login URL. `None` means disabled.
    ///
    /// Only the exact prefix `XMPP:` (case-insensitive) is interpreted; any
    /// other value, however malformed, is handed to Shibboleth as-is.
    #[must_use]
    pub fn select(login_url: Option<&str>, logout_url: Option<&str>) -> Option<Self> {
        let login_url = login_url.filter(|url| !url.is_empty())?;

        let domain = login_url
            .get(..XMPP_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(XMPP_PREFIX))
            .and_then(|_| login_url.get(XMPP_PREFIX.len()..));

        Some(match domain {
            Some(domain) => AuthorityVariant::XmppDomain {
                domain: domain.to_string(),
            },
            None => AuthorityVariant::ShibbolethSso {
                login_url: login_url.to_string(),
                logout_url: logout_url.map(str::to_string),
            },
        })
    }

    #[must_use]
    pub fn kind(&self) -> AuthorityKind {
        match self {
            AuthorityVariant::ShibbolethSso { .. } => AuthorityKind::ShibbolethSso,
            AuthorityVariant::XmppDomain { .. } => AuthorityKind::XmppDomain,
        }
    }

    #[must_use]
    pub fn requires_web_surface(&self) -> bool {
        self.kind().requires_web_surface()
    }
}

/// The live authority, owned by the gateway lifecycle.
#[derive(Debug, Clone)]
pub enum AuthorityHandle {
    Shibboleth(Arc<ShibbolethAuthority>),
    XmppDomain(Arc<XmppDomainAuthority>),
}

impl AuthorityHandle {
    #[must_use]
    pub fn kind(&self) -> AuthorityKind {
        match self {
            AuthorityHandle::Shibboleth(_) => AuthorityKind::ShibbolethSso,
            AuthorityHandle::XmppDomain(_) => AuthorityKind::XmppDomain,
        }
    }

    /// Type-erased view, as published to the service registry.
    #[must_use]
    pub fn as_authority(&self) -> Arc<dyn AuthenticationAuthority> {
        match self {
            AuthorityHandle::Shibboleth(a) => Arc::clone(a) as Arc<dyn AuthenticationAuthority>,
            AuthorityHandle::XmppDomain(a) => Arc::clone(a) as Arc<dyn AuthenticationAuthority>,
        }
    }

    /// Start the authority's background activity.
    ///
    /// # Errors
    ///
    /// Propagates the authority's start failure.
    pub fn start(&self) -> Result<(), GatewayError> {
        match self {
            AuthorityHandle::Shibboleth(a) => a.start(),
            AuthorityHandle::XmppDomain(a) => a.start(),
        }
    }

    pub fn stop(&self) {
        match self {
            AuthorityHandle::Shibboleth(a) => a.stop(),
            AuthorityHandle::XmppDomain(a) => a.stop(),
        }
    }
}

impl fmt::Display for AuthorityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorityHandle::Shibboleth(a) => write!(f, "{a}"),
            AuthorityHandle::XmppDomain(a) => write!(f, "{a}"),
        }
    }
}

/// Builds the authority selected by the gateway configuration.
pub struct AuthorityFactory;

impl AuthorityFactory {
    /// Select and construct the authority, without starting it.
    ///
    /// Returns `None` when the login URL is absent or empty.
    #[must_use]
    pub fn create(config: &GatewayConfig) -> Option<(AuthorityVariant, AuthorityHandle)> {
        let variant =
            AuthorityVariant::select(config.login_url.as_deref(), config.logout_url.as_deref())?;

        info!(
            target: "auth_gateway.authority",
            login_url = config.login_url.as_deref().unwrap_or_default(),
            "Starting authentication service"
        );

        let handle = match &variant {
            AuthorityVariant::ShibbolethSso {
                login_url,
                logout_url,
            } => AuthorityHandle::Shibboleth(Arc::new(ShibbolethAuthority::new(
                login_url.clone(),
                logout_url.clone(),
                config.auth_lifetime,
                config.disable_autologin,
            ))),
            AuthorityVariant::XmppDomain { domain } => {
                AuthorityHandle::XmppDomain(Arc::new(XmppDomainAuthority::new(
                    domain.clone(),
                    config.auth_lifetime,
                    config.disable_autologin,
                )))
            }
        };

        info!(
            target: "auth_gateway.authority",
            kind = %handle.kind(),
            authority = %handle,
            "Auth authority selected"
        );

        Some((variant, handle))
    }
}
