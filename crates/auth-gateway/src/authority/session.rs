//! Authentication sessions shared by both authority variants.
//!
//! Each authority owns a [`SessionStore`] and, while started, a background
//! sweeper task that drops sessions older than the configured lifetime. The
//! sweeper runs on its own tokio task and is cancelled on `stop()`.

use crate::errors::GatewayError;
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// How often the sweeper looks for expired sessions.
pub const EXPIRE_POLLING_INTERVAL: Duration = Duration::from_secs(10);

/// An authenticated user bound to a conference room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Opaque session identifier handed to the client.
    pub session_id: String,
    /// Client machine identifier supplied at login.
    pub machine_uid: String,
    /// Authenticated identity (e-mail, eppn or JID).
    pub identity: String,
    /// Room the session was created for.
    pub room: String,
    /// Creation time, used for expiry.
    pub created_at: DateTime<Utc>,
}

/// In-memory session table.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, AuthSession>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Sessions hold no invariants a panicking writer could break.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, AuthSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create and store a new session.
    pub fn create(&self, machine_uid: &str, identity: &str, room: &str) -> AuthSession {
        let session = AuthSession {
            session_id: Uuid::new_v4().to_string(),
            machine_uid: machine_uid.to_string(),
            identity: identity.to_string(),
            room: room.to_string(),
            created_at: Utc::now(),
        };

        let mut sessions = self.lock();
        sessions.insert(session.session_id.clone(), session.clone());
        metrics::set_sessions_active(sessions.len() as u64);
        session
    }

    /// Look up a session by id.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<AuthSession> {
        self.lock().get(session_id).cloned()
    }

    /// Remove every session bound to `room`. Returns how many were removed.
    pub fn remove_room(&self, room: &str) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.room != room);
        metrics::set_sessions_active(sessions.len() as u64);
        before - sessions.len()
    }

    /// Drop sessions older than `lifetime` as of `now`. Returns how many
    /// were removed.
    pub fn expire(&self, now: DateTime<Utc>, lifetime: Duration) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| {
            (now - s.created_at)
                .to_std()
                .map_or(true, |age| age < lifetime)
        });
        let removed = before - sessions.len();
        metrics::set_sessions_active(sessions.len() as u64);
        removed
    }

    /// Remove all sessions.
    pub fn clear(&self) {
        self.lock().clear();
        metrics::set_sessions_active(0);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Session state and expiry task common to every authority variant.
#[derive(Debug)]
pub struct AuthorityCore {
    sessions: Arc<SessionStore>,
    lifetime: Duration,
    disable_autologin: bool,
    sweeper: Mutex<Option<Sweeper>>,
}

#[derive(Debug)]
struct Sweeper {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl AuthorityCore {
    #[must_use]
    pub fn new(lifetime: Duration, disable_autologin: bool) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            lifetime,
            disable_autologin,
            sweeper: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    #[must_use]
    pub fn disable_autologin(&self) -> bool {
        self.disable_autologin
    }

    /// Whether the expiry sweeper is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drop the room's sessions if auto-login is disabled.
    pub fn conference_ended(&self, room: &str) {
        if !self.disable_autologin {
            return;
        }
        let removed = self.sessions.remove_room(room);
        if removed > 0 {
            info!(
                target: "auth_gateway.authority",
                room = %room,
                removed,
                "Conference ended, authentication sessions destroyed"
            );
        }
    }

    /// Spawn the expiry sweeper. Starting an already running core is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Authority` when called outside a tokio runtime.
    pub fn start(&self) -> Result<(), GatewayError> {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.is_some() {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| GatewayError::Authority(format!("No async runtime: {e}")))?;

        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let sessions = Arc::clone(&self.sessions);
        let lifetime = self.lifetime;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(EXPIRE_POLLING_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = task_token.cancelled() => {
                        debug!(target: "auth_gateway.authority", "Session sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let expired = sessions.expire(Utc::now(), lifetime);
                        if expired > 0 {
                            info!(
                                target: "auth_gateway.authority",
                                expired,
                                "Expired authentication sessions removed"
                            );
                            metrics::record_sessions_expired(expired as u64);
                        }
                    }
                }
            }
        });

        *sweeper = Some(Sweeper {
            cancel_token,
            handle,
        });
        Ok(())
    }

    /// Cancel the sweeper and drop all sessions. Safe to call when not
    /// started.
    pub fn stop(&self) {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.cancel_token.cancel();
            drop(sweeper.handle);
        }
        self.sessions.clear();
    }
}
