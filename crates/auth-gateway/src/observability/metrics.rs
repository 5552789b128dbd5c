//! Metrics definitions for the auth gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gateway_` prefix
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `outcome`: 3 values (success, bad_request, no_identity)
//! - `state`: 6 lifecycle states

use metrics::{counter, gauge};

/// Set the number of live authentication sessions.
///
/// Metric: `gateway_auth_sessions_active`
/// Labels: none
pub fn set_sessions_active(count: u64) {
    // u64 to f64 conversion is safe for realistic session counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("gateway_auth_sessions_active").set(count as f64);
}

/// Record sessions removed by the expiry sweeper.
///
/// Metric: `gateway_auth_sessions_expired_total`
/// Labels: none
pub fn record_sessions_expired(count: u64) {
    counter!("gateway_auth_sessions_expired_total").increment(count);
}

/// Record an SSO login attempt.
///
/// Metric: `gateway_sso_logins_total`
/// Labels: `outcome`
pub fn record_login(outcome: &'static str) {
    counter!("gateway_sso_logins_total", "outcome" => outcome).increment(1);
}

/// Record a lifecycle state transition.
///
/// Metric: `gateway_lifecycle_transitions_total`
/// Labels: `state`
pub fn record_lifecycle_transition(state: &'static str) {
    counter!("gateway_lifecycle_transitions_total", "state" => state).increment(1);
}
