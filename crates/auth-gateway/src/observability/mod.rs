//! Observability for the auth gateway.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `gateway_auth_sessions_active` | Gauge | none | Live authentication sessions |
//! | `gateway_auth_sessions_expired_total` | Counter | none | Sessions dropped by the sweeper |
//! | `gateway_sso_logins_total` | Counter | `outcome` | SSO callback results |
//! | `gateway_lifecycle_transitions_total` | Counter | `state` | Gateway state changes |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
