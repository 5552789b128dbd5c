//! Conference Focus Authentication Gateway
//!
//! Optional authentication layer of the conference focus. When a login URL
//! is configured, the gateway selects an authentication authority, publishes
//! it to the host service registry so the conference machinery can discover
//! it, and runs an embedded HTTP server for web-based SSO callbacks and
//! health checks.
//!
//! # Modules
//!
//! - [`config`] - Property resolution from the host configuration service
//! - [`authority`] - Authority variants, selection and session tracking
//! - [`handlers`] - HTTP handler chain (SSO callback, health checks)
//! - [`server`] - Embedded HTTP server contract and its axum implementation
//! - [`lifecycle`] - Startup and shutdown orchestration
//! - [`observability`] - Health endpoints and metrics
//! - [`errors`] - Error types

#![warn(clippy::pedantic)]

pub mod authority;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod lifecycle;
pub mod observability;
pub mod server;

pub use lifecycle::{AuthGateway, LifecycleState, AUTHORITY_SERVICE};
