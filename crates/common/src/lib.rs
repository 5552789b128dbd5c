//! Host module-system contracts shared across Conference Focus components.
//!
//! Components hosted by the focus do not reach into a process-wide context.
//! They receive the host's services as injected dependencies:
//!
//! - [`config`] - read-only configuration lookup by property name
//! - [`registry`] - publish/withdraw of discoverable capabilities
//! - [`error`] - errors raised by the host contracts

#![warn(clippy::pedantic)]

/// Module for common error types
pub mod error;

/// Module for the host configuration service contract
pub mod config;

/// Module for the host service registry contract
pub mod registry;
