//! Common error types for the host module-system contracts.

use thiserror::Error;

/// Errors raised by host services (configuration, service registry).
#[derive(Error, Debug)]
pub enum HostError {
    /// Registry entry is not (or no longer) published
    #[error("Registry entry not found: {0}")]
    EntryNotFound(String),

    /// Registry refused the publication
    #[error("Registry error: {0}")]
    Registry(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias using `HostError`
pub type Result<T> = std::result::Result<T, HostError>;
