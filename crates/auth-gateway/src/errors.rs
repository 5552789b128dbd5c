//! Auth gateway error types.
//!
//! Startup failures surface to the hosting process as fatal errors. Shutdown
//! never fails because a resource is missing; only genuine collaborator
//! failures are reported.

use crate::server::ConnectorKind;
use common::error::HostError;
use thiserror::Error;

/// Auth gateway error type.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// `start()` called again without an intervening `stop()`.
    #[error("Auth gateway already started")]
    AlreadyStarted,

    /// Service registry refused a publish or withdraw.
    #[error("Registry error: {0}")]
    Registry(#[from] HostError),

    /// A connector could not be bound.
    #[error("Failed to bind {kind} connector on {addr}: {reason}")]
    Bind {
        kind: ConnectorKind,
        addr: String,
        reason: String,
    },

    /// The embedded server cannot serve this connector type.
    #[error("Unsupported connector: {0}")]
    UnsupportedConnector(ConnectorKind),

    /// Other HTTP server failure (invalid address, start/stop misuse).
    #[error("HTTP server error: {0}")]
    Server(String),

    /// Authentication authority failed to start or stop.
    #[error("Authority error: {0}")]
    Authority(String),
}
