//! # Auth Gateway Test Utilities
//!
//! Mock collaborators and configuration fixtures for exercising the gateway
//! lifecycle without binding real sockets.
//!
//! ## Modules
//!
//! - `mock_registry` - Service registry that records publish/withdraw calls
//! - `mock_server` - HTTP server factory that records what the gateway
//!   installed and can be told to fail on start
//! - `fixtures` - Configuration sources for the common deployment scenarios
//! - `runtime` - Runtime-less executor for the authority start failure path
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let registry = MockRegistry::new();
//!     let servers = MockServerFactory::new();
//!
//!     let mut gateway = gateway_with(shibboleth_config(), &registry, &servers);
//!     gateway.start().await.unwrap();
//!
//!     assert_eq!(servers.started_count(), 1);
//! }
//! ```

pub mod fixtures;
pub mod mock_registry;
pub mod mock_server;
pub mod runtime;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_registry::*;
pub use mock_server::*;
pub use runtime::*;
