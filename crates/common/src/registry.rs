//! Host service registry contract.
//!
//! Components publish capabilities under a service name so other components
//! can discover them, and withdraw them when they stop. Publishing returns a
//! [`RegistryEntry`] which the publisher owns; withdrawing consumes it, so an
//! entry cannot be withdrawn twice.
//!
//! Capabilities are stored type-erased. Consumers look them up with the
//! concrete type that was published, typically an `Arc<dyn Trait>`.

use crate::error::{HostError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Handle to a published capability.
///
/// Deliberately not `Clone`: the publisher holds the only handle.
#[derive(Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    id: Uuid,
    service: String,
}

impl RegistryEntry {
    /// Create an entry for a freshly published capability.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            service: service.into(),
        }
    }

    /// Unique id of this publication.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Service name the capability was published under.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.service, self.id)
    }
}

/// Publish/withdraw contract of the host module system.
pub trait ServiceRegistry: Send + Sync {
    /// Publish a capability under `service`.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Registry` if the registry refuses the publication.
    fn publish(
        &self,
        service: &str,
        capability: Box<dyn Any + Send + Sync>,
    ) -> Result<RegistryEntry>;

    /// Withdraw a previously published capability.
    ///
    /// # Errors
    ///
    /// Returns `HostError::EntryNotFound` if the entry is not published.
    fn withdraw(&self, entry: RegistryEntry) -> Result<()>;
}

/// Published capability slot.
struct Published {
    service: String,
    capability: Box<dyn Any + Send + Sync>,
}

/// In-process service registry.
#[derive(Default)]
pub struct InMemoryServiceRegistry {
    entries: Mutex<HashMap<Uuid, Published>>,
}

impl fmt::Debug for InMemoryServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryServiceRegistry")
            .field("published", &self.len())
            .finish()
    }
}

impl InMemoryServiceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry behind an `Arc`, ready for injection.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // Each insert/remove is a single map operation; a panicking holder
    // cannot leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Published>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up the first capability published under `service` with type `T`.
    #[must_use]
    pub fn lookup<T: Clone + 'static>(&self, service: &str) -> Option<T> {
        self.lock()
            .values()
            .filter(|p| p.service == service)
            .find_map(|p| p.capability.downcast_ref::<T>().cloned())
    }

    /// Number of currently published capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    fn publish(
        &self,
        service: &str,
        capability: Box<dyn Any + Send + Sync>,
    ) -> Result<RegistryEntry> {
        let entry = RegistryEntry::new(service);
        self.lock().insert(
            entry.id(),
            Published {
                service: service.to_string(),
                capability,
            },
        );
        tracing::debug!(target: "common.registry", entry = %entry, "Capability published");
        Ok(entry)
    }

    fn withdraw(&self, entry: RegistryEntry) -> Result<()> {
        if self.lock().remove(&entry.id()).is_none() {
            return Err(HostError::EntryNotFound(entry.to_string()));
        }
        tracing::debug!(target: "common.registry", entry = %entry, "Capability withdrawn");
        Ok(())
    }
}
