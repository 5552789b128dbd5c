//! Recording service registry.

use common::error::{HostError, Result};
use common::registry::{InMemoryServiceRegistry, RegistryEntry, ServiceRegistry};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Call observed by [`MockRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Publish { service: String, id: Uuid },
    Withdraw { service: String, id: Uuid },
}

/// Registry wrapping [`InMemoryServiceRegistry`] that records every call.
///
/// Publication can be made to fail with [`MockRegistry::fail_publish`].
#[derive(Debug, Default)]
pub struct MockRegistry {
    inner: InMemoryServiceRegistry,
    calls: Mutex<Vec<RegistryCall>>,
    fail_publish: AtomicBool,
}

impl MockRegistry {
    /// Create an empty registry behind an `Arc`.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent publish fail.
    pub fn fail_publish(&self) {
        self.fail_publish.store(true, Ordering::SeqCst);
    }

    /// Undo [`MockRegistry::fail_publish`].
    pub fn allow_publish(&self) {
        self.fail_publish.store(false, Ordering::SeqCst);
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn published_count(&self) -> usize {
        self.inner.len()
    }

    /// Look up a published capability by service and type.
    pub fn lookup<T: Clone + 'static>(&self, service: &str) -> Option<T> {
        self.inner.lookup(service)
    }
}

impl ServiceRegistry for MockRegistry {
    fn publish(
        &self,
        service: &str,
        capability: Box<dyn Any + Send + Sync>,
    ) -> Result<RegistryEntry> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(HostError::Registry(format!(
                "publish of {service} refused by mock"
            )));
        }
        let entry = self.inner.publish(service, capability)?;
        self.calls.lock().unwrap().push(RegistryCall::Publish {
            service: service.to_string(),
            id: entry.id(),
        });
        Ok(entry)
    }

    fn withdraw(&self, entry: RegistryEntry) -> Result<()> {
        let call = RegistryCall::Withdraw {
            service: entry.service().to_string(),
            id: entry.id(),
        };
        self.inner.withdraw(entry)?;
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}
