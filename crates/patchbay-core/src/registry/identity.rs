//! Identifier-keyed registry holding one service per id.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use patchbay_protocols::{Registerable, RegistryError};
use tracing::debug;

use crate::guard::ServiceGuard;

/// Registry mapping a string identifier to exactly one service.
///
/// [`all`](Self::all) and [`list_ids`](Self::list_ids) iterate in
/// registration order.
pub struct IdentityRegistry<T: ?Sized + Registerable> {
    guard: ServiceGuard<T>,
    services: RwLock<IndexMap<String, Arc<T>>>,
}

impl<T: ?Sized + Registerable> IdentityRegistry<T> {
    /// Create an empty registry with the default context label.
    pub fn new() -> Self {
        Self::with_guard(ServiceGuard::default())
    }

    /// Create an empty registry whose errors lead with `context`.
    pub fn with_context(context: impl Into<String>) -> Self {
        Self::with_guard(ServiceGuard::new(context))
    }

    /// Create an empty registry guarded by `guard`.
    pub fn with_guard(guard: ServiceGuard<T>) -> Self {
        Self {
            guard,
            services: RwLock::new(IndexMap::new()),
        }
    }

    /// The guard consulted on every registration.
    pub fn guard(&self) -> &ServiceGuard<T> {
        &self.guard
    }

    /// Register `service` under `id`.
    ///
    /// # Errors
    /// Returns `RegistryError::AlreadyRegistered` if `id` is taken, and
    /// `RegistryError::CapabilityMismatch` if `service` fails the guard.
    /// A failed registration leaves the registry unchanged.
    pub fn register(&self, id: &str, service: Arc<T>) -> Result<(), RegistryError> {
        let mut services = self.services.write();
        if services.contains_key(id) {
            return Err(RegistryError::AlreadyRegistered {
                context: self.guard.context().to_string(),
                key: id.to_string(),
            });
        }
        self.guard.check(service.as_ref())?;
        services.insert(id.to_string(), service);
        debug!("Registered {}: {}", self.guard.context(), id);
        Ok(())
    }

    /// Look up the service registered under `id`.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` listing the bound ids if `id` is
    /// not one of them.
    pub fn get(&self, id: &str) -> Result<Arc<T>, RegistryError> {
        let services = self.services.read();
        services
            .get(id)
            .cloned()
            .ok_or_else(|| self.missing(&services, id))
    }

    /// Remove the service registered under `id`.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` listing the bound ids if `id` is
    /// not one of them.
    pub fn unregister(&self, id: &str) -> Result<(), RegistryError> {
        let mut services = self.services.write();
        if services.shift_remove(id).is_none() {
            return Err(self.missing(&services, id));
        }
        debug!("Unregistered {}: {}", self.guard.context(), id);
        Ok(())
    }

    /// Whether a service is registered under `id`.
    pub fn has(&self, id: &str) -> bool {
        self.services.read().contains_key(id)
    }

    /// Snapshot of the full map in registration order.
    pub fn all(&self) -> IndexMap<String, Arc<T>> {
        self.services.read().clone()
    }

    /// Bound identifiers in registration order.
    pub fn list_ids(&self) -> Vec<String> {
        self.services.read().keys().cloned().collect()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    /// Whether the registry holds no services.
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    fn missing(&self, services: &IndexMap<String, Arc<T>>, id: &str) -> RegistryError {
        RegistryError::NotFound {
            context: self.guard.context().to_string(),
            key: id.to_string(),
            available: services.keys().cloned().collect(),
        }
    }
}

impl<T: ?Sized + Registerable> Default for IdentityRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
