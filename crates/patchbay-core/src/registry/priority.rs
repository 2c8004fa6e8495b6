//! Un-keyed prioritized registry with lazy re-sorting.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use patchbay_protocols::{Registerable, RegistryError, ServiceId};
use tracing::debug;

use super::entry::{ServiceEntry, higher_priority_first};
use crate::guard::ServiceGuard;

/// Registry of prioritized services deduplicated by object identity.
///
/// Services come back in descending priority; equal priorities keep
/// registration order. The sort runs lazily: registration only marks the
/// storage unsorted and the next ordered read sorts it in place, so order
/// is never observably stale. Removal keeps the relative order of the
/// survivors and therefore leaves the flag alone.
pub struct PriorityRegistry<T: ?Sized + Registerable> {
    guard: ServiceGuard<T>,
    inner: RwLock<Entries<T>>,
}

struct Entries<T: ?Sized> {
    entries: IndexMap<ServiceId, ServiceEntry<T>>,
    sorted: bool,
}

impl<T: ?Sized> Entries<T> {
    fn ensure_sorted(&mut self) {
        if !self.sorted {
            self.entries.sort_by(|_, a, _, b| higher_priority_first(a, b));
            self.sorted = true;
        }
    }
}

impl<T: ?Sized + Registerable> PriorityRegistry<T> {
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
            inner: RwLock::new(Entries {
                entries: IndexMap::new(),
                sorted: true,
            }),
        }
    }

    /// The guard consulted on every registration.
    pub fn guard(&self) -> &ServiceGuard<T> {
        &self.guard
    }

    /// Register `service` with `priority`.
    ///
    /// # Errors
    /// Returns `RegistryError::CapabilityMismatch` if `service` fails the
    /// guard, and `RegistryError::AlreadyRegistered` if this exact instance
    /// is already present. A failed registration leaves the registry
    /// unchanged.
    pub fn register(&self, service: Arc<T>, priority: i32) -> Result<(), RegistryError> {
        self.guard.check(service.as_ref())?;
        let id = ServiceId::of(&service);
        let mut inner = self.inner.write();
        if inner.entries.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered {
                context: self.guard.context().to_string(),
                key: service.service_type().to_string(),
            });
        }
        inner.entries.insert(id, ServiceEntry { service, priority });
        inner.sorted = false;
        debug!(
            "Registered {} {} with priority {}",
            self.guard.context(),
            id,
            priority
        );
        Ok(())
    }

    /// Remove this exact instance.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` naming the types of the current
    /// members if the instance was never registered.
    pub fn unregister(&self, service: &Arc<T>) -> Result<(), RegistryError> {
        let id = ServiceId::of(service);
        let mut inner = self.inner.write();
        if inner.entries.shift_remove(&id).is_none() {
            return Err(RegistryError::NotFound {
                context: self.guard.context().to_string(),
                key: service.service_type().to_string(),
                available: inner
                    .entries
                    .values()
                    .map(|entry| entry.service.service_type().to_string())
                    .collect(),
            });
        }
        debug!("Unregistered {} {}", self.guard.context(), id);
        Ok(())
    }

    /// Whether this exact instance is registered.
    ///
    /// The value passes the same capability check as `register`.
    ///
    /// # Errors
    /// Returns `RegistryError::CapabilityMismatch` if `service` fails the
    /// guard.
    pub fn has(&self, service: &Arc<T>) -> Result<bool, RegistryError> {
        self.guard.check(service.as_ref())?;
        Ok(self
            .inner
            .read()
            .entries
            .contains_key(&ServiceId::of(service)))
    }

    /// All services in descending priority order.
    ///
    /// Sorts in place first if registrations arrived since the last
    /// ordered read. The returned snapshot is independent of later
    /// mutations.
    pub fn all(&self) -> Vec<Arc<T>> {
        let mut inner = self.inner.write();
        inner.ensure_sorted();
        inner
            .entries
            .values()
            .map(|entry| Arc::clone(&entry.service))
            .collect()
    }

    /// The highest-priority service.
    ///
    /// # Errors
    /// Returns `RegistryError::Empty` if nothing is registered.
    pub fn first(&self) -> Result<Arc<T>, RegistryError> {
        let mut inner = self.inner.write();
        inner.ensure_sorted();
        inner
            .entries
            .values()
            .next()
            .map(|entry| Arc::clone(&entry.service))
            .ok_or(RegistryError::Empty)
    }

    /// The lowest-priority service.
    ///
    /// # Errors
    /// Returns `RegistryError::Empty` if nothing is registered.
    pub fn last(&self) -> Result<Arc<T>, RegistryError> {
        let mut inner = self.inner.write();
        inner.ensure_sorted();
        inner
            .entries
            .values()
            .next_back()
            .map(|entry| Arc::clone(&entry.service))
            .ok_or(RegistryError::Empty)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the registry holds no services.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

impl<T: ?Sized + Registerable> Default for PriorityRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
