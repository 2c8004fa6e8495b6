//! Registry binding `(identifier, concrete type)` pairs to callables.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use patchbay_protocols::{Registerable, RegistryError};
use tracing::debug;

use crate::guard::ServiceGuard;

/// A registered service together with the name of the method bound to it.
pub struct MethodEntry<T: ?Sized> {
    /// The registered instance.
    pub service: Arc<T>,
    /// Name of the method to invoke on it.
    pub method: String,
}

impl<T: ?Sized> Clone for MethodEntry<T> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            method: self.method.clone(),
        }
    }
}

impl<T: ?Sized + Registerable> fmt::Debug for MethodEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("service", &self.service.service_type())
            .field("method", &self.method)
            .finish()
    }
}

/// Registry addressing callables by an identifier and a concrete type name.
///
/// Each identifier owns a bucket of callables, at most one per concrete
/// type, so two instances of the same type cannot both register under one
/// identifier. Removing the last callable of a bucket removes the
/// identifier as well.
pub struct MethodRegistry<T: ?Sized + Registerable> {
    guard: ServiceGuard<T>,
    services: RwLock<IndexMap<String, IndexMap<String, MethodEntry<T>>>>,
}

impl<T: ?Sized + Registerable> MethodRegistry<T> {
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

    /// Bind `service`'s method named `method` under `id`.
    ///
    /// # Errors
    /// Returns `RegistryError::CapabilityMismatch` if `service` fails the
    /// guard, and `RegistryError::MethodAlreadyRegistered` if `id` already
    /// binds a callable of the same concrete type.
    pub fn register(&self, id: &str, service: Arc<T>, method: &str) -> Result<(), RegistryError> {
        self.guard.check(service.as_ref())?;
        let type_name = service.service_type();
        let mut services = self.services.write();
        if let Some(bucket) = services.get(id) {
            if bucket.contains_key(type_name) {
                return Err(RegistryError::MethodAlreadyRegistered {
                    context: self.guard.context().to_string(),
                    id: id.to_string(),
                    service: type_name.to_string(),
                    method: method.to_string(),
                });
            }
        }
        services.entry(id.to_string()).or_default().insert(
            type_name.to_string(),
            MethodEntry {
                service,
                method: method.to_string(),
            },
        );
        debug!(
            "Registered {} {}::{}() under id {}",
            self.guard.context(),
            type_name,
            method,
            id
        );
        Ok(())
    }

    /// The callable bound under `id` for the concrete type `type_name`.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFoundInGroup` listing every registered
    /// callable.
    pub fn get(&self, id: &str, type_name: &str) -> Result<MethodEntry<T>, RegistryError> {
        let services = self.services.read();
        services
            .get(id)
            .and_then(|bucket| bucket.get(type_name))
            .cloned()
            .ok_or_else(|| self.missing_callable(&services, id, type_name))
    }

    /// Every callable bound under `id`, in registration order.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` listing the known identifiers.
    pub fn get_all_by_id(&self, id: &str) -> Result<Vec<MethodEntry<T>>, RegistryError> {
        let services = self.services.read();
        let Some(bucket) = services.get(id) else {
            return Err(self.missing_identifier(&services, id));
        };
        Ok(bucket.values().cloned().collect())
    }

    /// Whether `id` binds a callable of the concrete type `type_name`.
    pub fn has(&self, id: &str, type_name: &str) -> bool {
        self.services
            .read()
            .get(id)
            .is_some_and(|bucket| bucket.contains_key(type_name))
    }

    /// Whether any callable is bound under `id`.
    pub fn has_identifier(&self, id: &str) -> bool {
        self.services.read().contains_key(id)
    }

    /// Remove the callable bound under `id` for the concrete type
    /// `type_name`.
    ///
    /// Removing the last callable of a bucket removes the identifier.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFoundInGroup` listing every registered
    /// callable.
    pub fn unregister(&self, id: &str, type_name: &str) -> Result<(), RegistryError> {
        let mut services = self.services.write();
        let Some(index) = services.get_index_of(id) else {
            return Err(self.missing_callable(&services, id, type_name));
        };
        let Some(entry) = services[index].shift_remove(type_name) else {
            return Err(self.missing_callable(&services, id, type_name));
        };
        debug!(
            "Unregistered {} {}::{}() under id {}",
            self.guard.context(),
            type_name,
            entry.method,
            id
        );
        if services[index].is_empty() {
            services.shift_remove(id);
            debug!("Removed empty id: {}", id);
        }
        Ok(())
    }

    /// Remove every callable bound under `id`.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` listing the known identifiers.
    pub fn unregister_all_by_id(&self, id: &str) -> Result<(), RegistryError> {
        let mut services = self.services.write();
        if services.shift_remove(id).is_none() {
            return Err(self.missing_identifier(&services, id));
        }
        debug!(
            "Unregistered all {} callables under id {}",
            self.guard.context(),
            id
        );
        Ok(())
    }

    /// Known identifiers in registration order.
    pub fn identifiers(&self) -> Vec<String> {
        self.services.read().keys().cloned().collect()
    }

    /// Snapshot of every bucket, keyed by identifier and concrete type.
    pub fn all(&self) -> IndexMap<String, IndexMap<String, MethodEntry<T>>> {
        self.services.read().clone()
    }

    /// Total number of registered callables.
    pub fn len(&self) -> usize {
        self.services
            .read()
            .values()
            .map(|bucket| bucket.len())
            .sum()
    }

    /// Whether no callable is registered.
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    fn missing_callable(
        &self,
        services: &IndexMap<String, IndexMap<String, MethodEntry<T>>>,
        id: &str,
        type_name: &str,
    ) -> RegistryError {
        RegistryError::NotFoundInGroup {
            context: self.guard.context().to_string(),
            group: id.to_string(),
            service: type_name.to_string(),
            available: Self::format_callables(services),
        }
    }

    fn missing_identifier(
        &self,
        services: &IndexMap<String, IndexMap<String, MethodEntry<T>>>,
        id: &str,
    ) -> RegistryError {
        RegistryError::NotFound {
            context: self.guard.context().to_string(),
            key: id.to_string(),
            available: services.keys().cloned().collect(),
        }
    }

    fn format_callables(
        services: &IndexMap<String, IndexMap<String, MethodEntry<T>>>,
    ) -> Vec<String> {
        services
            .iter()
            .flat_map(|(id, bucket)| {
                bucket
                    .iter()
                    .map(move |(type_name, entry)| format!("[{id}] {type_name}::{}()", entry.method))
            })
            .collect()
    }
}

impl<T: ?Sized + Registerable> Default for MethodRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "method_tests.rs"]
mod tests;
