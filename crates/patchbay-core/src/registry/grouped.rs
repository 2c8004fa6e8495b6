//! Group-keyed prioritized registry with merged views.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use patchbay_protocols::{Registerable, RegistryError, ServiceId};
use tracing::debug;

use super::entry::{ServiceEntry, higher_priority_first};
use crate::guard::ServiceGuard;

/// Registry of named groups, each an ordered multi-set of prioritized
/// services.
///
/// Identity-based dedup applies within one group; the same instance may be
/// a member of any number of groups. Each group sorts lazily behind its own
/// flag. Merged views ([`all`](Self::all), [`only`](Self::only)) sort a
/// fresh copy on every call; their tie-break on equal priority is fixed:
/// groups are walked in the group map's creation order, members within a
/// group in registration order.
pub struct GroupedRegistry<T: ?Sized + Registerable> {
    guard: ServiceGuard<T>,
    groups: RwLock<IndexMap<String, ServiceGroup<T>>>,
}

struct ServiceGroup<T: ?Sized> {
    entries: IndexMap<ServiceId, ServiceEntry<T>>,
    sorted: bool,
}

impl<T: ?Sized> ServiceGroup<T> {
    fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            sorted: true,
        }
    }

    fn ensure_sorted(&mut self) {
        if !self.sorted {
            self.entries.sort_by(|_, a, _, b| higher_priority_first(a, b));
            self.sorted = true;
        }
    }

    fn member_ids(&self) -> Vec<String> {
        self.entries.keys().map(ToString::to_string).collect()
    }
}

impl<T: ?Sized + Registerable> GroupedRegistry<T> {
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
            groups: RwLock::new(IndexMap::new()),
        }
    }

    /// The guard consulted on every registration.
    pub fn guard(&self) -> &ServiceGuard<T> {
        &self.guard
    }

    /// Register `service` in the group named `group_id`.
    ///
    /// The group is created on first use. A failed registration never
    /// creates one.
    ///
    /// # Errors
    /// Returns `RegistryError::CapabilityMismatch` if `service` fails the
    /// guard, and `RegistryError::AlreadyRegisteredInGroup` if this exact
    /// instance is already a member of that group.
    pub fn register(
        &self,
        group_id: &str,
        service: Arc<T>,
        priority: i32,
    ) -> Result<(), RegistryError> {
        self.guard.check(service.as_ref())?;
        let id = ServiceId::of(&service);
        let mut groups = self.groups.write();
        if let Some(group) = groups.get(group_id) {
            if group.entries.contains_key(&id) {
                return Err(RegistryError::AlreadyRegisteredInGroup {
                    context: self.guard.context().to_string(),
                    group: group_id.to_string(),
                    service: id.to_string(),
                });
            }
        }
        let group = groups
            .entry(group_id.to_string())
            .or_insert_with(ServiceGroup::new);
        group.entries.insert(id, ServiceEntry { service, priority });
        group.sorted = false;
        debug!(
            "Registered {} {} in group {} with priority {}",
            self.guard.context(),
            id,
            group_id,
            priority
        );
        Ok(())
    }

    /// Remove this exact instance from the group named `group_id`.
    ///
    /// Dropping the last member drops the group.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFoundInGroup` if the group does not exist
    /// or the instance is not a member of it.
    pub fn unregister_service(
        &self,
        group_id: &str,
        service: &Arc<T>,
    ) -> Result<(), RegistryError> {
        let id = ServiceId::of(service);
        let mut groups = self.groups.write();
        let Some(index) = groups.get_index_of(group_id) else {
            return Err(self.missing_member(group_id, service, Vec::new()));
        };
        let group = &mut groups[index];
        if group.entries.shift_remove(&id).is_none() {
            let available = group.member_ids();
            return Err(self.missing_member(group_id, service, available));
        }
        debug!(
            "Unregistered {} {} from group {}",
            self.guard.context(),
            id,
            group_id
        );
        if group.entries.is_empty() {
            groups.shift_remove(group_id);
            debug!("Removed empty group: {}", group_id);
        }
        Ok(())
    }

    /// Drop the whole group named `group_id`.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` listing the existing group ids.
    pub fn unregister(&self, group_id: &str) -> Result<(), RegistryError> {
        let mut groups = self.groups.write();
        if groups.shift_remove(group_id).is_none() {
            return Err(self.missing_group(&groups, group_id));
        }
        debug!("Unregistered {} group: {}", self.guard.context(), group_id);
        Ok(())
    }

    /// Whether a group named `group_id` exists.
    pub fn has(&self, group_id: &str) -> bool {
        self.groups.read().contains_key(group_id)
    }

    /// Whether this exact instance is a member of the named group.
    pub fn has_service(&self, group_id: &str, service: &Arc<T>) -> bool {
        self.groups
            .read()
            .get(group_id)
            .is_some_and(|group| group.entries.contains_key(&ServiceId::of(service)))
    }

    /// Members of one group in descending priority order.
    ///
    /// Sorts that group in place first if needed.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` listing the existing group ids.
    pub fn items_by_id(&self, group_id: &str) -> Result<Vec<Arc<T>>, RegistryError> {
        let mut groups = self.groups.write();
        let Some(index) = groups.get_index_of(group_id) else {
            return Err(self.missing_group(&groups, group_id));
        };
        let group = &mut groups[index];
        group.ensure_sorted();
        Ok(group
            .entries
            .values()
            .map(|entry| Arc::clone(&entry.service))
            .collect())
    }

    /// Every member of every group, sorted by descending priority.
    pub fn all(&self) -> Vec<Arc<T>> {
        let groups = self.groups.read();
        Self::merge_sorted(&groups, |_| true)
    }

    /// The members of the named groups, merged and sorted by descending
    /// priority.
    ///
    /// Groups are merged in the group map's creation order, so the result
    /// does not depend on the order or multiplicity of `group_ids`.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` naming the first id that does not
    /// exist; the registry is left untouched.
    pub fn only(&self, group_ids: &[&str]) -> Result<Vec<Arc<T>>, RegistryError> {
        let groups = self.groups.read();
        for &group_id in group_ids {
            if !groups.contains_key(group_id) {
                return Err(self.missing_group(&groups, group_id));
            }
        }
        Ok(Self::merge_sorted(&groups, |group_id| {
            group_ids.contains(&group_id)
        }))
    }

    /// The highest-priority member of the named group.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` listing the existing group ids.
    pub fn first_by_id(&self, group_id: &str) -> Result<Arc<T>, RegistryError> {
        let mut groups = self.groups.write();
        let Some(index) = groups.get_index_of(group_id) else {
            return Err(self.missing_group(&groups, group_id));
        };
        let group = &mut groups[index];
        group.ensure_sorted();
        group
            .entries
            .values()
            .next()
            .map(|entry| Arc::clone(&entry.service))
            .ok_or(RegistryError::Empty)
    }

    /// The lowest-priority member of the named group.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` listing the existing group ids.
    pub fn last_by_id(&self, group_id: &str) -> Result<Arc<T>, RegistryError> {
        let mut groups = self.groups.write();
        let Some(index) = groups.get_index_of(group_id) else {
            return Err(self.missing_group(&groups, group_id));
        };
        let group = &mut groups[index];
        group.ensure_sorted();
        group
            .entries
            .values()
            .next_back()
            .map(|entry| Arc::clone(&entry.service))
            .ok_or(RegistryError::Empty)
    }

    /// The highest-priority member of every group, keyed by group id.
    pub fn all_first(&self) -> Vec<(String, Arc<T>)> {
        let mut groups = self.groups.write();
        groups
            .iter_mut()
            .filter_map(|(group_id, group)| {
                group.ensure_sorted();
                let entry = group.entries.values().next()?;
                Some((group_id.clone(), Arc::clone(&entry.service)))
            })
            .collect()
    }

    /// The lowest-priority member of every group, keyed by group id.
    pub fn all_last(&self) -> Vec<(String, Arc<T>)> {
        let mut groups = self.groups.write();
        groups
            .iter_mut()
            .filter_map(|(group_id, group)| {
                group.ensure_sorted();
                let entry = group.entries.values().next_back()?;
                Some((group_id.clone(), Arc::clone(&entry.service)))
            })
            .collect()
    }

    /// Group ids in creation order.
    pub fn available_ids(&self) -> Vec<String> {
        self.groups.read().keys().cloned().collect()
    }

    /// Total number of members across all groups.
    pub fn len(&self) -> usize {
        self.groups
            .read()
            .values()
            .map(|group| group.entries.len())
            .sum()
    }

    /// Whether no group exists.
    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }

    fn merge_sorted<F>(groups: &IndexMap<String, ServiceGroup<T>>, mut include: F) -> Vec<Arc<T>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut merged: Vec<ServiceEntry<T>> = Vec::new();
        for (group_id, group) in groups {
            if include(group_id) {
                merged.extend(group.entries.values().cloned());
            }
        }
        merged.sort_by(higher_priority_first);
        merged.into_iter().map(|entry| entry.service).collect()
    }

    fn missing_group(
        &self,
        groups: &IndexMap<String, ServiceGroup<T>>,
        group_id: &str,
    ) -> RegistryError {
        RegistryError::NotFound {
            context: self.guard.context().to_string(),
            key: group_id.to_string(),
            available: groups.keys().cloned().collect(),
        }
    }

    fn missing_member(
        &self,
        group_id: &str,
        service: &Arc<T>,
        available: Vec<String>,
    ) -> RegistryError {
        RegistryError::NotFoundInGroup {
            context: self.guard.context().to_string(),
            group: group_id.to_string(),
            service: service.service_type().to_string(),
            available,
        }
    }
}

impl<T: ?Sized + Registerable> Default for GroupedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "grouped_tests.rs"]
mod tests;
