//! Prioritized entry storage shared by the sorting registries.

use std::cmp::Ordering;
use std::sync::Arc;

/// One registered service and its priority.
pub(crate) struct ServiceEntry<T: ?Sized> {
    pub(crate) service: Arc<T>,
    pub(crate) priority: i32,
}

impl<T: ?Sized> Clone for ServiceEntry<T> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            priority: self.priority,
        }
    }
}

/// Descending priority; stable sorts keep registration order for ties.
pub(crate) fn higher_priority_first<T: ?Sized>(
    a: &ServiceEntry<T>,
    b: &ServiceEntry<T>,
) -> Ordering {
    b.priority.cmp(&a.priority)
}
