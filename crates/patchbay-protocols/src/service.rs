//! Service identity and the base registration trait.

use std::fmt;
use std::sync::Arc;

/// Base trait for everything a registry can hold.
///
/// Service traits take this as a supertrait so registries can name concrete
/// implementations in diagnostics. The default `service_type` body is
/// monomorphized per implementation, so calls through `dyn` trait objects
/// still report the concrete type.
pub trait Registerable: Send + Sync {
    /// Concrete type name, used in diagnostics and method-bound keys.
    fn service_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Object identity of a registered instance.
///
/// Two `Arc`s cloned from the same allocation share an id; structurally
/// equal values in distinct allocations do not. An id is unambiguous only
/// while some `Arc` keeps its allocation alive, which holds for every id a
/// registry compares against its own entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId {
    addr: usize,
    type_name: &'static str,
}

impl ServiceId {
    /// Identity of the instance behind `service`.
    pub fn of<T: ?Sized + Registerable>(service: &Arc<T>) -> Self {
        Self {
            addr: Arc::as_ptr(service) as *const () as usize,
            type_name: service.service_type(),
        }
    }

    /// Concrete type name of the identified instance.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.type_name, self.addr)
    }
}
