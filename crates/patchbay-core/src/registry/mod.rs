//! Registries mapping ids, identities, and groups to services.

mod entry;
mod identity;
mod priority;
mod grouped;
mod method;

pub use identity::IdentityRegistry;
pub use priority::PriorityRegistry;
pub use grouped::GroupedRegistry;
pub use method::{MethodEntry, MethodRegistry};
