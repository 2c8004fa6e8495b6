//! # Patchbay Core
//!
//! In-memory registries for wiring services at runtime. Each registry holds
//! `Arc`ed services behind its own lock, runs an optional capability check
//! on registration, and reports failures as
//! [`RegistryError`](patchbay_protocols::RegistryError) values.
//!
//! ## Components
//!
//! - [`IdentityRegistry`] - One service per string id
//! - [`PriorityRegistry`] - Un-keyed services in descending priority order
//! - [`GroupedRegistry`] - Named groups of prioritized services with merged views
//! - [`MethodRegistry`] - Callables addressed by id and concrete type
//! - [`ServiceGuard`] - Reusable capability check shared by every registry

pub mod guard;
pub mod registry;

pub use guard::{Capability, CapabilityProbe, DEFAULT_CONTEXT, ServiceGuard};
pub use registry::{
    GroupedRegistry, IdentityRegistry, MethodEntry, MethodRegistry, PriorityRegistry,
};
