//! # Patchbay Protocols
//!
//! Shared vocabulary for the Patchbay registry crates.
//! Contains identity and error definitions - no registries.
//!
//! ## Core Items
//!
//! - [`Registerable`] - Base trait for everything a registry can hold
//! - [`ServiceId`] - Object identity of a registered instance
//! - [`RegistryError`] - Failure cases shared by every registry

pub mod error;
pub mod service;

pub use error::RegistryError;
pub use service::{Registerable, ServiceId};
