//! Capability checking shared by every registry.

use patchbay_protocols::{Registerable, RegistryError};

/// Context label used when a registry is built without an explicit one.
pub const DEFAULT_CONTEXT: &str = "service";

/// Probe deciding whether a value satisfies a capability.
pub type CapabilityProbe<T> = fn(&T) -> bool;

/// A named runtime constraint on registered values.
///
/// The registry's type parameter is the primary constraint; a capability
/// expresses a finer, value-dependent requirement on top of it.
pub struct Capability<T: ?Sized> {
    name: &'static str,
    probe: CapabilityProbe<T>,
}

impl<T: ?Sized> Capability<T> {
    /// New capability with a diagnostic `name` and the probe enforcing it.
    pub fn new(name: &'static str, probe: CapabilityProbe<T>) -> Self {
        Self { name, probe }
    }

    /// Name reported in `CapabilityMismatch` errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `value` satisfies this capability.
    pub fn test(&self, value: &T) -> bool {
        (self.probe)(value)
    }
}

/// The registration check every registry runs before storing a value.
///
/// Carries the registry's context label, which leads every error message,
/// and an optional [`Capability`]. Built once per registry and consulted on
/// each register call.
pub struct ServiceGuard<T: ?Sized> {
    context: String,
    required: Option<Capability<T>>,
}

impl<T: ?Sized + Registerable> ServiceGuard<T> {
    /// Unconstrained guard with the given context label.
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            required: None,
        }
    }

    /// Guard that additionally requires `capability` of every value.
    pub fn with_capability(context: impl Into<String>, capability: Capability<T>) -> Self {
        Self {
            context: context.into(),
            required: Some(capability),
        }
    }

    /// Context label of the owning registry.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Name of the required capability, if one is configured.
    pub fn required(&self) -> Option<&'static str> {
        self.required.as_ref().map(|capability| capability.name())
    }

    /// Pass `value` through the capability check.
    ///
    /// # Errors
    /// Returns `RegistryError::CapabilityMismatch` when a capability is
    /// configured and `value` does not satisfy it.
    pub fn check(&self, value: &T) -> Result<(), RegistryError> {
        match &self.required {
            Some(capability) if !capability.test(value) => {
                Err(RegistryError::CapabilityMismatch {
                    context: self.context.clone(),
                    required: capability.name().to_string(),
                    actual: value.service_type().to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl<T: ?Sized + Registerable> Default for ServiceGuard<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Registerable for Plain {}

    struct Toggle {
        enabled: bool,
    }

    impl Registerable for Toggle {}

    fn enabled_only() -> ServiceGuard<Toggle> {
        ServiceGuard::with_capability(
            "toggle",
            Capability::new("Enabled", |toggle: &Toggle| toggle.enabled),
        )
    }

    #[test]
    fn test_unguarded_accepts_anything() {
        let guard: ServiceGuard<Plain> = ServiceGuard::new("widget");
        assert!(guard.check(&Plain).is_ok());
        assert_eq!(guard.context(), "widget");
        assert_eq!(guard.required(), None);
    }

    #[test]
    fn test_default_context() {
        let guard: ServiceGuard<Plain> = ServiceGuard::default();
        assert_eq!(guard.context(), DEFAULT_CONTEXT);
    }

    #[test]
    fn test_capability_accepts_matching_value() {
        let guard = enabled_only();
        assert!(guard.check(&Toggle { enabled: true }).is_ok());
        assert_eq!(guard.required(), Some("Enabled"));
    }

    #[test]
    fn test_capability_rejects_mismatch() {
        let guard = enabled_only();
        let err = guard.check(&Toggle { enabled: false }).unwrap_err();
        match err {
            RegistryError::CapabilityMismatch {
                context,
                required,
                actual,
            } => {
                assert_eq!(context, "toggle");
                assert_eq!(required, "Enabled");
                assert!(actual.ends_with("Toggle"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_probe_sees_the_value() {
        let capability = Capability::new("Enabled", |toggle: &Toggle| toggle.enabled);
        assert!(capability.test(&Toggle { enabled: true }));
        assert!(!capability.test(&Toggle { enabled: false }));
        assert_eq!(capability.name(), "Enabled");
    }
}
