//! Error types for the Patchbay registries.

use thiserror::Error;

/// Errors raised by registry operations.
///
/// Every variant carries the owning registry's context label as its leading
/// word, so hosts wiring several registries can tell the failures apart.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An identifier or instance is already bound in the target registry.
    #[error("{context} \"{key}\" is already registered")]
    AlreadyRegistered { context: String, key: String },

    /// An instance is already a member of the named group.
    #[error("{context} \"{service}\" is already registered in group \"{group}\"")]
    AlreadyRegisteredInGroup {
        context: String,
        group: String,
        service: String,
    },

    /// An (identifier, concrete type) pair is already bound to a method.
    #[error("{context} with id \"{id}\" and callable \"{service}::{method}()\" is already registered")]
    MethodAlreadyRegistered {
        context: String,
        id: String,
        service: String,
        method: String,
    },

    /// An identifier lookup failed; `available` lists every bound key.
    #[error("{context} \"{key}\" does not exist, available: {}", fmt_available(.available))]
    NotFound {
        context: String,
        key: String,
        available: Vec<String>,
    },

    /// An instance or type lookup failed inside a named group.
    #[error("{context} \"{service}\" does not exist in group \"{group}\", available: {}", fmt_available(.available))]
    NotFoundInGroup {
        context: String,
        group: String,
        service: String,
        available: Vec<String>,
    },

    /// A value failed the registry's capability check.
    #[error("{context} needs to be of type \"{required}\", \"{actual}\" given")]
    CapabilityMismatch {
        context: String,
        required: String,
        actual: String,
    },

    /// `first` or `last` was called on a registry with no members.
    #[error("registry is empty, nothing to return")]
    Empty,
}

fn fmt_available(keys: &[String]) -> String {
    if keys.is_empty() {
        return "(none)".to_string();
    }
    keys.iter()
        .map(|key| format!("\"{key}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_registered_display() {
        let err = RegistryError::AlreadyRegistered {
            context: "service".to_string(),
            key: "payment.gateway".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "service \"payment.gateway\" is already registered"
        );
    }

    #[test]
    fn test_already_registered_in_group_display() {
        let err = RegistryError::AlreadyRegisteredInGroup {
            context: "handler".to_string(),
            group: "checkout".to_string(),
            service: "my::Handler@0x10".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "handler \"my::Handler@0x10\" is already registered in group \"checkout\""
        );
    }

    #[test]
    fn test_method_already_registered_display() {
        let err = RegistryError::MethodAlreadyRegistered {
            context: "service".to_string(),
            id: "export".to_string(),
            service: "my::CsvExporter".to_string(),
            method: "export".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "service with id \"export\" and callable \"my::CsvExporter::export()\" is already registered"
        );
    }

    #[test]
    fn test_not_found_lists_available_keys() {
        let err = RegistryError::NotFound {
            context: "formatter".to_string(),
            key: "json".to_string(),
            available: vec!["xml".to_string(), "csv".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "formatter \"json\" does not exist, available: \"xml\", \"csv\""
        );
    }

    #[test]
    fn test_not_found_with_nothing_available() {
        let err = RegistryError::NotFound {
            context: "service".to_string(),
            key: "json".to_string(),
            available: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "service \"json\" does not exist, available: (none)"
        );
    }

    #[test]
    fn test_not_found_in_group_display() {
        let err = RegistryError::NotFoundInGroup {
            context: "service".to_string(),
            group: "export".to_string(),
            service: "my::Exporter".to_string(),
            available: vec!["my::Other@0x20".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "service \"my::Exporter\" does not exist in group \"export\", available: \"my::Other@0x20\""
        );
    }

    #[test]
    fn test_capability_mismatch_display() {
        let err = RegistryError::CapabilityMismatch {
            context: "service".to_string(),
            required: "Encoder".to_string(),
            actual: "my::Decoder".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "service needs to be of type \"Encoder\", \"my::Decoder\" given"
        );
    }

    #[test]
    fn test_empty_display() {
        assert_eq!(
            RegistryError::Empty.to_string(),
            "registry is empty, nothing to return"
        );
    }

    #[test]
    fn test_debug_names_variant() {
        let err = RegistryError::Empty;
        assert!(format!("{:?}", err).contains("Empty"));
    }
}
