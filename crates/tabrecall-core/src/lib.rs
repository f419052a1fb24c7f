// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the tabrecall daemon.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the tabrecall workspace. The AI backend,
//! capture source, and entry store are all consumed through traits defined
//! here, so the pipeline and reconciler never depend on a concrete service.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TabrecallError;
pub use types::{AdapterType, CapturedContent, HealthStatus, TabId, TabRecord};

// Re-export all adapter traits at crate root.
pub use traits::{AiBackend, CaptureSource, EntryStore, ServiceAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = TabrecallError::Config("test".into());
        let _storage = TabrecallError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _unavailable = TabrecallError::BackendUnavailable {
            message: "test".into(),
        };
        let _backend = TabrecallError::Backend {
            message: "test".into(),
            source: None,
        };
        let _timeout = TabrecallError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = TabrecallError::Internal("test".into());
    }

    #[test]
    fn adapter_type_serialization() {
        let backend = AdapterType::Backend;
        let json = serde_json::to_string(&backend).expect("should serialize");
        let parsed: AdapterType = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(backend, parsed);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every adapter trait is reachable through
        // the public API.
        fn _assert_service_adapter<T: ServiceAdapter>() {}
        fn _assert_ai_backend<T: AiBackend>() {}
        fn _assert_capture_source<T: CaptureSource>() {}
        fn _assert_entry_store<T: EntryStore>() {}
    }
}
