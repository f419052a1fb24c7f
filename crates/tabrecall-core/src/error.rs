// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the tabrecall daemon.

use thiserror::Error;

/// The primary error type used across all tabrecall adapter traits and core operations.
#[derive(Debug, Error)]
pub enum TabrecallError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The AI backend is not reachable or its model is not installed yet.
    ///
    /// Recoverable: callers keep raw text and retry once readiness flips.
    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// The AI backend accepted the request but failed to execute it.
    ///
    /// Terminal for the triggering operation; fallback values are applied.
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TabrecallError {
    /// Returns true for failures that clear once the backend becomes ready.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TabrecallError::BackendUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let err = TabrecallError::BackendUnavailable {
            message: "model not installed".into(),
        };
        assert_eq!(err.to_string(), "backend unavailable: model not installed");

        let err = TabrecallError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn only_unavailable_is_recoverable() {
        assert!(
            TabrecallError::BackendUnavailable {
                message: "x".into()
            }
            .is_recoverable()
        );
        assert!(
            !TabrecallError::Backend {
                message: "x".into(),
                source: None
            }
            .is_recoverable()
        );
        assert!(!TabrecallError::Internal("x".into()).is_recoverable());
    }
}
