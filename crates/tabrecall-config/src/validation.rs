// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL shapes, non-empty paths, and threshold ordering.

use crate::diagnostic::ConfigError;
use crate::model::TabrecallConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TabrecallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let base_url = config.backend.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "backend.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("backend.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.backend.model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "backend.model must not be empty".to_string(),
        });
    }

    if config.backend.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "backend.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.backend.max_concurrent_requests == 0 {
        errors.push(ConfigError::Validation {
            message: "backend.max_concurrent_requests must be at least 1".to_string(),
        });
    }

    if config.pipeline.min_content_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.min_content_chars must be at least 1".to_string(),
        });
    }

    if config.pipeline.max_input_chars <= config.pipeline.min_content_chars {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.max_input_chars ({}) must exceed pipeline.min_content_chars ({})",
                config.pipeline.max_input_chars, config.pipeline.min_content_chars
            ),
        });
    }

    let level = config.daemon.log_level.as_str();
    if !matches!(level, "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ConfigError::Validation {
            message: format!(
                "daemon.log_level `{level}` is not one of trace, debug, info, warn, error"
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
