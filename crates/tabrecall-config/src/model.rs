// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the tabrecall daemon.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level tabrecall configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TabrecallConfig {
    /// Daemon identity and logging settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Local AI backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Summary pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Daemon identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tabrecall").join("tabrecall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tabrecall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Local AI backend (Ollama) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the local Ollama server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for summarization, classification, and ranking.
    #[serde(default = "default_model")]
    pub model: String,

    /// Pull the model on startup when it is not installed yet.
    #[serde(default = "default_auto_pull")]
    pub auto_pull: bool,

    /// Deadline for a single backend request, in seconds. Expiry is treated
    /// as a backend failure, never retried automatically.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum backend requests in flight. Local models typically support
    /// one session, so requests beyond this are queued, not parallelized.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            auto_pull: default_auto_pull(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_auto_pull() -> bool {
    false
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    1
}

/// Summary pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Minimum trimmed page-text length before the backend is consulted.
    /// Shorter pages get the insufficient-content sentinel instead.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,

    /// Hard cap on the text handed to the backend per request.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_min_content_chars() -> usize {
    100
}

fn default_max_input_chars() -> usize {
    4000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_complete() {
        let config = TabrecallConfig::default();
        assert_eq!(config.daemon.log_level, "info");
        assert!(config.storage.wal_mode);
        assert!(config.storage.database_path.ends_with("tabrecall.db"));
        assert_eq!(config.backend.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.backend.max_concurrent_requests, 1);
        assert!(!config.backend.auto_pull);
        assert_eq!(config.pipeline.min_content_chars, 100);
        assert_eq!(config.pipeline.max_input_chars, 4000);
    }

    #[test]
    fn cap_exceeds_threshold_by_default() {
        let config = PipelineConfig::default();
        assert!(config.max_input_chars > config.min_content_chars);
    }
}
