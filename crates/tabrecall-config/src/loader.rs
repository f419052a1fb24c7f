// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tabrecall.toml` > `~/.config/tabrecall/tabrecall.toml`
//! > `/etc/tabrecall/tabrecall.toml` with environment variable overrides via
//! `TABRECALL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TabrecallConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tabrecall/tabrecall.toml` (system-wide)
/// 3. `~/.config/tabrecall/tabrecall.toml` (user XDG config)
/// 4. `./tabrecall.toml` (local directory)
/// 5. `TABRECALL_*` environment variables
pub fn load_config() -> Result<TabrecallConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TabrecallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TabrecallConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TabrecallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TabrecallConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TabrecallConfig::default()))
        .merge(Toml::file("/etc/tabrecall/tabrecall.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tabrecall/tabrecall.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tabrecall.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `TABRECALL_PIPELINE_MIN_CONTENT_CHARS`
/// must map to `pipeline.min_content_chars`, not `pipeline.min.content.chars`.
fn env_provider() -> Env {
    Env::prefixed("TABRECALL_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("daemon_", "daemon.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("pipeline_", "pipeline.", 1);
        mapped.into()
    })
}
