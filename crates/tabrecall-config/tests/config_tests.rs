// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the tabrecall configuration system.

use tabrecall_config::diagnostic::suggest_key;
use tabrecall_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[daemon]
log_level = "debug"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[backend]
base_url = "http://127.0.0.1:11434"
model = "qwen2.5:3b"
auto_pull = true
request_timeout_secs = 15
max_concurrent_requests = 2

[pipeline]
min_content_chars = 50
max_input_chars = 2000
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.daemon.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.backend.model, "qwen2.5:3b");
    assert!(config.backend.auto_pull);
    assert_eq!(config.backend.request_timeout_secs, 15);
    assert_eq!(config.backend.max_concurrent_requests, 2);
    assert_eq!(config.pipeline.min_content_chars, 50);
    assert_eq!(config.pipeline.max_input_chars, 2000);
}

/// Unknown field in [backend] section produces an UnknownField error.
#[test]
fn unknown_field_in_backend_produces_error() {
    let toml = r#"
[backend]
modle = "qwen2.5:3b"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    // Figment wraps serde's deny_unknown_fields error
    assert!(
        err_str.contains("unknown field") || err_str.contains("modle"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.daemon.log_level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.backend.base_url, "http://127.0.0.1:11434");
    assert_eq!(config.backend.max_concurrent_requests, 1);
    assert_eq!(config.pipeline.min_content_chars, 100);
}

/// Validation catches semantic errors after a clean parse.
#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[pipeline]
min_content_chars = 4000
max_input_chars = 4000
"#;

    let errors = load_and_validate_str(toml).expect_err("cap == threshold should be rejected");
    assert!(
        errors
            .iter()
            .any(|e| e.to_string().contains("max_input_chars"))
    );
}

/// Typo suggestions surface for misspelled keys.
#[test]
fn typo_suggestion_for_misspelled_key() {
    let valid = &["base_url", "model", "auto_pull", "request_timeout_secs"];
    assert_eq!(suggest_key("auto_pul", valid), Some("auto_pull".to_string()));
}

/// Partial sections merge with defaults for the remaining keys.
#[test]
fn partial_section_merges_with_defaults() {
    let toml = r#"
[backend]
model = "phi3:mini"
"#;

    let config = load_config_from_str(toml).expect("partial section should parse");
    assert_eq!(config.backend.model, "phi3:mini");
    // Untouched keys keep their defaults.
    assert_eq!(config.backend.base_url, "http://127.0.0.1:11434");
    assert_eq!(config.backend.request_timeout_secs, 30);
}
