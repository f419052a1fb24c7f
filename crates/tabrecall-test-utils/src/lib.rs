// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for tabrecall integration tests.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests
//! without external services.
//!
//! # Components
//!
//! - [`MockBackend`] - Mock AI backend with scripted responses and failure modes
//! - [`MockCapture`] - Mock capture source with scripted per-tab content
//! - [`InMemoryStore`] - EntryStore backed by plain maps, with write-failure injection

pub mod memory_store;
pub mod mock_backend;
pub mod mock_capture;

pub use memory_store::InMemoryStore;
pub use mock_backend::{FailureMode, MockBackend};
pub use mock_capture::MockCapture;
