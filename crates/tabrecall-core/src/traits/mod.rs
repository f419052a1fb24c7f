// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the tabrecall service boundaries.
//!
//! All adapters extend the [`ServiceAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod backend;
pub mod capture;
pub mod store;

// Re-export all traits at the traits module level for convenience.
pub use adapter::ServiceAdapter;
pub use backend::AiBackend;
pub use capture::CaptureSource;
pub use store::EntryStore;
