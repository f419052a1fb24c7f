// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tab summary pipeline and lifecycle coordination for tabrecall.
//!
//! Captured page text flows through "store raw text -> summarize ->
//! publish -> classify -> publish" per tab, with all shared state held in an
//! explicit keyed cache and every async completion guarded against
//! re-entrant captures and closed tabs.
//!
//! ## Architecture
//!
//! - **RecordCache**: keyed read-modify-write cache of all tab records
//! - **SummaryPipeline**: per-trigger orchestration of backend calls
//! - **Reconciler**: tab lifecycle FSM, restore, and backend-ready catch-up
//! - **BackendGate**: two-state readiness cell with awakened subscribers
//! - **EventBus**: field-scoped record patch fan-out to observers
//! - **QuerySurface**: pull queries (listing and ranked search)

pub mod cache;
pub mod controller;
pub mod events;
pub mod gate;
pub mod reconciler;
pub mod surface;

pub use cache::RecordCache;
pub use controller::{PipelineSettings, SummaryPipeline};
pub use events::{EventBus, RecordEvent, RecordPatch};
pub use gate::{BackendGate, BackendReadiness};
pub use reconciler::{Reconciler, TabState};
pub use surface::QuerySurface;
