// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend readiness gate: a single two-state cell with an explicit
//! transition and awakened subscribers.
//!
//! The local model may still be downloading when the daemon starts. The gate
//! starts `NotReady`; exactly one explicit transition flips it to `Ready`
//! (startup probe success or a companion `backend_ready` event). Waiters are
//! woken through a watch channel; nothing polls.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Readiness of the AI backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendReadiness {
    /// Model not installed or still downloading; AI calls are deferred.
    NotReady,
    /// Model available; pipeline runs end to end.
    Ready,
}

/// Shared readiness cell. Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct BackendGate {
    tx: Arc<watch::Sender<BackendReadiness>>,
}

impl BackendGate {
    /// Creates a gate in the `NotReady` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BackendReadiness::NotReady);
        Self { tx: Arc::new(tx) }
    }

    /// Creates a gate already `Ready` (tests, pre-verified backends).
    pub fn ready_now() -> Self {
        let gate = Self::new();
        gate.mark_ready();
        gate
    }

    /// The one transition: `NotReady` -> `Ready`. Idempotent; the gate never
    /// goes back.
    pub fn mark_ready(&self) {
        let transitioned = self.tx.send_if_modified(|state| {
            if *state == BackendReadiness::NotReady {
                *state = BackendReadiness::Ready;
                true
            } else {
                false
            }
        });
        if transitioned {
            info!("AI backend marked ready");
        }
    }

    /// Current readiness without waiting.
    pub fn is_ready(&self) -> bool {
        *self.tx.borrow() == BackendReadiness::Ready
    }

    /// Resolves once the gate is `Ready`; immediately if it already is.
    pub async fn ready(&self) {
        let mut rx = self.tx.subscribe();
        // wait_for also checks the current value before suspending.
        let _ = rx.wait_for(|state| *state == BackendReadiness::Ready).await;
    }

    /// Subscription for callers that want the raw state stream.
    pub fn subscribe(&self) -> watch::Receiver<BackendReadiness> {
        self.tx.subscribe()
    }
}

impl Default for BackendGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_not_ready() {
        let gate = BackendGate::new();
        assert!(!gate.is_ready());
    }

    #[tokio::test]
    async fn mark_ready_is_one_way_and_idempotent() {
        let gate = BackendGate::new();
        gate.mark_ready();
        assert!(gate.is_ready());
        gate.mark_ready();
        assert!(gate.is_ready());
    }

    #[tokio::test]
    async fn ready_resolves_immediately_when_already_ready() {
        let gate = BackendGate::ready_now();
        gate.ready().await;
    }

    #[tokio::test]
    async fn waiters_are_woken_on_transition() {
        let gate = BackendGate::new();
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.ready().await;
                true
            })
        };

        // Give the waiter a chance to suspend, then flip the gate.
        tokio::task::yield_now().await;
        gate.mark_ready();

        let woke = tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(woke);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let gate = BackendGate::new();
        let clone = gate.clone();
        gate.mark_ready();
        assert!(clone.is_ready());
    }
}
