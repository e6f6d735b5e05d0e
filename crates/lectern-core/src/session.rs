//! Per-process session state for engine selection
//!
//! `SessionState` replaces the ambient `forceRemote`/`localDbIsReady`
//! globals with an explicit object shared by every query operation.
//! Concurrent queries may race on these flags; the race is fail-safe
//! (worst case one extra request hits the wrong engine and retries), so
//! relaxed atomics are sufficient.

use std::sync::atomic::{AtomicBool, Ordering};

/// Which engine handle answered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Local,
    Remote,
}

/// Shared selection state.
///
/// Invariant: once `force_remote` is tripped by a failure it stays set for
/// the rest of the process, except through an explicit local re-init
/// ([`Database::set_local_engine`](crate::Database::set_local_engine)).
#[derive(Debug, Default)]
pub struct SessionState {
    force_remote: AtomicBool,
    local_ready: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_remote(&self) -> bool {
        self.force_remote.load(Ordering::Relaxed)
    }

    /// Demote the session to remote mode. One-directional.
    pub fn trip_remote(&self) {
        self.force_remote.store(true, Ordering::Relaxed);
    }

    /// Clear the demotion. Only called when a local engine is re-initialized.
    pub(crate) fn clear_force_remote(&self) {
        self.force_remote.store(false, Ordering::Relaxed);
    }

    /// Whether local preparation has finished (success or not).
    pub fn local_ready(&self) -> bool {
        self.local_ready.load(Ordering::Relaxed)
    }

    pub(crate) fn set_local_ready(&self, ready: bool) {
        self.local_ready.store(ready, Ordering::Relaxed);
    }
}
