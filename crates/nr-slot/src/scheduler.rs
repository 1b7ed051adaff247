//! Single-slot scheduler for chained spins on a virtual clock

use serde::{Deserialize, Serialize};

/// Why a spin was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledKind {
    Auto,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSpin {
    /// Virtual clock time the spin fires at (ms)
    pub due_ms: f64,
    pub kind: ScheduledKind,
}

/// Holds at most one pending spin. Scheduling replaces whatever was pending.
#[derive(Debug, Clone, Default)]
pub struct SpinScheduler {
    pending: Option<ScheduledSpin>,
}

impl SpinScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: f64, kind: ScheduledKind) {
        self.pending = Some(ScheduledSpin { due_ms, kind });
    }

    pub fn pending(&self) -> Option<ScheduledSpin> {
        self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Drop a pending spin of `kind`; returns whether one was dropped
    pub fn cancel_kind(&mut self, kind: ScheduledKind) -> bool {
        if self.pending.is_some_and(|s| s.kind == kind) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) -> Option<ScheduledSpin> {
        self.pending.take()
    }

    /// Due time of the pending spin, if any
    pub fn next_due(&self) -> Option<f64> {
        self.pending.map(|s| s.due_ms)
    }

    /// Take the pending spin if it is due at `now_ms`
    pub fn take_due(&mut self, now_ms: f64) -> Option<ScheduledSpin> {
        match self.pending {
            Some(spin) if spin.due_ms <= now_ms => self.pending.take(),
            _ => None,
        }
    }
}
