//! Decision counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::decision::{LoadDecision, SkipReason, REASON_COUNT};

/// Lock-free counters shared by every decision of one gate.
#[derive(Debug, Default)]
pub struct LoadGateStats {
    evaluated: AtomicU64,
    loads: AtomicU64,
    skips: [AtomicU64; REASON_COUNT],
}

impl LoadGateStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, decision: LoadDecision) {
        self.evaluated.fetch_add(1, Ordering::Relaxed);
        match decision {
            LoadDecision::Load => {
                self.loads.fetch_add(1, Ordering::Relaxed);
            }
            LoadDecision::Skip(reason) => {
                self.skips[reason.index()].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> LoadGateStatsSnapshot {
        let mut skips = [0u64; REASON_COUNT];
        for (slot, counter) in skips.iter_mut().zip(self.skips.iter()) {
            *slot = counter.load(Ordering::Relaxed);
        }
        LoadGateStatsSnapshot {
            evaluated: self.evaluated.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            skips,
        }
    }

    pub fn reset(&self) {
        self.evaluated.store(0, Ordering::Relaxed);
        self.loads.store(0, Ordering::Relaxed);
        for counter in &self.skips {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of [`LoadGateStats`]. Counters are read one by one, so
/// a snapshot taken under load may be off by in-flight decisions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadGateStatsSnapshot {
    /// Number of per-key decisions made.
    pub evaluated: u64,
    /// Number of decisions that loaded.
    pub loads: u64,
    skips: [u64; REASON_COUNT],
}

impl LoadGateStatsSnapshot {
    pub fn skipped(&self, reason: SkipReason) -> u64 {
        self.skips[reason.index()]
    }

    pub fn total_skipped(&self) -> u64 {
        self.skips.iter().sum()
    }

    /// Fraction of decisions that loaded (0.0 to 1.0).
    pub fn load_ratio(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.loads as f64 / self.evaluated as f64
        }
    }
}
