//! Dispatch statistics
//!
//! Counters are plain atomics so interrupt-context enqueues can update
//! them too. Snapshots are read-only copies for monitoring.

use portable_atomic::{AtomicU32, AtomicU8, Ordering};

/// Counters for one priority level
pub(crate) struct LevelCounters {
    published: AtomicU32,
    overflowed: AtomicU32,
    dispatched: AtomicU32,
    high_water: AtomicU8,
}

impl LevelCounters {
    pub(crate) const fn new() -> Self {
        Self {
            published: AtomicU32::new(0),
            overflowed: AtomicU32::new(0),
            dispatched: AtomicU32::new(0),
            high_water: AtomicU8::new(0),
        }
    }

    pub(crate) fn record_publish(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overflow(&self) {
        self.overflowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a delivery; `remaining` is the queue occupancy after dequeue
    pub(crate) fn record_dispatch(&self, remaining: usize) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let remaining = remaining.min(u8::MAX as usize) as u8;
        self.high_water.fetch_max(remaining, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, free_slots: usize) -> LevelStats {
        LevelStats {
            published: self.published.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            high_water: self.high_water.load(Ordering::Relaxed),
            free_slots: free_slots.min(u8::MAX as usize) as u8,
        }
    }

    pub(crate) fn reset(&self) {
        self.published.store(0, Ordering::Relaxed);
        self.overflowed.store(0, Ordering::Relaxed);
        self.dispatched.store(0, Ordering::Relaxed);
        self.high_water.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of one priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelStats {
    /// Enqueue attempts
    pub published: u32,
    /// Enqueues rejected because the queue was full
    pub overflowed: u32,
    /// Records delivered by the worker
    pub dispatched: u32,
    /// Most records left queued right after a delivery
    pub high_water: u8,
    /// Free queue slots when the snapshot was taken
    pub free_slots: u8,
}

/// Snapshot of both priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatchStats {
    pub normal: LevelStats,
    pub high: LevelStats,
}

impl DispatchStats {
    /// Overflows across both levels
    pub fn total_overflows(&self) -> u32 {
        self.normal.overflowed.saturating_add(self.high.overflowed)
    }
}
