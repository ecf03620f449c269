//! Shared sequence slot
//!
//! The listener publishes whole sequence sets; the player takes one snapshot
//! per pass. The set lives behind an `ArcSwap` so a snapshot is a single
//! atomic load and a publish never disturbs a pass already in progress.

use crate::reconstruct::SequenceSet;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Current sequence set plus its "updated" flag
pub struct SequenceSlot {
    current: ArcSwap<SequenceSet>,
    updated: AtomicBool,
}

impl SequenceSlot {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(SequenceSet::new()),
            updated: AtomicBool::new(false),
        }
    }

    /// Replace the current set and raise the updated flag
    pub fn publish(&self, set: SequenceSet) {
        self.current.store(Arc::new(set));
        // Flag goes up after the store so a reader that sees it also sees the set
        self.updated.store(true, Ordering::Release);
    }

    /// Snapshot of the current set
    pub fn current(&self) -> Arc<SequenceSet> {
        self.current.load_full()
    }

    pub fn is_updated(&self) -> bool {
        self.updated.load(Ordering::Acquire)
    }

    /// Clear the updated flag, returning whether it was set
    pub fn take_update(&self) -> bool {
        self.updated.swap(false, Ordering::AcqRel)
    }
}

impl Default for SequenceSlot {
    fn default() -> Self {
        Self::new()
    }
}
