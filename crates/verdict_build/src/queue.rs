//! The set of units pending recompilation in a pass.

use std::collections::HashSet;

use indexmap::IndexSet;
use verdict_common::UnitId;

/// Insertion-ordered set of pending units.
///
/// A unit is accepted at most once per pass: pushing a unit that is queued
/// or already compiled is a no-op.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: IndexSet<UnitId>,
    compiled: HashSet<UnitId>,
}

impl WorkQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `unit`. Returns `false` if it was queued or compiled before.
    pub fn push(&mut self, unit: UnitId) -> bool {
        if self.compiled.contains(&unit) {
            return false;
        }
        self.pending.insert(unit)
    }

    /// Returns `true` if `unit` is queued or was compiled in this pass.
    pub fn has_seen(&self, unit: &UnitId) -> bool {
        self.pending.contains(unit) || self.compiled.contains(unit)
    }

    /// Removes up to `max` units in insertion order and marks them
    /// compiled.
    pub fn drain_batch(&mut self, max: usize) -> Vec<UnitId> {
        let take = max.min(self.pending.len());
        let batch: Vec<UnitId> = self.pending.drain(..take).collect();
        self.compiled.extend(batch.iter().cloned());
        batch
    }

    /// Number of queued units.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of units drained so far.
    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }
}
