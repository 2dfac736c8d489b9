//! Per-operation staging between the two delete phases
//!
//! `pre_delete` stages the history the tombstone must carry; `post_delete`
//! takes it back out. Entries are keyed by [`OperationId`], never by the
//! executing thread or task, so pooled executors cannot leak one operation's
//! history into another.
//!
//! # Blocking Lock Usage
//!
//! Uses `parking_lot::Mutex` because the lock is never held across `.await`
//! and every critical section is one map operation.

use parking_lot::Mutex;
use std::collections::HashMap;
use vesta_core::{HistoryEntry, OperationId};

/// Staged history for in-flight deletes
#[derive(Debug, Default)]
pub struct StagingContext {
    entries: Mutex<HashMap<OperationId, Vec<HistoryEntry>>>,
}

impl StagingContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `history` for `operation`, replacing anything staged before
    pub fn put(&self, operation: OperationId, history: Vec<HistoryEntry>) {
        self.entries.lock().insert(operation, history);
    }

    /// Remove and return what `operation` staged
    pub fn take_and_clear(&self, operation: OperationId) -> Option<Vec<HistoryEntry>> {
        self.entries.lock().remove(&operation)
    }

    /// Drop whatever `operation` staged; returns whether anything was there
    pub fn clear(&self, operation: OperationId) -> bool {
        self.entries.lock().remove(&operation).is_some()
    }

    /// Number of operations with staged history
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is staged
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_entry() {
        let staging = StagingContext::new();
        let op = OperationId::new();
        staging.put(op, vec![HistoryEntry::new(5, "A")]);

        assert_eq!(staging.take_and_clear(op), Some(vec![HistoryEntry::new(5, "A")]));
        assert_eq!(staging.take_and_clear(op), None);
        assert!(staging.is_empty());
    }

    #[test]
    fn operations_are_isolated() {
        let staging = StagingContext::new();
        let first = OperationId::new();
        let second = OperationId::new();
        staging.put(first, vec![HistoryEntry::new(1, "A")]);

        assert_eq!(staging.take_and_clear(second), None);
        assert_eq!(staging.len(), 1);
    }

    #[test]
    fn clear_reports_stale_entry() {
        let staging = StagingContext::new();
        let op = OperationId::new();
        assert!(!staging.clear(op));
        staging.put(op, Vec::new());
        assert!(staging.clear(op));
        assert!(staging.is_empty());
    }
}
