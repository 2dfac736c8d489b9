//! In-memory counter store
//!
//! Stands in for the persistent per-node counter. Seed it with
//! [`MemoryCounterStore::with_counter`] to model a counter that survived a
//! restart.
//!
//! # Blocking Lock Usage
//!
//! Uses `parking_lot::Mutex` because the lock is never held across `.await`
//! and every critical section is a single map update.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vesta_core::effects::CounterEffects;
use vesta_core::{NodeId, Result, VestaError};

/// First value handed out for a node that has never reserved
pub const INITIAL_COUNTER: u64 = 1;

/// In-memory per-node counter handler
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    counters: Arc<Mutex<HashMap<NodeId, u64>>>,
    reservations: Arc<AtomicU64>,
}

impl MemoryCounterStore {
    /// Create a store where every node starts at [`INITIAL_COUNTER`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seed for `node`'s counter
    pub fn with_counter(self, node: impl Into<NodeId>, value: u64) -> Self {
        self.counters.lock().insert(node.into(), value);
        self
    }

    /// Next value `node` would reserve from
    pub fn current(&self, node: &NodeId) -> u64 {
        self.counters
            .lock()
            .get(node)
            .copied()
            .unwrap_or(INITIAL_COUNTER)
    }

    /// Number of successful reservations across all nodes
    pub fn reservations(&self) -> u64 {
        self.reservations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterEffects for MemoryCounterStore {
    async fn reserve_batch(&self, node: &NodeId, size: u64) -> Result<u64> {
        if size == 0 {
            return Err(VestaError::invalid("batch size must be at least 1"));
        }
        let mut counters = self.counters.lock();
        let counter = counters.entry(node.clone()).or_insert(INITIAL_COUNTER);
        let start = *counter;
        *counter = start
            .checked_add(size)
            .ok_or_else(|| VestaError::internal(format!("version counter exhausted for {node}")))?;
        self.reservations.fetch_add(1, Ordering::SeqCst);
        Ok(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reservations_are_disjoint_and_per_node() {
        let store = MemoryCounterStore::new();
        let a = NodeId::new("A");
        let b = NodeId::new("B");

        assert_eq!(store.reserve_batch(&a, 10).await.unwrap(), 1);
        assert_eq!(store.reserve_batch(&a, 10).await.unwrap(), 11);
        assert_eq!(store.reserve_batch(&b, 5).await.unwrap(), 1);
        assert_eq!(store.current(&a), 21);
        assert_eq!(store.reservations(), 3);
    }

    #[tokio::test]
    async fn seeded_counter_resumes() {
        let store = MemoryCounterStore::new().with_counter("A", 500);
        assert_eq!(store.reserve_batch(&NodeId::new("A"), 4).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn exhausted_counter_fails_without_advancing() {
        let store = MemoryCounterStore::new().with_counter("A", u64::MAX - 1);
        let node = NodeId::new("A");
        assert!(store.reserve_batch(&node, 4).await.is_err());
        assert_eq!(store.current(&node), u64::MAX - 1);
        assert_eq!(store.reservations(), 0);
    }

    #[tokio::test]
    async fn zero_size_rejected() {
        let store = MemoryCounterStore::new();
        assert!(store.reserve_batch(&NodeId::new("A"), 0).await.is_err());
    }
}
