//! Batched per-node version allocation
//!
//! The oracle issues ids from an in-memory range `[next_low, reserved_high)`
//! reserved from the persistent counter. When the range is exhausted the next
//! caller reserves a fresh batch; the range lock is held across that
//! reservation, so concurrent callers wait for one refill instead of each
//! reserving their own.
//!
//! Ids left in the range when the process exits are never issued. Ids are
//! unique and strictly increasing per node, not contiguous.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use vesta_core::effects::CounterEffects;
use vesta_core::{NodeId, Result, VersionOracleConfig, VestaError};

#[derive(Debug, Default)]
struct IdRange {
    next_low: u64,
    reserved_high: u64,
}

/// Point-in-time view of the oracle's reserved range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleSnapshot {
    /// Next id to be issued
    pub next_low: u64,
    /// Exclusive end of the reserved range
    pub reserved_high: u64,
    /// Ids reserved per refill
    pub batch_size: u64,
}

impl OracleSnapshot {
    /// Ids still available before the next refill
    pub fn remaining(&self) -> u64 {
        self.reserved_high - self.next_low
    }
}

/// Per-node version generator
pub struct VersionOracle {
    node: NodeId,
    batch_size: u64,
    counter: Arc<dyn CounterEffects>,
    range: Mutex<IdRange>,
}

impl VersionOracle {
    /// Create an oracle for `node` reserving `batch_size` ids per refill
    pub fn new(node: NodeId, batch_size: u64, counter: Arc<dyn CounterEffects>) -> Result<Self> {
        if batch_size == 0 {
            return Err(VestaError::config("version oracle batch size must be at least 1"));
        }
        Ok(Self {
            node,
            batch_size,
            counter,
            range: Mutex::new(IdRange::default()),
        })
    }

    /// Create an oracle from configuration
    pub fn from_config(
        node: NodeId,
        config: &VersionOracleConfig,
        counter: Arc<dyn CounterEffects>,
    ) -> Result<Self> {
        Self::new(node, config.batch_size, counter)
    }

    /// Node this oracle allocates for
    pub fn node_id(&self) -> &NodeId {
        &self.node
    }

    /// Ids reserved per refill
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Issue the next version id
    ///
    /// Fails with the counter's error (normally `StorageUnavailable`) when a
    /// refill is needed and the counter cannot be reached. The range is left
    /// untouched in that case, so the next call retries the reservation.
    pub async fn next_id(&self) -> Result<u64> {
        let mut range = self.range.lock().await;
        if range.next_low == range.reserved_high {
            self.refill(&mut range).await?;
        }
        let id = range.next_low;
        range.next_low += 1;
        Ok(id)
    }

    /// Current range, for diagnostics
    pub async fn snapshot(&self) -> OracleSnapshot {
        let range = self.range.lock().await;
        OracleSnapshot {
            next_low: range.next_low,
            reserved_high: range.reserved_high,
            batch_size: self.batch_size,
        }
    }

    async fn refill(&self, range: &mut IdRange) -> Result<()> {
        let start = match self.counter.reserve_batch(&self.node, self.batch_size).await {
            Ok(start) => start,
            Err(err) => {
                warn!(node = %self.node, error = %err, "version batch reservation failed");
                return Err(err);
            }
        };
        if start < range.reserved_high {
            return Err(VestaError::internal(format!(
                "version counter for {} regressed: reserved {} below high water mark {}",
                self.node, start, range.reserved_high
            )));
        }
        let high = start.checked_add(self.batch_size).ok_or_else(|| {
            VestaError::internal(format!("version range overflow for {}", self.node))
        })?;
        debug!(node = %self.node, start, size = self.batch_size, "reserved version batch");
        range.next_low = start;
        range.reserved_high = high;
        Ok(())
    }
}

impl std::fmt::Debug for VersionOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionOracle")
            .field("node", &self.node)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::MemoryCounterStore;
    use async_trait::async_trait;
    use std::collections::HashSet;

    fn oracle(batch_size: u64) -> (VersionOracle, MemoryCounterStore) {
        let counter = MemoryCounterStore::new();
        let oracle =
            VersionOracle::new(NodeId::new("B"), batch_size, Arc::new(counter.clone())).unwrap();
        (oracle, counter)
    }

    #[tokio::test]
    async fn issues_strictly_increasing_ids_across_refills() {
        let (oracle, counter) = oracle(3);
        let mut ids = Vec::new();
        for _ in 0..10 {
            ids.push(oracle.next_id().await.unwrap());
        }

        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids[0], 1);
        assert_eq!(counter.reservations(), 4);
    }

    #[tokio::test]
    async fn ids_skip_past_batches_held_by_a_previous_process() {
        let counter = MemoryCounterStore::new();
        let first = VersionOracle::new(NodeId::new("B"), 100, Arc::new(counter.clone())).unwrap();
        let before = first.next_id().await.unwrap();
        drop(first);

        let second = VersionOracle::new(NodeId::new("B"), 100, Arc::new(counter)).unwrap();
        let after = second.next_id().await.unwrap();
        assert_eq!(after, before + 100);
    }

    #[tokio::test]
    async fn snapshot_tracks_remaining_ids() {
        let (oracle, _) = oracle(5);
        assert_eq!(oracle.snapshot().await.remaining(), 0);

        oracle.next_id().await.unwrap();
        let snap = oracle.snapshot().await;
        assert_eq!(snap.remaining(), 4);
        assert_eq!(snap.batch_size, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_refill() {
        let (oracle, counter) = oracle(64);
        let oracle = Arc::new(oracle);

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let oracle = Arc::clone(&oracle);
                tokio::spawn(async move { oracle.next_id().await.unwrap() })
            })
            .collect();
        let ids: HashSet<u64> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(ids.len(), 64);
        assert_eq!(counter.reservations(), 1);
    }

    struct RegressingCounter;

    #[async_trait]
    impl CounterEffects for RegressingCounter {
        async fn reserve_batch(&self, _node: &NodeId, _size: u64) -> Result<u64> {
            Ok(1)
        }
    }

    #[tokio::test]
    async fn counter_regression_is_refused() {
        let oracle = VersionOracle::new(NodeId::new("B"), 2, Arc::new(RegressingCounter)).unwrap();
        assert_eq!(oracle.next_id().await.unwrap(), 1);
        assert_eq!(oracle.next_id().await.unwrap(), 2);
        let err = oracle.next_id().await.unwrap_err();
        assert!(matches!(err, VestaError::Internal { .. }));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let err = VersionOracle::new(NodeId::new("B"), 0, Arc::new(MemoryCounterStore::new()))
            .unwrap_err();
        assert!(matches!(err, VestaError::Config { .. }));
    }
}
