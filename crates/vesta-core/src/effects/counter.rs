//! Persistent version counter effects

use crate::errors::Result;
use crate::identifiers::NodeId;
use async_trait::async_trait;

/// Persistent per-node counter backing version allocation
#[async_trait]
pub trait CounterEffects: Send + Sync {
    /// Advance `node`'s counter by `size` in one atomic step and return the
    /// start of the newly reserved range `[start, start + size)`.
    ///
    /// Fails with `StorageUnavailable` when the counter cannot be reached; a
    /// failed call must not advance the persisted value.
    async fn reserve_batch(&self, node: &NodeId, size: u64) -> Result<u64>;
}
