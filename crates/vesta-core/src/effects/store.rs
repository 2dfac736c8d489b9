//! Document store effects
//!
//! The store is an external collaborator. These traits are the whole surface
//! the replication layer relies on.

use crate::document::{Document, DocumentKey};
use crate::errors::Result;
use crate::identifiers::{OperationId, TransactionContext, TransactionId};
use crate::metadata::DocumentMetadata;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Key/value document access
#[async_trait]
pub trait DocumentStoreEffects: Send + Sync {
    /// Read the document at `key`, observing writes made earlier in `ctx`'s
    /// transaction
    async fn get(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<Option<Document>>;

    /// Write (create or overwrite) the document at `key`
    async fn put(
        &self,
        key: &DocumentKey,
        body: Vec<u8>,
        metadata: DocumentMetadata,
        ctx: &TransactionContext,
    ) -> Result<()>;

    /// Physically remove the document at `key`; returns whether one existed
    async fn remove(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<bool>;
}

/// Store transactions
#[async_trait]
pub trait TransactionEffects: Send + Sync {
    /// Begin a transaction
    async fn begin(&self) -> Result<TransactionId>;

    /// Commit every write made under `transaction`
    async fn commit(&self, transaction: TransactionId) -> Result<()>;

    /// Discard every write made under `transaction`
    async fn rollback(&self, transaction: TransactionId) -> Result<()>;
}

/// Scoped suppression of recursive hook invocation
///
/// While a guard for an operation is alive, store accesses made on behalf of
/// that operation must not re-enter delete hooks.
pub trait TriggerEffects: Send + Sync {
    /// Suppress triggers for `operation` until the returned guard drops
    fn suppress_triggers(&self, operation: OperationId) -> TriggerGuard;

    /// Whether a guard for `operation` is currently alive
    fn triggers_suppressed(&self, operation: OperationId) -> bool;
}

type SuppressionDepths = Arc<Mutex<HashMap<OperationId, usize>>>;

/// Per-operation suppression bookkeeping shared by store handlers
///
/// Guards nest: suppression ends when the last guard for an operation drops.
#[derive(Debug, Clone, Default)]
pub struct TriggerSuppression {
    depths: SuppressionDepths,
}

impl TriggerSuppression {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a guard for `operation`
    pub fn enter(&self, operation: OperationId) -> TriggerGuard {
        *self.depths.lock().entry(operation).or_insert(0) += 1;
        TriggerGuard {
            depths: Arc::clone(&self.depths),
            operation,
        }
    }

    /// Whether `operation` has a live guard
    pub fn is_suppressed(&self, operation: OperationId) -> bool {
        self.depths.lock().contains_key(&operation)
    }
}

/// RAII guard returned by [`TriggerEffects::suppress_triggers`]
#[derive(Debug)]
#[must_use = "triggers are only suppressed while the guard is alive"]
pub struct TriggerGuard {
    depths: SuppressionDepths,
    operation: OperationId,
}

impl TriggerGuard {
    /// Operation this guard suppresses triggers for
    pub fn operation(&self) -> OperationId {
        self.operation
    }
}

impl Drop for TriggerGuard {
    fn drop(&mut self) {
        let mut depths = self.depths.lock();
        if let Some(depth) = depths.get_mut(&self.operation) {
            *depth -= 1;
            if *depth == 0 {
                depths.remove(&self.operation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_nest_per_operation() {
        let suppression = TriggerSuppression::new();
        let op = OperationId::new();
        let other = OperationId::new();

        let outer = suppression.enter(op);
        {
            let _inner = suppression.enter(op);
            assert!(suppression.is_suppressed(op));
        }
        assert!(suppression.is_suppressed(op));
        assert!(!suppression.is_suppressed(other));

        drop(outer);
        assert!(!suppression.is_suppressed(op));
    }
}
