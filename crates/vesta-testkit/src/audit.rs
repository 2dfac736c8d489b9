//! Store wrapper recording trigger suppression at each access
//!
//! Converter reads and writes must happen with triggers suppressed for the
//! operation; this wrapper notes, per access, whether they were.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use vesta_core::effects::{DocumentStoreEffects, TransactionEffects, TriggerEffects, TriggerGuard};
use vesta_core::{
    Document, DocumentKey, DocumentMetadata, OperationId, Result, TransactionContext,
    TransactionId,
};
use vesta_effects::MemoryDocumentStore;

/// Kind of store access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAccess {
    /// `get`
    Get,
    /// `put`
    Put,
    /// `remove`
    Remove,
}

/// One recorded access and whether triggers were suppressed for its operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditedAccess {
    /// What the access was
    pub access: StoreAccess,
    /// Whether a suppression guard was alive for the accessing operation
    pub suppressed: bool,
}

/// Document store that records every access
#[derive(Debug, Clone, Default)]
pub struct TriggerAuditStore {
    inner: MemoryDocumentStore,
    accesses: Arc<Mutex<Vec<AuditedAccess>>>,
}

impl TriggerAuditStore {
    /// Auditing wrapper around `inner`
    pub fn new(inner: MemoryDocumentStore) -> Self {
        Self {
            inner,
            accesses: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Accesses recorded so far, oldest first
    pub fn accesses(&self) -> Vec<AuditedAccess> {
        self.accesses.lock().clone()
    }

    /// Forget recorded accesses
    pub fn reset(&self) {
        self.accesses.lock().clear();
    }

    /// The wrapped in-memory store (accesses through it are not recorded)
    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    fn record(&self, access: StoreAccess, ctx: &TransactionContext) {
        let suppressed = self.inner.triggers_suppressed(ctx.operation);
        self.accesses.lock().push(AuditedAccess { access, suppressed });
    }
}

#[async_trait]
impl DocumentStoreEffects for TriggerAuditStore {
    async fn get(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<Option<Document>> {
        self.record(StoreAccess::Get, ctx);
        self.inner.get(key, ctx).await
    }

    async fn put(
        &self,
        key: &DocumentKey,
        body: Vec<u8>,
        metadata: DocumentMetadata,
        ctx: &TransactionContext,
    ) -> Result<()> {
        self.record(StoreAccess::Put, ctx);
        self.inner.put(key, body, metadata, ctx).await
    }

    async fn remove(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<bool> {
        self.record(StoreAccess::Remove, ctx);
        self.inner.remove(key, ctx).await
    }
}

#[async_trait]
impl TransactionEffects for TriggerAuditStore {
    async fn begin(&self) -> Result<TransactionId> {
        self.inner.begin().await
    }

    async fn commit(&self, transaction: TransactionId) -> Result<()> {
        self.inner.commit(transaction).await
    }

    async fn rollback(&self, transaction: TransactionId) -> Result<()> {
        self.inner.rollback(transaction).await
    }
}

impl TriggerEffects for TriggerAuditStore {
    fn suppress_triggers(&self, operation: OperationId) -> TriggerGuard {
        self.inner.suppress_triggers(operation)
    }

    fn triggers_suppressed(&self, operation: OperationId) -> bool {
        self.inner.triggers_suppressed(operation)
    }
}
