//! Fault-injecting handlers
//!
//! Wrap the in-memory handlers with a switch that makes them report
//! `StorageUnavailable`, to exercise the all-or-nothing delete path.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use vesta_core::effects::{
    CounterEffects, DocumentStoreEffects, TransactionEffects, TriggerEffects, TriggerGuard,
};
use vesta_core::{
    Document, DocumentKey, DocumentMetadata, NodeId, OperationId, Result, TransactionContext,
    TransactionId, VestaError,
};
use vesta_effects::{MemoryCounterStore, MemoryDocumentStore};

/// Counter store that can be taken offline
#[derive(Debug, Clone, Default)]
pub struct FlakyCounterStore {
    inner: MemoryCounterStore,
    offline: Arc<AtomicBool>,
    failures: Arc<AtomicU64>,
}

impl FlakyCounterStore {
    /// Online store wrapping `inner`
    pub fn new(inner: MemoryCounterStore) -> Self {
        Self {
            inner,
            offline: Arc::new(AtomicBool::new(false)),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Take the store offline (`true`) or bring it back (`false`)
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reservations refused while offline
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    /// The wrapped in-memory store
    pub fn inner(&self) -> &MemoryCounterStore {
        &self.inner
    }
}

#[async_trait]
impl CounterEffects for FlakyCounterStore {
    async fn reserve_batch(&self, node: &NodeId, size: u64) -> Result<u64> {
        if self.offline.load(Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(VestaError::storage_unavailable(format!(
                "counter store offline while reserving for {node}"
            )));
        }
        self.inner.reserve_batch(node, size).await
    }
}

/// Document store whose writes can be made to fail
#[derive(Debug, Clone, Default)]
pub struct FlakyDocumentStore {
    inner: MemoryDocumentStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyDocumentStore {
    /// Healthy store wrapping `inner`
    pub fn new(inner: MemoryDocumentStore) -> Self {
        Self {
            inner,
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent put and remove fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The wrapped in-memory store
    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(VestaError::storage_unavailable("document store rejected write"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStoreEffects for FlakyDocumentStore {
    async fn get(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<Option<Document>> {
        self.inner.get(key, ctx).await
    }

    async fn put(
        &self,
        key: &DocumentKey,
        body: Vec<u8>,
        metadata: DocumentMetadata,
        ctx: &TransactionContext,
    ) -> Result<()> {
        self.check_writable()?;
        self.inner.put(key, body, metadata, ctx).await
    }

    async fn remove(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<bool> {
        self.check_writable()?;
        self.inner.remove(key, ctx).await
    }
}

#[async_trait]
impl TransactionEffects for FlakyDocumentStore {
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

impl TriggerEffects for FlakyDocumentStore {
    fn suppress_triggers(&self, operation: OperationId) -> TriggerGuard {
        self.inner.suppress_triggers(operation)
    }

    fn triggers_suppressed(&self, operation: OperationId) -> bool {
        self.inner.triggers_suppressed(operation)
    }
}
