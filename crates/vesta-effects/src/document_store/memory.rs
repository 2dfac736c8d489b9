//! In-memory transactional document store
//!
//! Autocommit writes land directly in the committed map. Writes under a
//! transaction are buffered per transaction and only become visible to other
//! readers on commit; the writing transaction reads its own buffered writes.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use vesta_core::effects::{
    DocumentStoreEffects, TransactionEffects, TriggerEffects, TriggerGuard, TriggerSuppression,
};
use vesta_core::{
    Document, DocumentKey, DocumentMetadata, OperationId, Result, TransactionContext,
    TransactionId, VestaError,
};

/// Buffered write: `Some` for a put, `None` for a remove
type PendingWrites = BTreeMap<DocumentKey, Option<Document>>;

#[derive(Debug, Default)]
struct StoreState {
    committed: BTreeMap<DocumentKey, Document>,
    transactions: HashMap<TransactionId, PendingWrites>,
}

impl StoreState {
    fn pending_mut(&mut self, transaction: TransactionId) -> Result<&mut PendingWrites> {
        self.transactions
            .get_mut(&transaction)
            .ok_or_else(|| VestaError::not_found(format!("unknown transaction {transaction}")))
    }

    fn visible(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<Option<Document>> {
        if let Some(transaction) = ctx.transaction {
            let pending = self.transactions.get(&transaction).ok_or_else(|| {
                VestaError::not_found(format!("unknown transaction {transaction}"))
            })?;
            if let Some(write) = pending.get(key) {
                return Ok(write.clone());
            }
        }
        Ok(self.committed.get(key).cloned())
    }

    fn write(
        &mut self,
        key: &DocumentKey,
        document: Option<Document>,
        ctx: &TransactionContext,
    ) -> Result<()> {
        match ctx.transaction {
            Some(transaction) => {
                self.pending_mut(transaction)?.insert(key.clone(), document);
            }
            None => match document {
                Some(document) => {
                    self.committed.insert(key.clone(), document);
                }
                None => {
                    self.committed.remove(key);
                }
            },
        }
        Ok(())
    }
}

/// In-memory document store handler
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<RwLock<StoreState>>,
    triggers: TriggerSuppression,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Every committed document, tombstones included, ordered by key
    pub async fn snapshot(&self) -> Vec<Document> {
        let state = self.state.read().await;
        state.committed.values().cloned().collect()
    }

    /// Committed documents that are not delete markers
    pub async fn live_documents(&self) -> Vec<Document> {
        let state = self.state.read().await;
        state
            .committed
            .values()
            .filter(|document| !document.is_tombstone())
            .cloned()
            .collect()
    }

    /// Number of committed keys, tombstones included
    pub async fn len(&self) -> usize {
        self.state.read().await.committed.len()
    }

    /// True when nothing has been committed
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of transactions begun but not yet committed or rolled back
    pub async fn open_transactions(&self) -> usize {
        self.state.read().await.transactions.len()
    }
}

#[async_trait]
impl DocumentStoreEffects for MemoryDocumentStore {
    async fn get(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<Option<Document>> {
        let state = self.state.read().await;
        state.visible(key, ctx)
    }

    async fn put(
        &self,
        key: &DocumentKey,
        body: Vec<u8>,
        metadata: DocumentMetadata,
        ctx: &TransactionContext,
    ) -> Result<()> {
        let document = Document::new(key.clone(), body, metadata);
        let mut state = self.state.write().await;
        state.write(key, Some(document), ctx)
    }

    async fn remove(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<bool> {
        let mut state = self.state.write().await;
        let existed = state.visible(key, ctx)?.is_some();
        state.write(key, None, ctx)?;
        Ok(existed)
    }
}

#[async_trait]
impl TransactionEffects for MemoryDocumentStore {
    async fn begin(&self) -> Result<TransactionId> {
        let transaction = TransactionId::new();
        let mut state = self.state.write().await;
        state.transactions.insert(transaction, PendingWrites::new());
        debug!(%transaction, "transaction begun");
        Ok(transaction)
    }

    async fn commit(&self, transaction: TransactionId) -> Result<()> {
        let mut state = self.state.write().await;
        let pending = state
            .transactions
            .remove(&transaction)
            .ok_or_else(|| VestaError::not_found(format!("unknown transaction {transaction}")))?;
        let writes = pending.len();
        for (key, write) in pending {
            match write {
                Some(document) => {
                    state.committed.insert(key, document);
                }
                None => {
                    state.committed.remove(&key);
                }
            }
        }
        debug!(%transaction, writes, "transaction committed");
        Ok(())
    }

    async fn rollback(&self, transaction: TransactionId) -> Result<()> {
        let mut state = self.state.write().await;
        let pending = state
            .transactions
            .remove(&transaction)
            .ok_or_else(|| VestaError::not_found(format!("unknown transaction {transaction}")))?;
        debug!(%transaction, discarded = pending.len(), "transaction rolled back");
        Ok(())
    }
}

impl TriggerEffects for MemoryDocumentStore {
    fn suppress_triggers(&self, operation: OperationId) -> TriggerGuard {
        self.triggers.enter(operation)
    }

    fn triggers_suppressed(&self, operation: OperationId) -> bool {
        self.triggers.is_suppressed(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_core::{NodeId, ReplicationMetadata};

    fn meta(version: u64) -> DocumentMetadata {
        ReplicationMetadata::revision(version, "A").into()
    }

    #[tokio::test]
    async fn autocommit_put_and_get() {
        let store = MemoryDocumentStore::new();
        let ctx = TransactionContext::new();
        let key = DocumentKey::new("users/1");

        store.put(&key, b"alice".to_vec(), meta(1), &ctx).await.unwrap();

        let doc = store.get(&key, &ctx).await.unwrap().unwrap();
        assert_eq!(doc.body, b"alice");
        assert_eq!(doc.metadata.replication.version, Some(1));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn transactional_writes_hidden_until_commit() {
        let store = MemoryDocumentStore::new();
        let key = DocumentKey::new("users/1");
        let tx = store.begin().await.unwrap();
        let inside = TransactionContext::in_transaction(tx);
        let outside = TransactionContext::new();

        store.put(&key, b"x".to_vec(), meta(1), &inside).await.unwrap();

        assert!(store.get(&key, &inside).await.unwrap().is_some());
        assert!(store.get(&key, &outside).await.unwrap().is_none());

        store.commit(tx).await.unwrap();
        assert!(store.get(&key, &outside).await.unwrap().is_some());
        assert_eq!(store.open_transactions().await, 0);
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = MemoryDocumentStore::new();
        let key = DocumentKey::new("users/1");
        let autocommit = TransactionContext::new();
        store.put(&key, b"keep".to_vec(), meta(1), &autocommit).await.unwrap();

        let tx = store.begin().await.unwrap();
        let inside = TransactionContext::in_transaction(tx);
        assert!(store.remove(&key, &inside).await.unwrap());
        assert!(store.get(&key, &inside).await.unwrap().is_none());

        store.rollback(tx).await.unwrap();
        let doc = store.get(&key, &autocommit).await.unwrap().unwrap();
        assert_eq!(doc.body, b"keep");
    }

    #[tokio::test]
    async fn unknown_transaction_is_rejected() {
        let store = MemoryDocumentStore::new();
        let ctx = TransactionContext::in_transaction(TransactionId::new());
        let err = store.get(&DocumentKey::new("k"), &ctx).await.unwrap_err();
        assert!(matches!(err, VestaError::NotFound { .. }));
        assert!(store.commit(TransactionId::new()).await.is_err());
    }

    #[tokio::test]
    async fn live_documents_skip_tombstones() {
        let store = MemoryDocumentStore::new();
        let ctx = TransactionContext::new();
        store
            .put(&DocumentKey::new("a"), b"1".to_vec(), meta(1), &ctx)
            .await
            .unwrap();
        store
            .put(
                &DocumentKey::new("b"),
                Vec::new(),
                ReplicationMetadata::tombstone(None, NodeId::new("A"), 2).into(),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(store.snapshot().await.len(), 2);
        let live = store.live_documents().await;
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].key, DocumentKey::new("a"));
    }

    #[tokio::test]
    async fn trigger_suppression_is_scoped() {
        let store = MemoryDocumentStore::new();
        let op = OperationId::new();
        {
            let _guard = store.suppress_triggers(op);
            assert!(store.triggers_suppressed(op));
        }
        assert!(!store.triggers_suppressed(op));
    }
}
