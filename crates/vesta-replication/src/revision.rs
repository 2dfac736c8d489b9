//! Versioned writes of live documents
//!
//! Stamps a put with a fresh local version, the local node as `source`, and
//! the superseded revision appended to `history`, the same way a tombstone
//! supersedes the document it replaces.

use std::sync::Arc;
use tracing::debug;
use vesta_core::effects::DatabaseEffects;
use vesta_core::{
    Document, DocumentKey, DocumentMetadata, ReplicationMetadata, Result, TransactionContext,
};
use vesta_effects::VersionOracle;

/// Writes live revisions carrying replication metadata
pub struct RevisionWriter {
    store: Arc<dyn DatabaseEffects>,
    oracle: Arc<VersionOracle>,
}

impl RevisionWriter {
    /// Writer over `store` versioned by `oracle`
    pub fn new(store: Arc<dyn DatabaseEffects>, oracle: Arc<VersionOracle>) -> Self {
        Self { store, oracle }
    }

    /// Write `body` at `key` as a new local revision
    ///
    /// Replication fields already present in `metadata` are replaced;
    /// unrelated fields are kept.
    pub async fn put(
        &self,
        key: &DocumentKey,
        body: Vec<u8>,
        metadata: DocumentMetadata,
        ctx: &TransactionContext,
    ) -> Result<Document> {
        let _guard = self.store.suppress_triggers(ctx.operation);
        let history = self
            .store
            .get(key, ctx)
            .await?
            .map(|prior| prior.metadata.replication.superseded_history());
        let version = self.oracle.next_id().await?;

        let mut replication = ReplicationMetadata::revision(version, self.oracle.node_id().clone());
        replication.history = history;
        let metadata = DocumentMetadata {
            replication,
            extra: metadata.extra,
        };

        self.store
            .put(key, body.clone(), metadata.clone(), ctx)
            .await?;
        debug!(%key, operation = %ctx.operation, version, "wrote revision");
        Ok(Document::new(key.clone(), body, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vesta_core::{HistoryEntry, NodeId};
    use vesta_effects::{MemoryCounterStore, MemoryDocumentStore};

    fn writer() -> RevisionWriter {
        let oracle = VersionOracle::new(NodeId::new("A"), 4, Arc::new(MemoryCounterStore::new()))
            .unwrap();
        RevisionWriter::new(Arc::new(MemoryDocumentStore::new()), Arc::new(oracle))
    }

    #[tokio::test]
    async fn first_write_has_no_history() {
        let writer = writer();
        let doc = writer
            .put(
                &DocumentKey::new("k"),
                b"v1".to_vec(),
                DocumentMetadata::default(),
                &TransactionContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(doc.metadata.replication, ReplicationMetadata::revision(1, "A"));
    }

    #[tokio::test]
    async fn overwrite_appends_prior_revision_and_keeps_extra_fields() {
        let writer = writer();
        let key = DocumentKey::new("k");
        let ctx = TransactionContext::new();
        writer
            .put(&key, b"v1".to_vec(), DocumentMetadata::default(), &ctx)
            .await
            .unwrap();

        let doc = writer
            .put(
                &key,
                b"v2".to_vec(),
                DocumentMetadata::default().with_extra("owner", json!("ops")),
                &ctx,
            )
            .await
            .unwrap();

        let meta = &doc.metadata;
        assert_eq!(meta.replication.version, Some(2));
        assert_eq!(meta.replication.history, Some(vec![HistoryEntry::new(1, "A")]));
        assert_eq!(meta.extra.get("owner"), Some(&json!("ops")));
    }
}
