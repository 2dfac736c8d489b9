//! Delete-to-tombstone conversion
//!
//! A replicated store cannot physically delete: a removed key leaves nothing to
//! replicate and no way to detect a concurrent write/delete conflict. The
//! converter turns each delete into a tombstone write instead.
//!
//! - `pre_delete` reads the current document (triggers suppressed) and stages
//!   its history with its own `{version, source}` appended.
//! - The pipeline skips the physical delete.
//! - `post_delete` allocates a fresh version and overwrites the key with an
//!   empty-bodied document marked `deleteMarker`, carrying the staged history.
//!
//! A key that held nothing still gets a tombstone, with no history.

use crate::staging::StagingContext;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vesta_core::effects::{DatabaseEffects, DeleteHook};
use vesta_core::{
    Document, DocumentKey, DocumentMetadata, NodeId, OperationId, ReplicationMetadata, Result,
    TransactionContext,
};
use vesta_effects::VersionOracle;

/// Hook name used for priority configuration
pub const VIRTUAL_DELETE_HOOK: &str = "virtual-delete";

/// Runs late among delete hooks, after validation
pub const VIRTUAL_DELETE_PRIORITY: i32 = 10_000;

/// Converts deletes into tombstone writes
pub struct TombstoneConverter {
    store: Arc<dyn DatabaseEffects>,
    oracle: Arc<VersionOracle>,
    staging: StagingContext,
}

impl TombstoneConverter {
    /// Converter writing tombstones into `store`, versioned by `oracle`
    ///
    /// Tombstones name the oracle's node as their `source`.
    pub fn new(store: Arc<dyn DatabaseEffects>, oracle: Arc<VersionOracle>) -> Self {
        Self {
            store,
            oracle,
            staging: StagingContext::new(),
        }
    }

    /// Node written as `source` on tombstones
    pub fn node_id(&self) -> &NodeId {
        self.oracle.node_id()
    }

    /// Stage the history of the document currently at `key`
    pub async fn pre_delete(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<()> {
        if self.staging.clear(ctx.operation) {
            warn!(%key, operation = %ctx.operation, "cleared stale staged history");
        }

        let current = {
            let _guard = self.store.suppress_triggers(ctx.operation);
            self.store.get(key, ctx).await?
        };

        match current {
            Some(document) => {
                let history = document.metadata.replication.superseded_history();
                debug!(%key, operation = %ctx.operation, entries = history.len(), "staged history");
                self.staging.put(ctx.operation, history);
            }
            None => {
                debug!(%key, operation = %ctx.operation, "no document to stage");
            }
        }
        Ok(())
    }

    /// Overwrite `key` with a tombstone and return it
    ///
    /// The staged entry for the operation is consumed even when version
    /// allocation or the write fails; nothing is written in that case.
    pub async fn post_delete(
        &self,
        key: &DocumentKey,
        ctx: &TransactionContext,
    ) -> Result<Document> {
        let history = self.staging.take_and_clear(ctx.operation);
        let version = self.oracle.next_id().await?;
        let metadata = DocumentMetadata::from(ReplicationMetadata::tombstone(
            history,
            self.oracle.node_id().clone(),
            version,
        ));

        {
            let _guard = self.store.suppress_triggers(ctx.operation);
            self.store
                .put(key, Vec::new(), metadata.clone(), ctx)
                .await?;
        }

        info!(%key, operation = %ctx.operation, version, "wrote tombstone");
        Ok(Document::new(key.clone(), Vec::new(), metadata))
    }

    /// Drop history staged by an operation that will not reach `post_delete`
    pub fn discard(&self, operation: OperationId) -> bool {
        self.staging.clear(operation)
    }

    /// Number of operations with staged history
    pub fn staged_operations(&self) -> usize {
        self.staging.len()
    }
}

#[async_trait]
impl DeleteHook for TombstoneConverter {
    fn name(&self) -> &str {
        VIRTUAL_DELETE_HOOK
    }

    fn default_priority(&self) -> i32 {
        VIRTUAL_DELETE_PRIORITY
    }

    fn suppresses_physical_delete(&self) -> bool {
        true
    }

    async fn pre_delete(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<()> {
        TombstoneConverter::pre_delete(self, key, ctx).await
    }

    async fn post_delete(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<()> {
        TombstoneConverter::post_delete(self, key, ctx).await.map(|_| ())
    }

    fn abort(&self, ctx: &TransactionContext) {
        if self.discard(ctx.operation) {
            debug!(operation = %ctx.operation, "discarded staged history");
        }
    }
}

impl std::fmt::Debug for TombstoneConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TombstoneConverter")
            .field("node", self.oracle.node_id())
            .field("staging", &self.staging)
            .finish_non_exhaustive()
    }
}
