//! Common document and metadata fixtures

use vesta_core::effects::DocumentStoreEffects;
use vesta_core::{
    Document, DocumentKey, DocumentMetadata, HistoryEntry, NodeId, ReplicationMetadata,
    TransactionContext,
};

/// Node ID fixture
pub fn node(id: &str) -> NodeId {
    NodeId::new(id)
}

/// Key fixture
pub fn key(key: &str) -> DocumentKey {
    DocumentKey::new(key)
}

/// Live revision metadata `{version, source}` without history
pub fn revision(version: u64, source: &str) -> DocumentMetadata {
    ReplicationMetadata::revision(version, source).into()
}

/// Live revision metadata with an explicit history chain
pub fn revision_with_history(
    version: u64,
    source: &str,
    history: &[(u64, &str)],
) -> DocumentMetadata {
    ReplicationMetadata::revision(version, source)
        .with_history(history_of(history))
        .into()
}

/// History chain from `(version, source)` pairs, oldest first
pub fn history_of(entries: &[(u64, &str)]) -> Vec<HistoryEntry> {
    entries
        .iter()
        .map(|(version, source)| HistoryEntry::new(*version, *source))
        .collect()
}

/// Write a document directly into `store` in autocommit mode
pub async fn seed_document<S>(store: &S, key: &str, metadata: DocumentMetadata, body: &[u8])
where
    S: DocumentStoreEffects + ?Sized,
{
    store
        .put(
            &DocumentKey::new(key),
            body.to_vec(),
            metadata,
            &TransactionContext::new(),
        )
        .await
        .expect("seeding the test store should succeed");
}

/// Read a committed document from `store`
pub async fn committed<S>(store: &S, key: &str) -> Option<Document>
where
    S: DocumentStoreEffects + ?Sized,
{
    store
        .get(&DocumentKey::new(key), &TransactionContext::new())
        .await
        .expect("reading the test store should succeed")
}

/// Assert `document` is a tombstone authored by `source`, returning its version
pub fn assert_tombstone(document: &Document, source: &str) -> u64 {
    let meta = &document.metadata.replication;
    assert!(meta.delete_marker, "{} is not a tombstone", document.key);
    assert!(document.body.is_empty(), "tombstone body must be empty");
    assert_eq!(meta.source, Some(NodeId::new(source)));
    meta.version.expect("tombstones always carry a version")
}
