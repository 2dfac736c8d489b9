//! Document model
//!
//! Documents are produced and owned by the store. The replication layer only
//! reads them and overwrites them with tombstones.

use crate::metadata::DocumentMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key a document is stored under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Create a key from its string form
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for DocumentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Storage key
    pub key: DocumentKey,
    /// Opaque body; empty for tombstones
    pub body: Vec<u8>,
    /// Replication and unrelated metadata
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Assemble a document
    pub fn new(key: DocumentKey, body: Vec<u8>, metadata: DocumentMetadata) -> Self {
        Self {
            key,
            body,
            metadata,
        }
    }

    /// True when this document is a delete marker
    ///
    /// Readers listing live documents must filter on this.
    pub fn is_tombstone(&self) -> bool {
        self.metadata.is_tombstone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::NodeId;
    use crate::metadata::ReplicationMetadata;

    #[test]
    fn tombstone_detection_follows_delete_marker() {
        let live = Document::new(
            "users/1".into(),
            b"{}".to_vec(),
            ReplicationMetadata::revision(1, "A").into(),
        );
        assert!(!live.is_tombstone());

        let dead = Document::new(
            "users/1".into(),
            Vec::new(),
            ReplicationMetadata::tombstone(None, NodeId::new("A"), 2).into(),
        );
        assert!(dead.is_tombstone());
    }
}
