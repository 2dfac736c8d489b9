//! Typed replication metadata
//!
//! Every document carries a `version`/`source` pair naming the revision and a
//! `history` chain of the revisions it superseded. Tombstones additionally set
//! `deleteMarker`. The JSON field names here are the persisted wire contract.
//!
//! Metadata fields that replication does not own are kept in
//! [`DocumentMetadata::extra`] and passed through untouched.

use crate::identifiers::NodeId;
use serde::{Deserialize, Serialize};

/// One superseded revision in a history chain
///
/// Both fields are optional because a document written without replication
/// metadata still contributes an entry when it is superseded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Version of the superseded revision
    #[serde(default)]
    pub version: Option<u64>,
    /// Node that authored the superseded revision
    #[serde(default)]
    pub source: Option<NodeId>,
}

impl HistoryEntry {
    /// Entry for a revision with known version and source
    pub fn new(version: u64, source: impl Into<NodeId>) -> Self {
        Self {
            version: Some(version),
            source: Some(source.into()),
        }
    }
}

/// Replication fields of a document's metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationMetadata {
    /// Present and true only on tombstones
    #[serde(default, skip_serializing_if = "is_false")]
    pub delete_marker: bool,
    /// Node-local monotonic id of this revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Node that authored this revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<NodeId>,
    /// Prior revisions, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ReplicationMetadata {
    /// Metadata for a live revision authored by `source`
    pub fn revision(version: u64, source: impl Into<NodeId>) -> Self {
        Self {
            delete_marker: false,
            version: Some(version),
            source: Some(source.into()),
            history: None,
        }
    }

    /// Tombstone metadata
    ///
    /// `history` is whatever was staged before the delete and stays `None`
    /// when nothing existed at the key.
    pub fn tombstone(history: Option<Vec<HistoryEntry>>, source: NodeId, version: u64) -> Self {
        Self {
            delete_marker: true,
            version: Some(version),
            source: Some(source),
            history,
        }
    }

    /// Builder-style history setter
    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = Some(history);
        self
    }

    /// This revision's own `{version, source}` pair
    pub fn current_entry(&self) -> HistoryEntry {
        HistoryEntry {
            version: self.version,
            source: self.source.clone(),
        }
    }

    /// History a superseding write must carry: the existing chain with this
    /// revision appended
    pub fn superseded_history(&self) -> Vec<HistoryEntry> {
        let mut history = self.history.clone().unwrap_or_default();
        history.push(self.current_entry());
        history
    }
}

/// Full document metadata: typed replication fields plus unrelated fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Replication fields
    #[serde(flatten)]
    pub replication: ReplicationMetadata,
    /// Every other metadata field, carried untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DocumentMetadata {
    /// Metadata consisting only of replication fields
    pub fn replication_only(replication: ReplicationMetadata) -> Self {
        Self {
            replication,
            extra: serde_json::Map::new(),
        }
    }

    /// Builder-style setter for an unrelated metadata field
    pub fn with_extra(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(field.into(), value);
        self
    }

    /// True when this metadata marks a tombstone
    pub fn is_tombstone(&self) -> bool {
        self.replication.delete_marker
    }
}

impl From<ReplicationMetadata> for DocumentMetadata {
    fn from(replication: ReplicationMetadata) -> Self {
        Self::replication_only(replication)
    }
}
