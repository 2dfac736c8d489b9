//! Script replay against an in-memory node
//!
//! Each script line is one JSON object:
//!
//! ```text
//! {"op":"put","key":"users/1","body":"alice"}
//! {"op":"put","key":"users/2","body":"bob","metadata":{"version":7,"source":"A"}}
//! {"op":"delete","key":"users/1"}
//! {"op":"get","key":"users/1"}
//! ```
//!
//! A put without a `version` in its metadata is a local write and is
//! versioned by the node. A put that carries one is applied as-is, the way a
//! revision replicated from another node would arrive. Blank lines and lines
//! starting with `#` are skipped.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use vesta_core::{Document, DocumentKey, DocumentMetadata, TransactionContext, VestaConfig};
use vesta_effects::{MemoryCounterStore, MemoryDocumentStore};
use vesta_replication::{Database, DeletePipeline, RevisionWriter};

/// One line of a replay script
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum ScriptOp {
    Put {
        key: DocumentKey,
        #[serde(default)]
        body: String,
        #[serde(default)]
        metadata: Option<DocumentMetadata>,
    },
    Delete {
        key: DocumentKey,
    },
    Get {
        key: DocumentKey,
    },
}

#[derive(Serialize)]
struct DocumentView<'a> {
    key: &'a DocumentKey,
    body: Cow<'a, str>,
    metadata: &'a DocumentMetadata,
}

impl<'a> From<&'a Document> for DocumentView<'a> {
    fn from(document: &'a Document) -> Self {
        Self {
            key: &document.key,
            body: String::from_utf8_lossy(&document.body),
            metadata: &document.metadata,
        }
    }
}

/// In-memory node a script is replayed against
pub struct ReplayNode {
    store: MemoryDocumentStore,
    pipeline: DeletePipeline,
    writer: RevisionWriter,
}

impl ReplayNode {
    /// Fresh node with an empty store and counter
    pub fn new(config: VestaConfig) -> Result<Self> {
        let store = MemoryDocumentStore::new();
        let database = Database::new(
            Arc::new(store.clone()),
            Arc::new(MemoryCounterStore::new()),
            config,
        )?;
        Ok(Self {
            pipeline: database.delete_pipeline()?,
            writer: database.revision_writer()?,
            store,
        })
    }

    /// Replay every operation in `script`, writing `get` results to `out`
    pub async fn replay<W: Write>(&self, script: &str, out: &mut W) -> Result<usize> {
        let mut applied = 0;
        for (index, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let op: ScriptOp = serde_json::from_str(line)
                .with_context(|| format!("line {}: malformed operation", index + 1))?;
            self.apply(op, out)
                .await
                .with_context(|| format!("line {}: operation failed", index + 1))?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Write every stored document, tombstones included, to `out`
    pub async fn dump<W: Write>(&self, out: &mut W) -> Result<()> {
        let documents = self.store.snapshot().await;
        let views: Vec<DocumentView<'_>> = documents.iter().map(DocumentView::from).collect();
        serde_json::to_writer_pretty(&mut *out, &views)?;
        writeln!(out)?;
        Ok(())
    }

    async fn apply<W: Write>(&self, op: ScriptOp, out: &mut W) -> Result<()> {
        let ctx = TransactionContext::new();
        match op {
            ScriptOp::Put {
                key,
                body,
                metadata: Some(metadata),
            } if metadata.replication.version.is_some() => {
                self.pipeline
                    .put(&key, body.into_bytes(), metadata, &ctx)
                    .await?;
                info!(%key, "applied replicated revision");
            }
            ScriptOp::Put {
                key,
                body,
                metadata,
            } => {
                let document = self
                    .writer
                    .put(&key, body.into_bytes(), metadata.unwrap_or_default(), &ctx)
                    .await?;
                info!(%key, version = ?document.metadata.replication.version, "wrote local revision");
            }
            ScriptOp::Delete { key } => {
                let outcome = self.pipeline.delete(&key, &ctx).await?;
                info!(%key, physically_deleted = outcome.physically_deleted, "deleted");
            }
            ScriptOp::Get { key } => match self.pipeline.get(&key, &ctx).await? {
                Some(document) => {
                    serde_json::to_writer(&mut *out, &DocumentView::from(&document))?;
                    writeln!(out)?;
                }
                None => {
                    let missing = serde_json::json!({ "key": key, "found": false });
                    serde_json::to_writer(&mut *out, &missing)?;
                    writeln!(out)?;
                }
            },
        }
        Ok(())
    }
}

/// Replay the script at `path` on a fresh node
pub async fn run<W: Write>(path: &Path, config: VestaConfig, dump: bool, out: &mut W) -> Result<()> {
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let node = ReplayNode::new(config)?;
    let applied = node.replay(&script, out).await?;
    info!(applied, script = %path.display(), "replay finished");
    if dump {
        node.dump(out).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_core::NodeId;

    fn node(id: &str) -> ReplayNode {
        let mut config = VestaConfig::default();
        config.node.node_id = NodeId::new(id);
        ReplayNode::new(config).unwrap()
    }

    fn lines(out: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn delete_after_replicated_put_leaves_tombstone() {
        let node = node("B");
        let script = r#"
            # revision that arrived from node A
            {"op":"put","key":"users/1","body":"alice","metadata":{"version":5,"source":"A"}}
            {"op":"delete","key":"users/1"}
            {"op":"get","key":"users/1"}
        "#;
        let mut out = Vec::new();
        assert_eq!(node.replay(script, &mut out).await.unwrap(), 3);

        let got = lines(out);
        assert_eq!(got.len(), 1);
        let meta = &got[0]["metadata"];
        assert_eq!(got[0]["body"], "");
        assert_eq!(meta["deleteMarker"], true);
        assert_eq!(meta["source"], "B");
        assert_eq!(meta["history"], serde_json::json!([{ "version": 5, "source": "A" }]));
    }

    #[tokio::test]
    async fn local_puts_are_versioned_and_chain_history() {
        let node = node("B");
        let script = r#"
            {"op":"put","key":"notes/1","body":"one","metadata":{"Content-Type":"text/plain"}}
            {"op":"put","key":"notes/1","body":"two"}
            {"op":"get","key":"notes/1"}
        "#;
        let mut out = Vec::new();
        node.replay(script, &mut out).await.unwrap();

        let got = lines(out);
        let meta = &got[0]["metadata"];
        assert_eq!(got[0]["body"], "two");
        assert_eq!(meta["source"], "B");
        assert_eq!(meta["history"][0]["version"], 1);
        assert!(meta.get("Content-Type").is_none());
    }

    #[tokio::test]
    async fn missing_key_reports_not_found() {
        let node = node("B");
        let mut out = Vec::new();
        node.replay(r#"{"op":"get","key":"ghost"}"#, &mut out)
            .await
            .unwrap();
        assert_eq!(lines(out)[0]["found"], false);
    }

    #[tokio::test]
    async fn malformed_line_names_its_position() {
        let node = node("B");
        let err = node
            .replay("{\"op\":\"get\",\"key\":\"a\"}\n{\"op\":\"rename\"}", &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn dump_lists_tombstones() {
        let node = node("B");
        node.replay(r#"{"op":"delete","key":"never/existed"}"#, &mut Vec::new())
            .await
            .unwrap();

        let mut out = Vec::new();
        node.dump(&mut out).await.unwrap();
        let dumped: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(dumped.as_array().unwrap().len(), 1);
        assert_eq!(dumped[0]["metadata"]["deleteMarker"], true);
    }
}
