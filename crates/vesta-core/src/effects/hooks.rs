//! Delete-time hook contract
//!
//! The host pipeline calls `pre_delete` on every registered hook, performs the
//! physical delete unless some hook virtualizes it, then calls `post_delete`.
//! Both phases of one operation receive the same [`TransactionContext`].

use crate::document::DocumentKey;
use crate::errors::Result;
use crate::identifiers::TransactionContext;
use async_trait::async_trait;

/// A hook dispatched around document deletes
#[async_trait]
pub trait DeleteHook: Send + Sync {
    /// Name used in configuration and logs
    fn name(&self) -> &str;

    /// Priority used when configuration does not name this hook; lower runs first
    fn default_priority(&self) -> i32 {
        0
    }

    /// Whether the pipeline must skip the physical delete when this hook is
    /// registered
    fn suppresses_physical_delete(&self) -> bool {
        false
    }

    /// Runs before the physical delete; an error aborts the delete
    async fn pre_delete(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<()>;

    /// Runs after the physical delete (or in its place); an error aborts the delete
    async fn post_delete(&self, _key: &DocumentKey, _ctx: &TransactionContext) -> Result<()> {
        Ok(())
    }

    /// Called when the operation fails between phases
    fn abort(&self, _ctx: &TransactionContext) {}
}
