//! Delete pipeline with explicitly ordered hooks
//!
//! Hooks are registered with a priority taken from `[hooks.priorities]` in
//! configuration, falling back to the hook's own default. Lower priorities run
//! first; equal priorities keep registration order.
//!
//! A delete runs every `pre_delete`, then the physical delete unless a
//! registered hook virtualizes it, then every `post_delete`. Deletes without a
//! caller transaction run inside an implicit one, so a failure anywhere leaves
//! the store as it was.

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use vesta_core::effects::{DatabaseEffects, DeleteHook};
use vesta_core::{
    Document, DocumentKey, DocumentMetadata, HookConfig, OperationId, Result, TransactionContext,
};

struct Registration {
    hook: Arc<dyn DeleteHook>,
    priority: i32,
}

/// Ordered set of delete hooks
pub struct HookRegistry {
    config: HookConfig,
    registrations: Vec<Registration>,
}

impl HookRegistry {
    /// Empty registry resolving priorities from `config`
    pub fn new(config: HookConfig) -> Self {
        Self {
            config,
            registrations: Vec::new(),
        }
    }

    /// Register `hook` at its configured priority; returns the priority used
    pub fn register(&mut self, hook: Arc<dyn DeleteHook>) -> i32 {
        let priority = self
            .config
            .priority_for(hook.name())
            .unwrap_or_else(|| hook.default_priority());
        self.register_with_priority(hook, priority);
        priority
    }

    /// Register `hook` at an explicit priority, ignoring configuration
    pub fn register_with_priority(&mut self, hook: Arc<dyn DeleteHook>, priority: i32) {
        let position = self
            .registrations
            .iter()
            .position(|existing| existing.priority > priority)
            .unwrap_or(self.registrations.len());
        debug!(hook = hook.name(), priority, position, "registered delete hook");
        self.registrations
            .insert(position, Registration { hook, priority });
    }

    /// Hooks in execution order
    pub fn hooks(&self) -> impl Iterator<Item = &Arc<dyn DeleteHook>> {
        self.registrations.iter().map(|registration| &registration.hook)
    }

    /// `(name, priority)` pairs in execution order
    pub fn ordering(&self) -> Vec<(String, i32)> {
        self.registrations
            .iter()
            .map(|registration| (registration.hook.name().to_string(), registration.priority))
            .collect()
    }

    /// Whether any registered hook replaces the physical delete
    pub fn suppresses_physical_delete(&self) -> bool {
        self.registrations
            .iter()
            .any(|registration| registration.hook.suppresses_physical_delete())
    }

    /// Number of registered hooks
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// True when no hooks are registered
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Result of a successful delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Key the delete targeted
    pub key: DocumentKey,
    /// Operation the delete ran as
    pub operation: OperationId,
    /// Whether the key was physically removed (false when virtualized)
    pub physically_deleted: bool,
}

/// Host-side delete pipeline
pub struct DeletePipeline {
    store: Arc<dyn DatabaseEffects>,
    registry: HookRegistry,
}

impl DeletePipeline {
    /// Pipeline over `store` dispatching to `registry`
    pub fn new(store: Arc<dyn DatabaseEffects>, registry: HookRegistry) -> Self {
        Self { store, registry }
    }

    /// Registered hooks
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Delete `key` as `ctx.operation`
    ///
    /// With triggers suppressed for the operation this is a raw physical
    /// delete. Otherwise hooks run and any failure aborts the whole delete.
    #[instrument(skip_all, fields(key = %key, operation = %ctx.operation))]
    pub async fn delete(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<DeleteOutcome> {
        if self.store.triggers_suppressed(ctx.operation) {
            let existed = self.store.remove(key, ctx).await?;
            return Ok(DeleteOutcome {
                key: key.clone(),
                operation: ctx.operation,
                physically_deleted: existed,
            });
        }

        if ctx.transaction.is_some() {
            return self.run_hooks(key, ctx).await;
        }

        let transaction = self.store.begin().await?;
        let scoped = ctx.with_transaction(transaction);
        match self.run_hooks(key, &scoped).await {
            Ok(outcome) => {
                self.store.commit(transaction).await?;
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(transaction).await {
                    warn!(%transaction, error = %rollback_err, "rollback after failed delete failed");
                }
                Err(err)
            }
        }
    }

    /// Write a document through the pipeline's store
    pub async fn put(
        &self,
        key: &DocumentKey,
        body: Vec<u8>,
        metadata: DocumentMetadata,
        ctx: &TransactionContext,
    ) -> Result<()> {
        self.store.put(key, body, metadata, ctx).await
    }

    /// Read a document through the pipeline's store
    pub async fn get(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<Option<Document>> {
        self.store.get(key, ctx).await
    }

    async fn run_hooks(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<DeleteOutcome> {
        let result = self.run_phases(key, ctx).await;
        if let Err(err) = &result {
            warn!(%key, operation = %ctx.operation, error = %err, "delete aborted");
            for hook in self.registry.hooks() {
                hook.abort(ctx);
            }
        }
        result
    }

    async fn run_phases(&self, key: &DocumentKey, ctx: &TransactionContext) -> Result<DeleteOutcome> {
        for hook in self.registry.hooks() {
            hook.pre_delete(key, ctx).await?;
        }

        let physically_deleted = if self.registry.suppresses_physical_delete() {
            debug!(%key, "physical delete suppressed");
            false
        } else {
            self.store.remove(key, ctx).await?
        };

        for hook in self.registry.hooks() {
            hook.post_delete(key, ctx).await?;
        }

        Ok(DeleteOutcome {
            key: key.clone(),
            operation: ctx.operation,
            physically_deleted,
        })
    }
}
