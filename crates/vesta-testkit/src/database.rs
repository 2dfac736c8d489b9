//! Ready-wired test database
//!
//! Builds a [`Database`] over a [`FlakyDocumentStore`] and a
//! [`FlakyCounterStore`] so tests can both drive deletes and pull the plug on
//! either backend.

use crate::faults::{FlakyCounterStore, FlakyDocumentStore};
use std::sync::Arc;
use vesta_core::effects::DeleteHook;
use vesta_core::{DocumentKey, Result, TransactionContext, VestaConfig};
use vesta_effects::{MemoryCounterStore, MemoryDocumentStore};
use vesta_replication::{Database, DeleteOutcome, DeletePipeline, TombstoneConverter};

/// Builder for [`TestDatabase`]
#[derive(Default)]
pub struct TestDatabaseBuilder {
    config: VestaConfig,
    counter: MemoryCounterStore,
    hooks: Vec<Arc<dyn DeleteHook>>,
}

impl TestDatabaseBuilder {
    /// Local node identity
    pub fn node(mut self, node: &str) -> Self {
        self.config.node.node_id = node.into();
        self
    }

    /// Version oracle batch size
    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.config.version_oracle.batch_size = batch_size;
        self
    }

    /// Configured priority for a hook
    pub fn hook_priority(mut self, hook: &str, priority: i32) -> Self {
        self.config.hooks.priorities.insert(hook.to_string(), priority);
        self
    }

    /// Extra delete hook registered alongside the tombstone converter
    pub fn hook(mut self, hook: Arc<dyn DeleteHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Counter store to reserve from (for example one seeded past a restart)
    pub fn counter(mut self, counter: MemoryCounterStore) -> Self {
        self.counter = counter;
        self
    }

    /// Build the database and its pipeline
    pub fn build(self) -> TestDatabase {
        let store = FlakyDocumentStore::new(MemoryDocumentStore::new());
        let counter = FlakyCounterStore::new(self.counter);
        let database = Database::new(
            Arc::new(store.clone()),
            Arc::new(counter.clone()),
            self.config,
        )
        .expect("test configuration must be valid");
        let converter = database
            .tombstone_converter()
            .expect("converter construction must succeed");
        let pipeline = database
            .delete_pipeline_with(self.hooks)
            .expect("pipeline construction must succeed");
        TestDatabase {
            database,
            pipeline,
            converter,
            store,
            counter,
        }
    }
}

/// Database, pipeline, and fault switches for one test
pub struct TestDatabase {
    /// Database handle
    pub database: Database,
    /// Delete pipeline with the tombstone converter registered
    pub pipeline: DeletePipeline,
    /// The converter registered in `pipeline`, for inspecting staged state
    pub converter: Arc<TombstoneConverter>,
    /// Document store (fault-injectable)
    pub store: FlakyDocumentStore,
    /// Counter store (fault-injectable)
    pub counter: FlakyCounterStore,
}

impl TestDatabase {
    /// Start building a test database
    pub fn builder() -> TestDatabaseBuilder {
        TestDatabaseBuilder::default()
    }

    /// Delete `key` as a fresh autocommit operation
    pub async fn delete(&self, key: &str) -> Result<DeleteOutcome> {
        self.pipeline
            .delete(&DocumentKey::new(key), &TransactionContext::new())
            .await
    }
}
