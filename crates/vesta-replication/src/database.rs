//! Database handle wiring store, counter, and configuration together
//!
//! The version oracle is a per-database singleton created on first use and
//! kept in the database's [`DatabaseExtensions`]. Every converter, writer, and
//! pipeline built from the same handle (or its clones) shares it.

use crate::pipeline::{DeletePipeline, HookRegistry};
use crate::revision::RevisionWriter;
use crate::tombstone::TombstoneConverter;
use std::sync::Arc;
use vesta_core::effects::{CounterEffects, DatabaseEffects, DeleteHook};
use vesta_core::{NodeId, Result, VestaConfig};
use vesta_effects::{DatabaseExtensions, VersionOracle};

/// One database instance on the local node
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DatabaseEffects>,
    counter: Arc<dyn CounterEffects>,
    config: VestaConfig,
    extensions: DatabaseExtensions,
}

impl Database {
    /// Open a database over `store` and `counter`; fails on invalid configuration
    pub fn new(
        store: Arc<dyn DatabaseEffects>,
        counter: Arc<dyn CounterEffects>,
        config: VestaConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            counter,
            config,
            extensions: DatabaseExtensions::new(),
        })
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn DatabaseEffects> {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &VestaConfig {
        &self.config
    }

    /// Local node identity
    pub fn node_id(&self) -> &NodeId {
        &self.config.node.node_id
    }

    /// Per-database extension registry
    pub fn extensions(&self) -> &DatabaseExtensions {
        &self.extensions
    }

    /// The database's version oracle, created on first use
    pub fn version_oracle(&self) -> Result<Arc<VersionOracle>> {
        self.extensions.get_or_try_insert_with(|| {
            VersionOracle::from_config(
                self.config.node.node_id.clone(),
                &self.config.version_oracle,
                Arc::clone(&self.counter),
            )
        })
    }

    /// The database's tombstone converter, created on first use
    ///
    /// Every pipeline built from this handle registers this same converter, so
    /// its staged history can be inspected from outside a pipeline.
    pub fn tombstone_converter(&self) -> Result<Arc<TombstoneConverter>> {
        let oracle = self.version_oracle()?;
        Ok(self
            .extensions
            .get_or_insert_with(|| TombstoneConverter::new(Arc::clone(&self.store), oracle)))
    }

    /// A revision writer sharing this database's oracle
    pub fn revision_writer(&self) -> Result<RevisionWriter> {
        Ok(RevisionWriter::new(
            Arc::clone(&self.store),
            self.version_oracle()?,
        ))
    }

    /// Delete pipeline with the tombstone converter registered
    pub fn delete_pipeline(&self) -> Result<DeletePipeline> {
        self.delete_pipeline_with(Vec::new())
    }

    /// Delete pipeline with the tombstone converter plus `hooks`, each at its
    /// configured priority
    pub fn delete_pipeline_with(&self, hooks: Vec<Arc<dyn DeleteHook>>) -> Result<DeletePipeline> {
        let mut registry = HookRegistry::new(self.config.hooks.clone());
        registry.register(self.tombstone_converter()?);
        for hook in hooks {
            registry.register(hook);
        }
        Ok(DeletePipeline::new(Arc::clone(&self.store), registry))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("node", self.node_id())
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_effects::{MemoryCounterStore, MemoryDocumentStore};

    fn database() -> Database {
        Database::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryCounterStore::new()),
            VestaConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn oracle_is_a_per_database_singleton() {
        let db = database();
        let first = db.version_oracle().unwrap();
        let second = db.clone().version_oracle().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = database();
        assert!(!Arc::ptr_eq(&first, &other.version_oracle().unwrap()));
    }

    #[test]
    fn pipelines_share_the_database_converter() {
        let db = database();
        let converter = db.tombstone_converter().unwrap();
        assert!(Arc::ptr_eq(&converter, &db.clone().tombstone_converter().unwrap()));

        let pipeline = db.delete_pipeline().unwrap();
        assert_eq!(pipeline.registry().len(), 1);
        assert_eq!(Arc::strong_count(&converter), 3);
    }

    #[test]
    fn invalid_config_refused() {
        let mut config = VestaConfig::default();
        config.version_oracle.batch_size = 0;
        let result = Database::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryCounterStore::new()),
            config,
        );
        assert!(result.is_err());
    }

    #[test]
    fn pipeline_virtualizes_deletes() {
        let pipeline = database().delete_pipeline().unwrap();
        assert!(pipeline.registry().suppresses_physical_delete());
        assert_eq!(
            pipeline.registry().ordering(),
            vec![("virtual-delete".to_string(), 10_000)]
        );
    }
}
