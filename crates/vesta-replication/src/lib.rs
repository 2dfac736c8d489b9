//! # Vesta Replication - Layer 3: Virtual Deletes
//!
//! Turns deletes into versioned tombstone writes so the replication layer can
//! treat "deleted" as one more revision of a document.
//!
//! ## Components
//!
//! - [`StagingContext`]: per-operation history staged between delete phases
//! - [`TombstoneConverter`]: the `virtual-delete` hook writing tombstones
//! - [`RevisionWriter`]: versioned writes of live documents
//! - [`DeletePipeline`] / [`HookRegistry`]: reference host pipeline with
//!   configuration-driven hook ordering
//! - [`Database`]: wires a store, a counter, and configuration together and
//!   owns the per-database version oracle
//!
//! ## What's NOT in this crate
//!
//! - Conflict resolution between replicas
//! - Tombstone compaction or expiry
//! - The wire protocol that ships tombstones between nodes

#![forbid(unsafe_code)]

pub mod database;
pub mod pipeline;
pub mod revision;
pub mod staging;
pub mod tombstone;

pub use database::Database;
pub use pipeline::{DeleteOutcome, DeletePipeline, HookRegistry};
pub use revision::RevisionWriter;
pub use staging::StagingContext;
pub use tombstone::{TombstoneConverter, VIRTUAL_DELETE_HOOK, VIRTUAL_DELETE_PRIORITY};
