//! # Vesta Effects - Layer 2: Handlers
//!
//! Implementations of the effect traits defined in `vesta-core`.
//!
//! - [`MemoryDocumentStore`]: transactional in-memory document store with
//!   trigger suppression
//! - [`MemoryCounterStore`]: in-memory persistent-counter stand-in
//! - [`VersionOracle`]: batched, single-flight per-node version allocation
//! - [`DatabaseExtensions`]: lazily created per-database singletons
//!
//! The in-memory handlers lose everything when the process exits. Use them in
//! development, tests, and the `vesta` replay tool.

#![forbid(unsafe_code)]

pub mod counter;
pub mod document_store;
pub mod extensions;
pub mod version_oracle;

pub use counter::MemoryCounterStore;
pub use document_store::MemoryDocumentStore;
pub use extensions::DatabaseExtensions;
pub use version_oracle::{OracleSnapshot, VersionOracle};
