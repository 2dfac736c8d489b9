//! # Vesta Core - Layer 1: Foundation
//!
//! **Purpose**: Define the document model, typed replication metadata, and the
//! effect interfaces that the virtual-delete machinery consumes.
//!
//! # Architecture Constraints
//!
//! - YES Document and metadata types shared by every crate
//! - YES Effect traits for the external store, counter store, and delete hooks
//! - YES Unified error type and configuration
//! - NO effect handler implementations (those live in `vesta-effects`)
//! - NO tombstone conversion logic (that's `vesta-replication`)
//!
//! ## Core Concepts
//!
//! - **Document**: key, opaque body, and metadata owned by the store
//! - **ReplicationMetadata**: `version`, `source`, `history`, `deleteMarker`
//! - **TransactionContext**: the explicit identity of one in-flight operation

#![forbid(unsafe_code)]

/// Workspace configuration
pub mod config;

/// Document model
pub mod document;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Node, operation, and transaction identifiers
pub mod identifiers;

/// Typed replication metadata
pub mod metadata;

pub use config::{HookConfig, NodeConfig, VersionOracleConfig, VestaConfig};
pub use document::{Document, DocumentKey};
pub use errors::{Result, VestaError};
pub use identifiers::{NodeId, OperationId, TransactionContext, TransactionId};
pub use metadata::{DocumentMetadata, HistoryEntry, ReplicationMetadata};
