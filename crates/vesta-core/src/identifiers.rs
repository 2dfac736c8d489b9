//! Core identifier types
//!
//! Node identity names the storage instance that authors a revision. Operation
//! and transaction identifiers replace any notion of "the current thread": the
//! host passes them explicitly into every phase of an operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of the storage instance that authored a document revision
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node ID from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

/// Identity of one in-flight logical operation (a single delete, put, or get)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub Uuid);

impl OperationId {
    /// Create a new random operation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Identity of a store transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    /// Create a new random transaction ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Context passed by the host into every store access and hook phase
///
/// `transaction` is `None` for autocommit accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionContext {
    /// The logical operation this access belongs to
    pub operation: OperationId,
    /// The enclosing transaction, if any
    pub transaction: Option<TransactionId>,
}

impl TransactionContext {
    /// Autocommit context for a fresh operation
    pub fn new() -> Self {
        Self {
            operation: OperationId::new(),
            transaction: None,
        }
    }

    /// Context for a fresh operation inside `transaction`
    pub fn in_transaction(transaction: TransactionId) -> Self {
        Self {
            operation: OperationId::new(),
            transaction: Some(transaction),
        }
    }

    /// Same operation, bound to `transaction`
    pub fn with_transaction(self, transaction: TransactionId) -> Self {
        Self {
            transaction: Some(transaction),
            ..self
        }
    }
}

impl Default for TransactionContext {
    fn default() -> Self {
        Self::new()
    }
}
