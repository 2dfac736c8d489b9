//! Unified error system for Vesta
//!
//! One error type for every layer. Handlers map their backend failures onto
//! these variants so the delete pipeline can reason about them uniformly.

use serde::{Deserialize, Serialize};

/// Unified error type for all Vesta operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VestaError {
    /// Backing storage (document store or counter store) could not be reached
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Description of the failed storage access
        message: String,
    },

    /// Invalid input
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// A delete hook refused the operation
    #[error("Rejected by {hook}: {message}")]
    Rejected {
        /// Name of the hook that vetoed the operation
        hook: String,
        /// Reason given by the hook
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Internal invariant violated
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl VestaError {
    /// Create a storage unavailable error
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a hook rejection error
    pub fn rejected(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when the failure came from unreachable storage
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

/// Standard Result type for Vesta operations
pub type Result<T> = std::result::Result<T, VestaError>;

impl From<serde_json::Error> for VestaError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for VestaError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<std::io::Error> for VestaError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::storage_unavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = VestaError::storage_unavailable("counter store offline");
        assert!(err.is_storage_unavailable());
        assert_eq!(err.to_string(), "Storage unavailable: counter store offline");
    }

    #[test]
    fn test_rejected_names_hook() {
        let err = VestaError::rejected("schema-check", "missing field");
        assert_eq!(err.to_string(), "Rejected by schema-check: missing field");
        assert!(!err.is_storage_unavailable());
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        assert!(matches!(VestaError::from(io_err), VestaError::NotFound { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(VestaError::from(io_err).is_storage_unavailable());
    }
}
