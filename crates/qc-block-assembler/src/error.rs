//! Error types for block assembly
//!
//! Record-level problems (malformed records, failed conservation checks) are
//! never errors: the record is dropped. Only collaborator failures, invalid
//! configuration and a bounded mining search that gives up reach the caller.

use thiserror::Error;

/// Result type alias for block assembly operations
pub type Result<T> = std::result::Result<T, AssemblyError>;

/// Errors that can occur during block assembly
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Transaction source could not supply records
    #[error("Transaction source error: {0}")]
    Source(String),

    /// Sink could not persist the assembled block
    #[error("Sink error: {0}")]
    Sink(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Nonce ceiling reached without a digest below the target
    #[error("Mining exhausted: no valid nonce after {attempts} attempts")]
    MiningExhausted {
        /// Number of nonces tried
        attempts: u64,
    },

    /// Search stopped through the cancellation flag
    #[error("Mining cancelled after {attempts} attempts")]
    MiningCancelled {
        /// Number of nonces tried before the flag was observed
        attempts: u64,
    },
}

impl AssemblyError {
    /// Check if error is recoverable (a retry may succeed)
    ///
    /// A retry carries a fresh timestamp, so the nonce space changes.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MiningExhausted { .. } | Self::MiningCancelled { .. }
        )
    }

    /// Check if error comes from an external collaborator
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Source(_) | Self::Sink(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverability() {
        assert!(AssemblyError::MiningExhausted { attempts: 10 }.is_recoverable());
        assert!(AssemblyError::MiningCancelled { attempts: 3 }.is_recoverable());
        assert!(!AssemblyError::InvalidConfig("bad".into()).is_recoverable());
        assert!(!AssemblyError::Sink("disk full".into()).is_recoverable());
    }

    #[test]
    fn test_collaborator_failures() {
        assert!(AssemblyError::Source("gone".into()).is_collaborator_failure());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(AssemblyError::from(io).is_collaborator_failure());
        assert!(!AssemblyError::MiningExhausted { attempts: 1 }.is_collaborator_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = AssemblyError::MiningExhausted { attempts: 42 };
        assert_eq!(
            err.to_string(),
            "Mining exhausted: no valid nonce after 42 attempts"
        );
    }
}
