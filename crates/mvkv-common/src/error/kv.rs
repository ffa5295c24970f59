//! Store error types.
//!
//! Every caller-facing operation reports failure through `KvError`. Broken
//! internal invariants are not errors: they go through
//! [`invariant_violation`], which never returns.

use std::fmt;
use thiserror::Error;

use crate::types::{IsolationLevel, TxnId};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Operation not supported.
    NotSupported = 0x0002,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,

    // I/O errors (0x0100 - 0x01FF)
    /// General I/O error.
    Io = 0x0100,

    // Transaction errors (0x0300 - 0x03FF)
    /// Transaction ID was never issued.
    TransactionNotFound = 0x0304,
    /// Transaction already committed or rolled back.
    TransactionNotActive = 0x0305,

    // Configuration errors (0x0700 - 0x07FF)
    /// Configuration is invalid.
    InvalidConfig = 0x0700,
    /// Configuration could not be parsed.
    ConfigParse = 0x0701,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "I/O",
            0x03 => "Transaction",
            0x07 => "Config",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for mvkv.
///
/// Reading a key that has no visible version is not an error; reads return
/// `Ok(None)` in that case.
///
/// # Example
///
/// ```rust
/// use mvkv_common::error::{KvError, KvResult};
/// use mvkv_common::types::TxnId;
///
/// fn commit(txn_id: TxnId) -> KvResult<()> {
///     Err(KvError::UnknownTransaction { txn_id })
/// }
///
/// assert!(commit(TxnId::new(9)).unwrap_err().is_rejection());
/// ```
#[derive(Debug, Error)]
pub enum KvError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// The requested isolation level is not implemented.
    #[error("isolation level {level} is not supported")]
    UnsupportedIsolation {
        /// The requested level.
        level: IsolationLevel,
    },

    // ==========================================================================
    // Transaction Errors
    // ==========================================================================
    /// Transaction ID was never issued by this store.
    #[error("transaction {txn_id} not found")]
    UnknownTransaction {
        /// The unknown transaction.
        txn_id: TxnId,
    },

    /// Transaction was issued but has already committed or rolled back.
    #[error("transaction {txn_id} is not active")]
    TransactionNotActive {
        /// The finished transaction.
        txn_id: TxnId,
    },

    // ==========================================================================
    // I/O and Configuration Errors
    // ==========================================================================
    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Configuration could not be parsed.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// The underlying TOML error.
        #[from]
        source: toml::de::Error,
    },
}

impl KvError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::UnsupportedIsolation { .. } => ErrorCode::NotSupported,
            Self::UnknownTransaction { .. } => ErrorCode::TransactionNotFound,
            Self::TransactionNotActive { .. } => ErrorCode::TransactionNotActive,
            Self::Io { .. } => ErrorCode::Io,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::ConfigParse { .. } => ErrorCode::ConfigParse,
        }
    }

    /// Returns true if the operation was rejected because the transaction
    /// is unknown or no longer active.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownTransaction { .. } | Self::TransactionNotActive { .. }
        )
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Aborts the current operation after detecting a broken internal invariant.
///
/// Duplicate transaction IDs and non-monotonic commit timestamps can only
/// come from a concurrency-control bug, and continuing would silently
/// corrupt version chains.
#[cold]
#[track_caller]
pub fn invariant_violation(message: impl fmt::Display) -> ! {
    tracing::error!(%message, "internal invariant violated");
    panic!("internal invariant violated: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = KvError::UnknownTransaction {
            txn_id: TxnId::new(3),
        };
        assert_eq!(err.code(), ErrorCode::TransactionNotFound);
        assert_eq!(err.code().category(), "Transaction");

        let err = KvError::UnsupportedIsolation {
            level: IsolationLevel::Serializable,
        };
        assert_eq!(err.code(), ErrorCode::NotSupported);
        assert_eq!(err.code().category(), "General");
        assert_eq!(ErrorCode::InvalidConfig.category(), "Config");
    }

    #[test]
    fn test_error_display() {
        let err = KvError::TransactionNotActive {
            txn_id: TxnId::new(5),
        };
        assert_eq!(err.to_string(), "transaction 5 is not active");

        let err = KvError::UnsupportedIsolation {
            level: IsolationLevel::ReadUncommitted,
        };
        assert_eq!(
            err.to_string(),
            "isolation level READ UNCOMMITTED is not supported"
        );
    }

    #[test]
    fn test_rejections() {
        assert!(KvError::UnknownTransaction {
            txn_id: TxnId::new(1)
        }
        .is_rejection());
        assert!(KvError::TransactionNotActive {
            txn_id: TxnId::new(1)
        }
        .is_rejection());
        assert!(!KvError::invalid_config("bad").is_rejection());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: KvError = io.into();
        assert_eq!(err.code(), ErrorCode::Io);
    }

    #[test]
    #[should_panic(expected = "internal invariant violated")]
    fn test_invariant_violation_panics() {
        invariant_violation("duplicate id");
    }
}
