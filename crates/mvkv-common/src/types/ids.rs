//! Core identifier types for mvkv.
//!
//! These types provide type-safe wrappers around numeric identifiers,
//! preventing accidental misuse of raw integers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier - uniquely identifies a transaction.
///
/// Transaction IDs are allocated from a monotonically increasing counter
/// owned by the transaction manager, so an ID is never reused for the
/// lifetime of a store. They are used to:
/// - Look up the active transaction and its write buffer
/// - Distinguish never-issued IDs from finished transactions
///
/// # Example
///
/// ```rust
/// use mvkv_common::types::TxnId;
///
/// let txn = TxnId::new(1);
/// assert!(txn.is_valid());
/// assert_eq!(txn.next(), TxnId::new(2));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TxnId(u64);

impl TxnId {
    /// Invalid transaction ID, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// Minimum valid transaction ID.
    pub const MIN: Self = Self(1);

    /// Creates a new `TxnId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next transaction ID.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this is a valid transaction ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Debug for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "TxnId(INVALID)")
        } else {
            write!(f, "TxnId({})", self.0)
        }
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TxnId {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<TxnId> for u64 {
    #[inline]
    fn from(id: TxnId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txn_id_validity() {
        assert!(!TxnId::INVALID.is_valid());
        assert!(TxnId::MIN.is_valid());
        assert_eq!(TxnId::INVALID.next(), TxnId::MIN);
    }

    #[test]
    fn test_txn_id_formatting() {
        assert_eq!(format!("{:?}", TxnId::INVALID), "TxnId(INVALID)");
        assert_eq!(format!("{:?}", TxnId::new(7)), "TxnId(7)");
        assert_eq!(TxnId::new(7).to_string(), "7");
    }

    #[test]
    fn test_txn_id_conversions() {
        let id: TxnId = 42u64.into();
        assert_eq!(id.as_u64(), 42);
        let raw: u64 = id.into();
        assert_eq!(raw, 42);
        assert_eq!(TxnId::new(u64::MAX).next(), TxnId::new(u64::MAX));
    }

    #[test]
    fn test_txn_id_ordering() {
        assert!(TxnId::new(1) < TxnId::new(2));
        assert!(TxnId::INVALID < TxnId::MIN);
    }
}
