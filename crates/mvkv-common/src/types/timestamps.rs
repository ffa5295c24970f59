//! Timestamp types for mvkv.
//!
//! All timestamps in the store live in one domain: the logical commit clock.
//! Snapshot boundaries, commit timestamps and the reclamation horizon are all
//! values of this single counter, so comparing any two of them is always
//! meaningful. Wall-clock time never enters visibility decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical commit timestamp.
///
/// Commit timestamps are strictly increasing across commits. `ZERO` is the
/// state of an empty store before the first commit: a snapshot taken at
/// `ZERO` sees nothing.
///
/// # Example
///
/// ```rust
/// use mvkv_common::types::Timestamp;
///
/// let ts = Timestamp::ZERO.next();
/// assert_eq!(ts.as_u64(), 1);
/// assert!(Timestamp::ZERO < ts);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Zero timestamp (before any commit).
    pub const ZERO: Self = Self(0);

    /// Maximum timestamp value.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a timestamp from a raw clock value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw clock value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the successor timestamp (saturating at `MAX`).
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this is the zero timestamp.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ts{}", self.0)
    }
}

impl From<u64> for Timestamp {
    #[inline]
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<Timestamp> for u64 {
    #[inline]
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
