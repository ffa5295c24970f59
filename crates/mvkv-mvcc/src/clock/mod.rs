//! Commit clock.
//!
//! The commit clock is a logical counter with two positions:
//!
//! ```text
//!        visible          allocated
//!           │                 │
//!  ... ─────●─────────────────●────▶
//!   installed and       handed out, versions
//!   readable            still being installed
//! ```
//!
//! - `allocate()` hands out the next commit timestamp.
//! - `publish(ts)` moves `visible` forward once every version stamped with
//!   `ts` is installed.
//! - `now()` returns `visible`. Readers and `begin` only ever use `now()`, so
//!   a timestamp whose versions are not fully installed is never observed.
//!
//! `allocate` and `publish` must both be called inside the commit critical
//! section, which serializes commits. `publish` checks that `visible` moves
//! strictly forward and treats anything else as a broken invariant.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use mvkv_common::error::invariant_violation;
use mvkv_common::types::Timestamp;

/// Logical clock for commit timestamps.
pub struct CommitClock {
    /// Last timestamp handed out by `allocate`.
    allocated: AtomicU64,
    /// Last timestamp whose versions are fully installed.
    visible: AtomicU64,
}

impl CommitClock {
    /// Creates a clock for an empty store.
    pub fn new() -> Self {
        Self::starting_at(Timestamp::ZERO)
    }

    /// Creates a clock whose first allocated timestamp follows `ts`.
    pub fn starting_at(ts: Timestamp) -> Self {
        Self {
            allocated: AtomicU64::new(ts.as_u64()),
            visible: AtomicU64::new(ts.as_u64()),
        }
    }

    /// Returns the latest fully visible commit timestamp.
    #[inline]
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.visible.load(AtomicOrdering::Acquire))
    }

    /// Returns the last timestamp handed out, visible or not.
    #[inline]
    pub fn last_allocated(&self) -> Timestamp {
        Timestamp::new(self.allocated.load(AtomicOrdering::Acquire))
    }

    /// Allocates the next commit timestamp.
    ///
    /// Must be called inside the commit critical section.
    pub fn allocate(&self) -> Timestamp {
        let prev = self.allocated.fetch_add(1, AtomicOrdering::AcqRel);
        if prev == u64::MAX {
            invariant_violation("commit clock exhausted");
        }
        Timestamp::new(prev + 1)
    }

    /// Makes every version stamped `ts` or earlier visible to readers.
    ///
    /// Must be called inside the commit critical section, after all versions
    /// for `ts` have been installed.
    pub fn publish(&self, ts: Timestamp) {
        let allocated = self.last_allocated();
        if ts > allocated {
            invariant_violation(format!(
                "publishing {ts} beyond last allocated {allocated}"
            ));
        }

        let prev = Timestamp::new(self.visible.swap(ts.as_u64(), AtomicOrdering::AcqRel));
        if ts <= prev {
            invariant_violation(format!(
                "non-monotonic commit timestamp: {ts} published after {prev}"
            ));
        }
    }
}

impl Default for CommitClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommitClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitClock")
            .field("visible", &self.now())
            .field("allocated", &self.last_allocated())
            .finish()
    }
}
