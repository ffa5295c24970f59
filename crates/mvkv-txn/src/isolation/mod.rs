//! Read policies.
//!
//! A read policy decides which committed state a transactional read observes.
//! Policies are stateless: the manager hands them the transaction's start
//! timestamp and the current commit clock, and they pick the snapshot.
//!
//! | Level             | Policy           | Reads at     | Pins horizon |
//! |-------------------|------------------|--------------|--------------|
//! | `READ COMMITTED`  | [`ReadCommitted`]| now          | no           |
//! | `REPEATABLE READ` | [`SnapshotRead`] | `start_ts`   | yes          |
//!
//! Read-your-writes is not a policy concern. The manager answers from the
//! transaction's write buffer before consulting the policy, identically for
//! every level.

use std::fmt;

use mvkv_common::error::{KvError, KvResult};
use mvkv_common::types::{IsolationLevel, Timestamp};

/// Chooses the snapshot a transactional read observes.
pub trait ReadPolicy: Send + Sync + fmt::Debug {
    /// Returns a short policy name for logging.
    fn name(&self) -> &'static str;

    /// Returns the isolation level this policy implements.
    fn level(&self) -> IsolationLevel;

    /// Returns the timestamp to read committed versions at.
    fn read_ts(&self, start_ts: Timestamp, now: Timestamp) -> Timestamp;

    /// Returns true if an active transaction under this policy keeps the
    /// versions visible at its start timestamp alive.
    fn pins_snapshot(&self) -> bool;
}

/// Every read sees the latest committed state at the moment of the read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadCommitted;

impl ReadPolicy for ReadCommitted {
    fn name(&self) -> &'static str {
        "read_committed"
    }

    fn level(&self) -> IsolationLevel {
        IsolationLevel::ReadCommitted
    }

    fn read_ts(&self, _start_ts: Timestamp, now: Timestamp) -> Timestamp {
        now
    }

    fn pins_snapshot(&self) -> bool {
        false
    }
}

/// Every read sees the committed state as of the transaction's start.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotRead;

impl ReadPolicy for SnapshotRead {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn level(&self) -> IsolationLevel {
        IsolationLevel::RepeatableRead
    }

    fn read_ts(&self, start_ts: Timestamp, _now: Timestamp) -> Timestamp {
        start_ts
    }

    fn pins_snapshot(&self) -> bool {
        true
    }
}

static READ_COMMITTED: ReadCommitted = ReadCommitted;
static SNAPSHOT_READ: SnapshotRead = SnapshotRead;

/// Returns the policy implementing `level`.
///
/// # Errors
///
/// `KvError::UnsupportedIsolation` for levels the store does not implement.
pub fn policy_for(level: IsolationLevel) -> KvResult<&'static dyn ReadPolicy> {
    match level {
        IsolationLevel::ReadCommitted => Ok(&READ_COMMITTED),
        IsolationLevel::RepeatableRead => Ok(&SNAPSHOT_READ),
        IsolationLevel::ReadUncommitted | IsolationLevel::Serializable => {
            Err(KvError::UnsupportedIsolation { level })
        }
    }
}
