//! Transaction manager for coordinating transaction lifecycle.
//!
//! This module provides the core transaction management functionality:
//! - Transaction lifecycle (begin, commit, rollback)
//! - Private write buffers with read-your-writes
//! - Read resolution through the transaction's [`ReadPolicy`]
//! - The reclamation horizon for the version store
//!
//! # Transaction States
//!
//! ```text
//! ┌───────┐    begin()    ┌────────┐
//! │ Start │──────────────▶│ Active │
//! └───────┘               └────────┘
//!                              │
//!                    ┌─────────┴───────┐
//!                    │                 │
//!               commit()          rollback()
//!                    │                 │
//!                    ▼                 ▼
//!             ┌───────────┐     ┌──────────┐
//!             │ Committed │     │ Aborted  │
//!             └───────────┘     └──────────┘
//! ```
//!
//! A transaction leaves the active table the moment it ends. Any later
//! operation on its id is rejected with `TransactionNotActive`.
//!
//! # Locking
//!
//! The active table is a `RwLock<HashMap<TxnId, Mutex<Transaction>>>`.
//!
//! - `read` and `write` take the table shared, then the transaction's mutex.
//! - `begin`, `commit` and `rollback` take the table exclusively.
//! - `commit` allocates its timestamp, installs every buffered write, publishes
//!   the timestamp and removes the transaction without releasing the table.
//!   Readers never observe a partial commit or a committed transaction that
//!   is still active.
//! - Ad-hoc reads take the table shared while they load the visible
//!   timestamp and look the key up.
//!
//! Lock order is table, transaction, version store shard, version chain.
//!
//! Reclamation trims shards and chains without the table lock. It reads its
//! horizon under the table lock, so a horizon is never newer than the visible
//! timestamp at that moment. Every read at "now" (ad hoc or read committed)
//! holds the table shared from loading the clock to finishing the lookup. No
//! commit can publish in between, so any horizon in use is at or below the
//! reader's timestamp and the version it needs survives the trim. Snapshot
//! reads are covered by the horizon itself.

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mvkv_common::config::EngineConfig;
use mvkv_common::constants::FIRST_TXN_ID;
use mvkv_common::error::{invariant_violation, KvError, KvResult};
use mvkv_common::types::{IsolationLevel, Timestamp, TxnId};
use mvkv_mvcc::{CommitClock, HorizonSource, Version, VersionStore};
use parking_lot::{Mutex, RwLock};

use crate::isolation::{policy_for, ReadPolicy};

/// The state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    Aborted,
}

impl TransactionState {
    /// Returns true if the transaction can perform operations.
    pub fn is_active(&self) -> bool {
        *self == TransactionState::Active
    }

    /// Returns true if the transaction has ended.
    pub fn is_ended(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Aborted
        )
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Active => write!(f, "Active"),
            TransactionState::Committed => write!(f, "Committed"),
            TransactionState::Aborted => write!(f, "Aborted"),
        }
    }
}

/// An active transaction: its snapshot boundary and private write buffer.
pub struct Transaction<K, V> {
    /// Unique transaction ID.
    id: TxnId,
    /// Current state.
    state: TransactionState,
    /// Commit clock value when the transaction began.
    start_ts: Timestamp,
    /// Read policy for the transaction's isolation level.
    policy: &'static dyn ReadPolicy,
    /// Pending writes, last write wins.
    writes: HashMap<K, V>,
    /// When the transaction started.
    started_at: Instant,
}

impl<K, V> Transaction<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new active transaction.
    pub fn new(id: TxnId, start_ts: Timestamp, policy: &'static dyn ReadPolicy) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            start_ts,
            policy,
            writes: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Returns the current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns the start timestamp.
    pub fn start_ts(&self) -> Timestamp {
        self.start_ts
    }

    /// Returns the isolation level.
    pub fn isolation(&self) -> IsolationLevel {
        self.policy.level()
    }

    /// Returns the read policy.
    pub fn policy(&self) -> &'static dyn ReadPolicy {
        self.policy
    }

    /// Returns the number of buffered writes.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Returns how long the transaction has been running.
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the buffered value for `key`, if any.
    pub fn pending<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.writes.get(key)
    }

    /// Buffers a write. Overwrites any earlier write to the same key.
    fn record_write(&mut self, key: K, value: V) {
        self.writes.insert(key, value);
    }

    /// Ends the transaction and hands back its write buffer.
    fn finish(&mut self, state: TransactionState) -> HashMap<K, V> {
        self.state = state;
        std::mem::take(&mut self.writes)
    }

    /// Captures a summary of the transaction.
    pub fn info(&self) -> TransactionInfo {
        TransactionInfo {
            id: self.id,
            state: self.state,
            isolation: self.isolation(),
            start_ts: self.start_ts,
            pending_writes: self.writes.len(),
            duration: self.duration(),
        }
    }
}

impl<K, V> fmt::Debug for Transaction<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("isolation", &self.policy.level())
            .field("start_ts", &self.start_ts)
            .field("writes", &self.writes.len())
            .finish()
    }
}

/// Point-in-time summary of an active transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    /// Transaction ID.
    pub id: TxnId,
    /// Lifecycle state.
    pub state: TransactionState,
    /// Isolation level.
    pub isolation: IsolationLevel,
    /// Snapshot boundary.
    pub start_ts: Timestamp,
    /// Number of buffered writes.
    pub pending_writes: usize,
    /// Time since `begin`.
    pub duration: Duration,
}

/// Configuration for the transaction manager.
#[derive(Debug, Clone)]
pub struct TransactionManagerConfig {
    /// Default isolation level for new transactions.
    pub default_isolation: IsolationLevel,
}

impl Default for TransactionManagerConfig {
    fn default() -> Self {
        Self {
            default_isolation: IsolationLevel::RepeatableRead,
        }
    }
}

impl From<&EngineConfig> for TransactionManagerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            default_isolation: config.default_isolation,
        }
    }
}

/// Statistics about the transaction manager.
#[derive(Debug, Default)]
pub struct TransactionStats {
    /// Total transactions started.
    pub started: AtomicU64,
    /// Total transactions committed.
    pub committed: AtomicU64,
    /// Total transactions rolled back.
    pub rolled_back: AtomicU64,
    /// Total operations rejected for an unknown or finished transaction.
    pub rejected: AtomicU64,
    /// Currently active transactions.
    pub active: AtomicU64,
}

impl TransactionStats {
    /// Creates new stats.
    pub fn new() -> Self {
        Self::default()
    }
}

/// The transaction manager coordinates all transaction operations.
pub struct TransactionManager<K, V> {
    /// Clock for commit timestamps.
    clock: Arc<CommitClock>,
    /// Committed versions.
    version_store: Arc<VersionStore<K, V>>,
    /// Active transactions.
    transactions: RwLock<HashMap<TxnId, Mutex<Transaction<K, V>>>>,
    /// Configuration.
    config: TransactionManagerConfig,
    /// Statistics.
    stats: TransactionStats,
    /// Next transaction ID.
    next_txn_id: AtomicU64,
}

impl<K, V> TransactionManager<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a new transaction manager.
    pub fn new(clock: Arc<CommitClock>, version_store: Arc<VersionStore<K, V>>) -> Self {
        Self::with_config(clock, version_store, TransactionManagerConfig::default())
    }

    /// Creates a transaction manager with custom configuration.
    pub fn with_config(
        clock: Arc<CommitClock>,
        version_store: Arc<VersionStore<K, V>>,
        config: TransactionManagerConfig,
    ) -> Self {
        Self {
            clock,
            version_store,
            transactions: RwLock::new(HashMap::new()),
            config,
            stats: TransactionStats::new(),
            next_txn_id: AtomicU64::new(FIRST_TXN_ID),
        }
    }

    /// Begins a new transaction with the default isolation level.
    pub fn begin(&self) -> KvResult<TxnId> {
        self.begin_with_isolation(self.config.default_isolation)
    }

    /// Begins a new transaction with a specific isolation level.
    ///
    /// # Errors
    ///
    /// `KvError::UnsupportedIsolation` for levels without a read policy.
    pub fn begin_with_isolation(&self, isolation: IsolationLevel) -> KvResult<TxnId> {
        let policy = policy_for(isolation)?;

        let (txn_id, start_ts) = {
            let mut txns = self.transactions.write();
            let txn_id = TxnId::new(self.next_txn_id.fetch_add(1, AtomicOrdering::SeqCst));
            // Read under the table lock so the horizon never passes a
            // snapshot that is about to be registered.
            let start_ts = self.clock.now();

            match txns.entry(txn_id) {
                Entry::Occupied(_) => {
                    invariant_violation(format!("duplicate transaction id {txn_id}"))
                }
                Entry::Vacant(slot) => {
                    slot.insert(Mutex::new(Transaction::new(txn_id, start_ts, policy)));
                }
            }
            (txn_id, start_ts)
        };

        self.stats.started.fetch_add(1, AtomicOrdering::Relaxed);
        self.stats.active.fetch_add(1, AtomicOrdering::Relaxed);

        tracing::debug!(
            txn_id = %txn_id,
            isolation = %isolation,
            start_ts = %start_ts,
            "transaction started"
        );

        Ok(txn_id)
    }

    /// Buffers a write. Nothing outside the transaction sees it before
    /// commit.
    pub fn write(&self, txn_id: TxnId, key: K, value: V) -> KvResult<()> {
        let txns = self.transactions.read();
        let txn_lock = txns.get(&txn_id).ok_or_else(|| self.rejection(txn_id))?;
        txn_lock.lock().record_write(key, value);
        Ok(())
    }

    /// Reads a key.
    ///
    /// With a transaction, the transaction's own pending write wins; otherwise
    /// the transaction's read policy picks the snapshot. With no transaction,
    /// this is [`read_latest`](Self::read_latest).
    ///
    /// Returns `Ok(None)` if no version is visible.
    pub fn read<Q>(&self, txn_id: Option<TxnId>, key: &Q) -> KvResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(txn_id) = txn_id else {
            return Ok(self.read_latest(key));
        };

        let txns = self.transactions.read();
        let txn_lock = txns.get(&txn_id).ok_or_else(|| self.rejection(txn_id))?;
        let txn = txn_lock.lock();

        if let Some(value) = txn.pending(key) {
            tracing::trace!(txn_id = %txn_id, "read own write");
            return Ok(Some(value.clone()));
        }

        let read_ts = txn.policy.read_ts(txn.start_ts, self.clock.now());
        let value = self
            .version_store
            .as_of(key, read_ts)
            .map(Version::into_value);

        tracing::trace!(
            txn_id = %txn_id,
            policy = txn.policy.name(),
            read_ts = %read_ts,
            found = value.is_some(),
            "read committed version"
        );

        Ok(value)
    }

    /// Reads the latest committed value outside any transaction.
    pub fn read_latest<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Holding the table keeps commits, and so newer horizons, out.
        let _txns = self.transactions.read();
        let now = self.clock.now();
        self.version_store.as_of(key, now).map(Version::into_value)
    }

    /// Commits a transaction and returns its commit timestamp.
    ///
    /// Every buffered write becomes visible at once. A transaction with no
    /// writes still consumes a timestamp.
    pub fn commit(&self, txn_id: TxnId) -> KvResult<Timestamp> {
        let (commit_ts, write_count) = {
            let mut txns = self.transactions.write();
            let txn_lock = txns
                .remove(&txn_id)
                .ok_or_else(|| self.rejection(txn_id))?;
            let mut txn = txn_lock.into_inner();
            let writes = txn.finish(TransactionState::Committed);
            let write_count = writes.len();

            let commit_ts = self.clock.allocate();
            for (key, value) in writes {
                self.version_store.append(key, value, commit_ts);
            }
            self.clock.publish(commit_ts);

            (commit_ts, write_count)
        };

        self.stats.committed.fetch_add(1, AtomicOrdering::Relaxed);
        self.stats.active.fetch_sub(1, AtomicOrdering::Relaxed);

        tracing::debug!(
            txn_id = %txn_id,
            commit_ts = %commit_ts,
            writes = write_count,
            "transaction committed"
        );

        Ok(commit_ts)
    }

    /// Rolls back a transaction, discarding its write buffer.
    pub fn rollback(&self, txn_id: TxnId) -> KvResult<()> {
        let discarded = {
            let mut txns = self.transactions.write();
            let txn_lock = txns
                .remove(&txn_id)
                .ok_or_else(|| self.rejection(txn_id))?;
            txn_lock.into_inner().finish(TransactionState::Aborted).len()
        };

        self.stats.rolled_back.fetch_add(1, AtomicOrdering::Relaxed);
        self.stats.active.fetch_sub(1, AtomicOrdering::Relaxed);

        tracing::debug!(txn_id = %txn_id, discarded, "transaction rolled back");

        Ok(())
    }

    /// Returns information about an active transaction.
    pub fn get_transaction(&self, txn_id: TxnId) -> Option<TransactionInfo> {
        let txns = self.transactions.read();
        txns.get(&txn_id).map(|t| t.lock().info())
    }

    /// Returns the number of active transactions.
    pub fn active_count(&self) -> usize {
        self.transactions.read().len()
    }

    /// Returns statistics.
    pub fn stats(&self) -> &TransactionStats {
        &self.stats
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TransactionManagerConfig {
        &self.config
    }

    /// Returns the version store.
    pub fn version_store(&self) -> &Arc<VersionStore<K, V>> {
        &self.version_store
    }

    /// Returns the clock.
    pub fn clock(&self) -> &Arc<CommitClock> {
        &self.clock
    }

    /// Classifies an id missing from the active table.
    fn rejection(&self, txn_id: TxnId) -> KvError {
        self.stats.rejected.fetch_add(1, AtomicOrdering::Relaxed);

        let issued =
            txn_id.is_valid() && txn_id.as_u64() < self.next_txn_id.load(AtomicOrdering::SeqCst);
        tracing::debug!(txn_id = %txn_id, issued, "rejected operation on inactive transaction");

        if issued {
            KvError::TransactionNotActive { txn_id }
        } else {
            KvError::UnknownTransaction { txn_id }
        }
    }
}

impl<K, V> HorizonSource for TransactionManager<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// Oldest start timestamp over active snapshot transactions, capped at
    /// the clock's visible timestamp.
    fn reclamation_horizon(&self) -> Timestamp {
        let txns = self.transactions.read();
        let now = self.clock.now();
        txns.values()
            .filter_map(|txn| {
                let txn = txn.lock();
                txn.policy.pins_snapshot().then_some(txn.start_ts)
            })
            .fold(now, Timestamp::min)
    }
}

impl<K, V> fmt::Debug for TransactionManager<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionManager")
            .field("active_count", &self.transactions.read().len())
            .field("clock", &self.clock)
            .finish()
    }
}
