//! Store facade.
//!
//! `Store` is the top-level entry point for mvkv. It wires the commit clock,
//! version store, transaction manager and reclamation together and provides
//! the unified transactional API.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use mvkv_common::config::EngineConfig;
use mvkv_common::error::KvResult;
use mvkv_common::types::{IsolationLevel, Timestamp, TxnId};
use mvkv_mvcc::{CommitClock, GarbageCollector, GcResult, GcWorker, HorizonSource, VersionStore};
use parking_lot::Mutex;

use crate::manager::{TransactionManager, TransactionManagerConfig};

/// An in-memory multi-version key-value store.
///
/// # Example
///
/// ```rust
/// use mvkv_common::config::EngineConfig;
/// use mvkv_common::types::IsolationLevel;
/// use mvkv_txn::Store;
///
/// let store: Store<String, u64> = Store::with_config(EngineConfig::for_testing()).unwrap();
///
/// let writer = store.begin().unwrap();
/// store.write(writer, "balance".to_string(), 100).unwrap();
/// store.commit(writer).unwrap();
///
/// let reader = store.begin_with_isolation(IsolationLevel::ReadCommitted).unwrap();
/// assert_eq!(store.read(Some(reader), "balance").unwrap(), Some(100));
/// store.rollback(reader).unwrap();
/// ```
pub struct Store<K, V> {
    /// Configuration.
    config: EngineConfig,
    /// Transaction manager.
    manager: Arc<TransactionManager<K, V>>,
    /// Version reclamation.
    collector: Arc<GarbageCollector<K, V>>,
    /// Background reclamation (if enabled).
    worker: Mutex<Option<GcWorker>>,
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Opens a store with the default configuration.
    pub fn new() -> KvResult<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Opens a store with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate or the reclamation
    /// thread cannot be spawned.
    pub fn with_config(config: EngineConfig) -> KvResult<Self> {
        config.validate()?;

        let clock = Arc::new(CommitClock::new());
        let version_store = Arc::new(VersionStore::new());
        let manager = Arc::new(TransactionManager::with_config(
            clock,
            Arc::clone(&version_store),
            TransactionManagerConfig::from(&config),
        ));

        let horizon: Arc<dyn HorizonSource> = manager.clone();
        let collector = Arc::new(GarbageCollector::new(horizon, version_store));

        let worker = if config.reclamation.enabled {
            Some(GcWorker::spawn(
                Arc::clone(&collector),
                config.reclamation.interval(),
            )?)
        } else {
            None
        };

        tracing::info!(
            default_isolation = %config.default_isolation,
            reclamation = config.reclamation.enabled,
            interval_ms = config.reclamation.interval_ms,
            "store opened"
        );

        Ok(Self {
            config,
            manager,
            collector,
            worker: Mutex::new(worker),
        })
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Begins a transaction at the configured default isolation level.
    pub fn begin(&self) -> KvResult<TxnId> {
        self.manager.begin()
    }

    /// Begins a transaction at a specific isolation level.
    pub fn begin_with_isolation(&self, isolation: IsolationLevel) -> KvResult<TxnId> {
        self.manager.begin_with_isolation(isolation)
    }

    /// Reads a key inside a transaction, or ad hoc when `txn_id` is `None`.
    pub fn read<Q>(&self, txn_id: Option<TxnId>, key: &Q) -> KvResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.manager.read(txn_id, key)
    }

    /// Reads the latest committed value outside any transaction.
    pub fn read_latest<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.manager.read_latest(key)
    }

    /// Buffers a write in a transaction.
    pub fn write(&self, txn_id: TxnId, key: K, value: V) -> KvResult<()> {
        self.manager.write(txn_id, key, value)
    }

    /// Commits a transaction and returns its commit timestamp.
    pub fn commit(&self, txn_id: TxnId) -> KvResult<Timestamp> {
        self.manager.commit(txn_id)
    }

    /// Rolls back a transaction.
    pub fn rollback(&self, txn_id: TxnId) -> KvResult<()> {
        self.manager.rollback(txn_id)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Runs one reclamation pass now.
    pub fn reclaim(&self) -> GcResult {
        self.collector.collect()
    }

    /// Stops background reclamation. The store stays usable.
    pub fn shutdown(&self) {
        if let Some(mut worker) = self.worker.lock().take() {
            worker.stop();
            tracing::info!("store shut down");
        }
    }

    /// Returns true while the background reclamation worker runs.
    pub fn is_reclaiming(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Returns the transaction manager.
    pub fn manager(&self) -> &Arc<TransactionManager<K, V>> {
        &self.manager
    }

    /// Returns the garbage collector.
    pub fn collector(&self) -> &Arc<GarbageCollector<K, V>> {
        &self.collector
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<K, V> Drop for Store<K, V> {
    fn drop(&mut self) {
        if let Some(mut worker) = self.worker.get_mut().take() {
            worker.stop();
        }
    }
}

impl<K, V> fmt::Debug for Store<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("manager", &self.manager)
            .field("collector", &self.collector)
            .finish()
    }
}
