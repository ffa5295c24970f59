//! Horizon-based version reclamation.
//!
//! Version chains only grow on commit, so something has to trim them. The
//! collector asks a [`HorizonSource`] for the oldest timestamp any active
//! reader may still query, then trims every chain against it.
//!
//! # Horizon
//!
//! ```text
//!   chain:   v@3 ── v@7 ── v@12 ── v@15
//!                    ▲
//!   horizon = 9 ─────┘   v@7 answers as_of(9..12), so only v@3 goes
//! ```
//!
//! The transaction manager computes the horizon as the minimum start
//! timestamp over active snapshot transactions, capped at the current commit
//! clock. Read-committed transactions read at "now" and never pin it.
//!
//! # Key Components
//!
//! - [`HorizonSource`]: Supplies the reclamation horizon
//! - [`GarbageCollector`]: Runs one reclamation pass over a version store
//! - [`GcWorker`]: Background thread that runs passes on an interval

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mvkv_common::constants::GC_THREAD_NAME;
use mvkv_common::error::KvResult;
use mvkv_common::types::Timestamp;
use parking_lot::{Condvar, Mutex};

use crate::clock::CommitClock;
use crate::version::VersionStore;

/// Supplies the oldest timestamp any active reader may still query.
///
/// Every version needed to answer `as_of(t)` for `t >= horizon` must survive
/// a reclamation pass at that horizon.
pub trait HorizonSource: Send + Sync {
    /// Returns the current reclamation horizon.
    fn reclamation_horizon(&self) -> Timestamp;
}

/// With no snapshots pinned, every reader reads at the clock's `now`.
impl HorizonSource for CommitClock {
    fn reclamation_horizon(&self) -> Timestamp {
        self.now()
    }
}

/// Statistics about reclamation.
#[derive(Debug, Default)]
pub struct GcStats {
    /// Total number of passes.
    pub runs: AtomicU64,
    /// Total versions reclaimed.
    pub versions_reclaimed: AtomicU64,
    /// Horizon used by the most recent pass.
    pub last_horizon: AtomicU64,
}

impl GcStats {
    /// Creates new stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reclamation pass.
    pub fn record_run(&self, horizon: Timestamp, versions: usize) {
        self.runs.fetch_add(1, AtomicOrdering::Relaxed);
        self.versions_reclaimed
            .fetch_add(versions as u64, AtomicOrdering::Relaxed);
        self.last_horizon
            .store(horizon.as_u64(), AtomicOrdering::Relaxed);
    }

    /// Returns the total number of passes.
    pub fn total_runs(&self) -> u64 {
        self.runs.load(AtomicOrdering::Relaxed)
    }

    /// Returns the total versions reclaimed.
    pub fn total_versions_reclaimed(&self) -> u64 {
        self.versions_reclaimed.load(AtomicOrdering::Relaxed)
    }

    /// Returns the horizon of the most recent pass.
    pub fn last_horizon(&self) -> Timestamp {
        Timestamp::new(self.last_horizon.load(AtomicOrdering::Relaxed))
    }
}

/// Result of a reclamation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcResult {
    /// Horizon the pass trimmed against.
    pub horizon: Timestamp,
    /// Number of chains visited.
    pub keys_scanned: usize,
    /// Number of versions removed.
    pub versions_reclaimed: usize,
}

impl GcResult {
    /// Returns true if any version was removed.
    pub fn did_work(&self) -> bool {
        self.versions_reclaimed > 0
    }
}

/// Reclaims versions that no active reader can observe.
pub struct GarbageCollector<K, V> {
    /// Source of the reclamation horizon.
    horizon: Arc<dyn HorizonSource>,
    /// Version store to collect from.
    version_store: Arc<VersionStore<K, V>>,
    /// Statistics.
    stats: GcStats,
}

impl<K, V> GarbageCollector<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a new garbage collector.
    pub fn new(horizon: Arc<dyn HorizonSource>, version_store: Arc<VersionStore<K, V>>) -> Self {
        Self {
            horizon,
            version_store,
            stats: GcStats::new(),
        }
    }

    /// Runs one pass at the horizon reported by the horizon source.
    pub fn collect(&self) -> GcResult {
        let horizon = self.horizon.reclamation_horizon();
        self.collect_at(horizon)
    }

    /// Runs one pass at an explicit horizon.
    ///
    /// The caller is responsible for the horizon being safe.
    pub fn collect_at(&self, horizon: Timestamp) -> GcResult {
        let trimmed = self.version_store.trim_all(horizon);
        self.stats.record_run(horizon, trimmed.versions_removed);

        tracing::debug!(
            horizon = %horizon,
            keys_scanned = trimmed.keys_scanned,
            versions_reclaimed = trimmed.versions_removed,
            "reclamation pass complete"
        );

        GcResult {
            horizon,
            keys_scanned: trimmed.keys_scanned,
            versions_reclaimed: trimmed.versions_removed,
        }
    }

    /// Returns reclamation statistics.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// Returns the version store being collected.
    pub fn version_store(&self) -> &Arc<VersionStore<K, V>> {
        &self.version_store
    }
}

impl<K, V> fmt::Debug for GarbageCollector<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GarbageCollector")
            .field("total_runs", &self.stats.total_runs())
            .field("total_reclaimed", &self.stats.total_versions_reclaimed())
            .field("last_horizon", &self.stats.last_horizon())
            .finish()
    }
}

/// Shutdown flag shared with the worker thread.
type StopSignal = Arc<(Mutex<bool>, Condvar)>;

/// Background thread that runs reclamation passes on an interval.
///
/// Dropping the worker stops it and joins the thread.
pub struct GcWorker {
    signal: StopSignal,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl GcWorker {
    /// Spawns a worker that calls `collector.collect()` every `interval`.
    pub fn spawn<K, V>(collector: Arc<GarbageCollector<K, V>>, interval: Duration) -> KvResult<Self>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let signal: StopSignal = Arc::new((Mutex::new(false), Condvar::new()));
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name(GC_THREAD_NAME.to_string())
            .spawn(move || run_worker(&collector, &thread_signal, interval))?;

        tracing::debug!(interval_ms = interval.as_millis() as u64, "reclamation worker started");

        Ok(Self {
            signal,
            interval,
            handle: Some(handle),
        })
    }

    /// Returns the pass interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true until the worker has been stopped.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the worker and waits for the thread to exit.
    ///
    /// Calling `stop` more than once is a no-op.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        {
            let (lock, cvar) = &*self.signal;
            *lock.lock() = true;
            cvar.notify_all();
        }

        if handle.join().is_err() {
            tracing::error!("reclamation worker panicked");
        } else {
            tracing::debug!("reclamation worker stopped");
        }
    }
}

impl Drop for GcWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for GcWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcWorker")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

fn run_worker<K, V>(collector: &GarbageCollector<K, V>, signal: &StopSignal, interval: Duration)
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let (lock, cvar) = &**signal;
    loop {
        {
            let mut stopped = lock.lock();
            if !*stopped {
                cvar.wait_for(&mut stopped, interval);
            }
            if *stopped {
                return;
            }
        }
        collector.collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct FixedHorizon(Timestamp);

    impl HorizonSource for FixedHorizon {
        fn reclamation_horizon(&self) -> Timestamp {
            self.0
        }
    }

    fn ts(value: u64) -> Timestamp {
        Timestamp::new(value)
    }

    fn populated_store() -> Arc<VersionStore<String, u64>> {
        let store = Arc::new(VersionStore::new());
        for commit in 1..=4 {
            store.append("a".to_string(), commit, ts(commit));
        }
        store.append("b".to_string(), 10, ts(5));
        store
    }

    #[test]
    fn test_collect_uses_horizon_source() {
        let store = populated_store();
        let gc = GarbageCollector::new(Arc::new(FixedHorizon(ts(2))), Arc::clone(&store));

        let result = gc.collect();
        assert_eq!(result.horizon, ts(2));
        assert_eq!(result.keys_scanned, 2);
        assert_eq!(result.versions_reclaimed, 1);
        assert!(result.did_work());

        // Versions at or above the horizon still answer.
        assert_eq!(store.as_of("a", ts(2)).unwrap().value, 2);
        assert_eq!(store.as_of("a", ts(3)).unwrap().value, 3);
    }

    #[test]
    fn test_collect_at_max_keeps_newest() {
        let store = populated_store();
        let gc = GarbageCollector::new(Arc::new(FixedHorizon(ts(0))), Arc::clone(&store));

        let result = gc.collect_at(Timestamp::MAX);
        assert_eq!(result.versions_reclaimed, 3);
        assert_eq!(store.version_count(), 2);
        assert_eq!(store.latest("a").unwrap().value, 4);
        assert_eq!(store.latest("b").unwrap().value, 10);

        let again = gc.collect_at(Timestamp::MAX);
        assert!(!again.did_work());
    }

    #[test]
    fn test_clock_as_horizon_source() {
        let store = populated_store();
        let clock = Arc::new(CommitClock::starting_at(ts(3)));
        let gc = GarbageCollector::new(clock, Arc::clone(&store));

        let result = gc.collect();
        assert_eq!(result.horizon, ts(3));
        assert_eq!(result.versions_reclaimed, 2);
    }

    #[test]
    fn test_gc_stats() {
        let stats = GcStats::new();

        assert_eq!(stats.total_runs(), 0);
        assert_eq!(stats.total_versions_reclaimed(), 0);

        stats.record_run(ts(7), 10);
        assert_eq!(stats.total_runs(), 1);
        assert_eq!(stats.total_versions_reclaimed(), 10);
        assert_eq!(stats.last_horizon(), ts(7));

        stats.record_run(ts(9), 5);
        assert_eq!(stats.total_runs(), 2);
        assert_eq!(stats.total_versions_reclaimed(), 15);
        assert_eq!(stats.last_horizon(), ts(9));
    }

    #[test]
    fn test_gc_result() {
        let no_work = GcResult {
            horizon: ts(4),
            keys_scanned: 3,
            versions_reclaimed: 0,
        };
        assert!(!no_work.did_work());

        let did_work = GcResult {
            versions_reclaimed: 5,
            ..no_work
        };
        assert!(did_work.did_work());
    }

    #[test]
    fn test_worker_runs_passes() {
        let store = populated_store();
        let gc = Arc::new(GarbageCollector::new(
            Arc::new(FixedHorizon(Timestamp::MAX)),
            Arc::clone(&store),
        ));

        let mut worker = GcWorker::spawn(Arc::clone(&gc), Duration::from_millis(5)).unwrap();
        assert!(worker.is_running());

        let deadline = Instant::now() + Duration::from_secs(5);
        while gc.stats().total_runs() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        worker.stop();
        assert!(!worker.is_running());
        assert!(gc.stats().total_runs() > 0);
        assert_eq!(store.version_count(), 2);
    }

    #[test]
    fn test_worker_stops_promptly() {
        let store = populated_store();
        let gc = Arc::new(GarbageCollector::new(
            Arc::new(FixedHorizon(ts(0))),
            store,
        ));

        // An hour-long interval must not delay shutdown.
        let worker = GcWorker::spawn(Arc::clone(&gc), Duration::from_secs(3600)).unwrap();
        let started = Instant::now();
        drop(worker);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(gc.stats().total_runs(), 0);
    }
}
