//! Shared helpers for integration tests.

use std::time::{Duration, Instant};

use bytes::Bytes;
use mvkv_common::config::EngineConfig;
use mvkv_common::types::{IsolationLevel, Timestamp};
use mvkv_txn::Store;
use tracing_subscriber::EnvFilter;

/// Store type used throughout the integration tests.
pub type TestStore = Store<String, Bytes>;

/// Installs a test-friendly subscriber once per process.
///
/// Output is off unless `RUST_LOG` asks for it, e.g.
/// `RUST_LOG=mvkv_txn=debug,mvkv_mvcc=debug`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Opens a store with background reclamation disabled.
pub fn test_store() -> TestStore {
    init_tracing();
    Store::with_config(EngineConfig::for_testing()).expect("failed to open test store")
}

/// Opens a store whose `begin()` uses `level`.
pub fn test_store_with(level: IsolationLevel) -> TestStore {
    init_tracing();
    Store::with_config(EngineConfig::for_testing().with_default_isolation(level))
        .expect("failed to open test store")
}

/// Opens a store with a background reclamation worker on a short interval.
pub fn reclaiming_store(interval_ms: u64) -> TestStore {
    init_tracing();
    let mut config = EngineConfig::default();
    config.reclamation.interval_ms = interval_ms;
    Store::with_config(config).expect("failed to open reclaiming store")
}

/// Formats the `i`-th test key.
pub fn key(i: usize) -> String {
    format!("key_{i:08}")
}

/// Wraps a string as a value.
pub fn value(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

/// Commits a single write in its own transaction.
pub fn commit_one(store: &TestStore, key: &str, val: &str) -> Timestamp {
    let txn = store.begin().expect("begin failed");
    store
        .write(txn, key.to_string(), value(val))
        .expect("write failed");
    store.commit(txn).expect("commit failed")
}

/// Polls `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}
