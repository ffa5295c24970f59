//! Benchmark utilities and helpers.

use bytes::Bytes;
use mvkv_common::config::EngineConfig;
use mvkv_txn::Store;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Store type used by the transaction benchmarks.
pub type BenchStore = Store<String, Bytes>;

/// Generates random string data for benchmarks.
pub fn random_string(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates random values of `value_size` bytes.
pub fn generate_values(count: usize, value_size: usize) -> Vec<Bytes> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let value: Vec<u8> = (0..value_size).map(|_| rng.gen()).collect();
            Bytes::from(value)
        })
        .collect()
}

/// Generates sequential keys for benchmarks.
pub fn generate_sequential_keys(count: usize, prefix: &str) -> Vec<String> {
    (0..count).map(|i| format!("{}{:08}", prefix, i)).collect()
}

/// Generates random key indices in `0..key_count`.
pub fn generate_key_indices(count: usize, key_count: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count).map(|_| rng.gen_range(0..key_count)).collect()
}

/// Opens a store with background reclamation off, so passes only run when
/// a benchmark asks for them.
pub fn bench_store() -> BenchStore {
    Store::with_config(EngineConfig::for_testing()).expect("failed to open bench store")
}

/// Opens a store and commits one version of each key.
pub fn populated_store(keys: &[String], value_size: usize) -> BenchStore {
    let store = bench_store();
    let values = generate_values(keys.len(), value_size);
    let txn = store.begin().expect("begin failed");
    for (key, value) in keys.iter().zip(values) {
        store.write(txn, key.clone(), value).expect("write failed");
    }
    store.commit(txn).expect("commit failed");
    store
}
