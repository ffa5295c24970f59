//! Seeded workload generation for concurrent tests.
//!
//! A workload is a stream of transactions, each a short list of reads and
//! writes over a fixed key space. The same seed always yields the same
//! stream, so a failing concurrent run can be replayed per worker.

use bytes::Bytes;
use mvkv_common::error::KvResult;
use mvkv_common::types::{IsolationLevel, Timestamp};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::utils::{key, TestStore};

/// A single operation inside a generated transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Read a key.
    Read(String),
    /// Write a value to a key.
    Write(String, Bytes),
}

/// Workload shape.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of distinct keys.
    pub key_count: usize,
    /// Operations per transaction.
    pub ops_per_txn: usize,
    /// Fraction of operations that are writes, in `0.0..=1.0`.
    pub write_ratio: f64,
    /// Length of generated values.
    pub value_size: usize,
    /// Base seed.
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            key_count: 64,
            ops_per_txn: 8,
            write_ratio: 0.5,
            value_size: 16,
            seed: 42,
        }
    }
}

/// Deterministic transaction generator.
#[derive(Debug)]
pub struct Workload {
    config: WorkloadConfig,
    rng: StdRng,
}

impl Workload {
    /// Creates a generator from the config's base seed.
    pub fn new(config: WorkloadConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// Creates a generator for one worker of a concurrent run.
    pub fn for_worker(config: WorkloadConfig, worker: u64) -> Self {
        let seed = config.seed ^ worker.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates the next transaction's operations.
    pub fn next_txn(&mut self) -> Vec<Op> {
        (0..self.config.ops_per_txn)
            .map(|_| {
                let key = self.random_key();
                if self.rng.gen_bool(self.config.write_ratio) {
                    Op::Write(key, self.random_value())
                } else {
                    Op::Read(key)
                }
            })
            .collect()
    }

    fn random_key(&mut self) -> String {
        key(self.rng.gen_range(0..self.config.key_count))
    }

    fn random_value(&mut self) -> Bytes {
        let s: String = (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(self.config.value_size)
            .map(char::from)
            .collect();
        Bytes::from(s)
    }
}

/// Runs `ops` as one transaction and commits it.
///
/// Every read is checked against the transaction's own earlier writes.
pub fn run_transaction(
    store: &TestStore,
    isolation: IsolationLevel,
    ops: Vec<Op>,
) -> KvResult<Timestamp> {
    let txn = store.begin_with_isolation(isolation)?;
    let mut own_writes = std::collections::HashMap::new();

    for op in ops {
        match op {
            Op::Read(key) => {
                let observed = store.read(Some(txn), key.as_str())?;
                if let Some(expected) = own_writes.get(&key) {
                    assert_eq!(observed.as_ref(), Some(expected), "read-your-writes on {key}");
                }
            }
            Op::Write(key, value) => {
                own_writes.insert(key.clone(), value.clone());
                store.write(txn, key, value)?;
            }
        }
    }

    store.commit(txn)
}
