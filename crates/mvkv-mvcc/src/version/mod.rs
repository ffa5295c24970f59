//! Version chain storage and management.
//!
//! This module stores every committed value of every key. Each key owns a
//! version chain: an append-only sequence of versions ordered by commit
//! timestamp, oldest first.
//!
//! # Version Chain Structure
//!
//! ```text
//! Key: "user:1"
//! ┌─────────────────────────────────────────────────────┐
//! │ [0] commit_ts: 3   value: "Initial Alice"   (oldest)│
//! │ [1] commit_ts: 7   value: "Alice"                   │
//! │ [2] commit_ts: 12  value: "Alice (updated)" (newest)│
//! └─────────────────────────────────────────────────────┘
//!
//! as_of(9)          -> [1]
//! trim_before(9)    -> removes [0]; [1] still answers as_of(9..12)
//! ```
//!
//! The store knows nothing about transactions. Only committed values are ever
//! appended; pending writes live in the writing transaction's buffer.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use mvkv_common::error::invariant_violation;
use mvkv_common::types::Timestamp;
use parking_lot::RwLock;

/// A single committed version of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version<V> {
    /// The committed value.
    pub value: V,
    /// Timestamp of the commit that produced this version.
    pub commit_ts: Timestamp,
}

impl<V> Version<V> {
    /// Creates a new version.
    pub fn new(value: V, commit_ts: Timestamp) -> Self {
        Self { value, commit_ts }
    }

    /// Checks if this version is visible to a snapshot taken at `ts`.
    #[inline]
    pub fn is_visible_at(&self, ts: Timestamp) -> bool {
        self.commit_ts <= ts
    }

    /// Consumes the version and returns its value.
    pub fn into_value(self) -> V {
        self.value
    }
}

/// A chain of versions for a single key.
#[derive(Debug)]
pub struct VersionChain<V> {
    /// All versions, oldest first.
    versions: RwLock<Vec<Version<V>>>,
}

impl<V: Clone> VersionChain<V> {
    /// Creates a new empty version chain.
    pub fn new() -> Self {
        Self {
            versions: RwLock::new(Vec::new()),
        }
    }

    /// Returns the number of versions in the chain.
    pub fn len(&self) -> usize {
        self.versions.read().len()
    }

    /// Returns true if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.versions.read().is_empty()
    }

    /// Appends a new newest version.
    ///
    /// Panics through `invariant_violation` if `commit_ts` is not strictly
    /// greater than the current newest version's timestamp.
    pub fn append(&self, value: V, commit_ts: Timestamp) {
        let mut versions = self.versions.write();
        if let Some(newest) = versions.last() {
            if commit_ts <= newest.commit_ts {
                invariant_violation(format!(
                    "version chain out of order: {commit_ts} appended after {}",
                    newest.commit_ts
                ));
            }
        }
        versions.push(Version::new(value, commit_ts));
    }

    /// Returns the newest version.
    pub fn latest(&self) -> Option<Version<V>> {
        self.versions.read().last().cloned()
    }

    /// Returns the newest version with `commit_ts <= ts`.
    pub fn as_of(&self, ts: Timestamp) -> Option<Version<V>> {
        let versions = self.versions.read();
        versions.iter().rev().find(|v| v.is_visible_at(ts)).cloned()
    }

    /// Removes versions no snapshot at or after `horizon` can observe.
    ///
    /// The newest version with `commit_ts <= horizon` and everything newer
    /// are kept, so `as_of(t)` answers identically for every `t >= horizon`.
    /// The newest version is never removed.
    ///
    /// Returns the number of versions removed.
    pub fn trim_before(&self, horizon: Timestamp) -> usize {
        let mut versions = self.versions.write();
        match versions.iter().rposition(|v| v.is_visible_at(horizon)) {
            Some(keep_from) if keep_from > 0 => {
                versions.drain(..keep_from);
                keep_from
            }
            _ => 0,
        }
    }

    /// Returns all versions, oldest first (for inspection/testing).
    pub fn versions(&self) -> Vec<Version<V>> {
        self.versions.read().clone()
    }
}

impl<V: Clone> Default for VersionChain<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of trimming every chain in a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimResult {
    /// Number of chains visited.
    pub keys_scanned: usize,
    /// Number of versions removed.
    pub versions_removed: usize,
}

/// A store for managing version chains.
///
/// Chains are created lazily on the first append to a key and are never
/// removed, since trimming always leaves the newest version in place.
pub struct VersionStore<K, V> {
    /// All version chains, indexed by key.
    chains: DashMap<K, Arc<VersionChain<V>>>,
}

impl<K, V> VersionStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a new empty version store.
    pub fn new() -> Self {
        Self {
            chains: DashMap::new(),
        }
    }

    /// Returns the number of keys in the store.
    pub fn key_count(&self) -> usize {
        self.chains.len()
    }

    /// Returns the total number of versions across all chains.
    pub fn version_count(&self) -> usize {
        self.chains.iter().map(|chain| chain.len()).sum()
    }

    /// Checks whether any version was ever committed for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.chains.contains_key(key)
    }

    /// Gets a version chain if it exists.
    pub fn get_chain<Q>(&self, key: &Q) -> Option<Arc<VersionChain<V>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.chains.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Appends a committed version to `key`'s chain, creating the chain if
    /// absent.
    pub fn append(&self, key: K, value: V, commit_ts: Timestamp) {
        let chain = Arc::clone(
            self.chains
                .entry(key)
                .or_insert_with(|| Arc::new(VersionChain::new()))
                .value(),
        );
        chain.append(value, commit_ts);
    }

    /// Returns the newest version of `key`.
    pub fn latest<Q>(&self, key: &Q) -> Option<Version<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_chain(key).and_then(|chain| chain.latest())
    }

    /// Returns the newest version of `key` with `commit_ts <= ts`.
    pub fn as_of<Q>(&self, key: &Q, ts: Timestamp) -> Option<Version<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_chain(key).and_then(|chain| chain.as_of(ts))
    }

    /// Trims a single key's chain. See [`VersionChain::trim_before`].
    pub fn trim_before<Q>(&self, key: &Q, horizon: Timestamp) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_chain(key)
            .map_or(0, |chain| chain.trim_before(horizon))
    }

    /// Trims every chain against `horizon`.
    pub fn trim_all(&self, horizon: Timestamp) -> TrimResult {
        let mut result = TrimResult::default();
        for chain in self.chains.iter() {
            result.keys_scanned += 1;
            result.versions_removed += chain.trim_before(horizon);
        }
        result
    }
}

impl<K, V> Default for VersionStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for VersionStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionStore")
            .field("key_count", &self.key_count())
            .field("version_count", &self.version_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn ts(value: u64) -> Timestamp {
        Timestamp::new(value)
    }

    fn chain_with(commits: &[(u64, &'static str)]) -> VersionChain<&'static str> {
        let chain = VersionChain::new();
        for &(commit_ts, value) in commits {
            chain.append(value, ts(commit_ts));
        }
        chain
    }

    #[test]
    fn test_version_visibility() {
        let version = Version::new(Bytes::from("data"), ts(100));

        // Visible at ts >= commit_ts
        assert!(version.is_visible_at(ts(100)));
        assert!(version.is_visible_at(ts(200)));

        // Not visible before commit_ts
        assert!(!version.is_visible_at(ts(50)));
    }

    #[test]
    fn test_version_chain_append_and_latest() {
        let chain = VersionChain::new();
        assert!(chain.is_empty());
        assert!(chain.latest().is_none());

        chain.append(Bytes::from("v1"), ts(100));
        chain.append(Bytes::from("v2"), ts(200));

        assert_eq!(chain.len(), 2);
        let latest = chain.latest().unwrap();
        assert_eq!(latest.commit_ts, ts(200));
        assert_eq!(latest.value.as_ref(), b"v2");
    }

    #[test]
    fn test_version_chain_as_of() {
        let chain = chain_with(&[(100, "v1"), (200, "v2"), (300, "v3")]);

        assert!(chain.as_of(ts(50)).is_none());
        assert_eq!(chain.as_of(ts(100)).unwrap().value, "v1");
        assert_eq!(chain.as_of(ts(150)).unwrap().value, "v1");
        assert_eq!(chain.as_of(ts(299)).unwrap().value, "v2");
        assert_eq!(chain.as_of(Timestamp::MAX).unwrap().value, "v3");
    }

    #[test]
    #[should_panic(expected = "version chain out of order")]
    fn test_version_chain_rejects_equal_timestamp() {
        let chain = chain_with(&[(100, "v1")]);
        chain.append("v2", ts(100));
    }

    #[test]
    #[should_panic(expected = "version chain out of order")]
    fn test_version_chain_rejects_older_timestamp() {
        let chain = chain_with(&[(100, "v1")]);
        chain.append("v0", ts(50));
    }

    #[test]
    fn test_trim_keeps_version_answering_horizon() {
        let chain = chain_with(&[(100, "v1"), (200, "v2"), (300, "v3")]);

        // Horizon between v2 and v3: v2 still answers as_of(250).
        let removed = chain.trim_before(ts(250));
        assert_eq!(removed, 1);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.as_of(ts(250)).unwrap().value, "v2");
        assert_eq!(chain.as_of(ts(300)).unwrap().value, "v3");
    }

    #[test]
    fn test_trim_exact_boundary() {
        let chain = chain_with(&[(100, "v1"), (200, "v2"), (300, "v3")]);

        let removed = chain.trim_before(ts(200));
        assert_eq!(removed, 1);
        assert_eq!(chain.versions()[0].commit_ts, ts(200));
    }

    #[test]
    fn test_trim_never_removes_newest() {
        let chain = chain_with(&[(100, "v1"), (200, "v2"), (300, "v3")]);

        let removed = chain.trim_before(Timestamp::MAX);
        assert_eq!(removed, 2);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.latest().unwrap().value, "v3");

        // Trimming again is a no-op.
        assert_eq!(chain.trim_before(Timestamp::MAX), 0);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_trim_below_oldest_is_noop() {
        let chain = chain_with(&[(100, "v1"), (200, "v2")]);

        assert_eq!(chain.trim_before(ts(50)), 0);
        assert_eq!(chain.trim_before(ts(100)), 0);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_trim_preserves_reads_at_or_after_horizon() {
        let chain = chain_with(&[(10, "a"), (20, "b"), (30, "c"), (40, "d")]);
        let horizon = ts(25);
        let before: Vec<_> = (25..=45).map(|t| chain.as_of(ts(t))).collect();

        chain.trim_before(horizon);

        let after: Vec<_> = (25..=45).map(|t| chain.as_of(ts(t))).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_version_store_lazy_chains() {
        let store: VersionStore<String, Bytes> = VersionStore::new();
        assert_eq!(store.key_count(), 0);
        assert!(!store.contains_key("key1"));
        assert!(store.latest("key1").is_none());

        store.append("key1".to_string(), Bytes::from("value1"), ts(1));

        assert_eq!(store.key_count(), 1);
        assert!(store.contains_key("key1"));
        assert_eq!(store.latest("key1").unwrap().value.as_ref(), b"value1");
        assert!(store.get_chain("key2").is_none());
    }

    #[test]
    fn test_version_store_as_of() {
        let store: VersionStore<String, &str> = VersionStore::new();
        store.append("x".to_string(), "A", ts(1));
        store.append("x".to_string(), "B", ts(3));
        store.append("y".to_string(), "C", ts(2));

        assert_eq!(store.as_of("x", ts(2)).unwrap().value, "A");
        assert_eq!(store.as_of("x", ts(3)).unwrap().value, "B");
        assert!(store.as_of("y", ts(1)).is_none());
        assert_eq!(store.version_count(), 3);
    }

    #[test]
    fn test_version_store_trim_all() {
        let store: VersionStore<String, u64> = VersionStore::new();
        for commit in 1..=5 {
            store.append("hot".to_string(), commit, ts(commit));
        }
        store.append("cold".to_string(), 0, ts(6));

        let result = store.trim_all(ts(4));
        assert_eq!(result.keys_scanned, 2);
        assert_eq!(result.versions_removed, 3);
        assert_eq!(store.get_chain("hot").unwrap().len(), 2);
        assert_eq!(store.get_chain("cold").unwrap().len(), 1);

        assert_eq!(store.trim_before("hot", Timestamp::MAX), 1);
        assert_eq!(store.trim_before("missing", Timestamp::MAX), 0);
        assert_eq!(store.version_count(), 2);
    }
}
