//! # mvkv-mvcc
//!
//! Multi-version storage for mvkv.
//!
//! This crate implements:
//! - The commit clock that orders commits and publishes visibility
//! - Version chain management (append, as-of lookup, trimming)
//! - Version reclamation bounded by the oldest active snapshot
//!
//! It has no notion of transactions. The transaction manager in `mvkv-txn`
//! drives these types and supplies the reclamation horizon.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Commit clock
pub mod clock;

/// Version chain storage
pub mod version;

/// Horizon-based version reclamation
pub mod gc;

pub use clock::CommitClock;
pub use gc::{GarbageCollector, GcResult, GcStats, GcWorker, HorizonSource};
pub use version::{TrimResult, Version, VersionChain, VersionStore};
