//! # mvkv-txn
//!
//! Transactions for mvkv.
//!
//! This crate provides:
//!
//! - **Transaction Lifecycle**: Begin, read, write, commit and rollback with
//!   private write buffers and atomic commit visibility.
//!
//! - **Isolation Levels**: Read Committed and Repeatable Read (snapshot),
//!   expressed as stateless read policies.
//!
//! - **Store Facade**: A single `Store` that owns the clock, the version
//!   store, the transaction manager and background reclamation.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                           Store                                │
//! │                             │                                  │
//! │           ┌─────────────────┴──────────────────┐               │
//! │           ▼                                    ▼               │
//! │ ┌──────────────────────┐  horizon  ┌──────────────────────┐    │
//! │ │  TransactionManager  │◀──────────│   GarbageCollector   │    │
//! │ │    + ReadPolicy      │           │     (+ GcWorker)     │    │
//! │ └──────────────────────┘           └──────────────────────┘    │
//! │       │            │                          │                │
//! │       ▼            ▼                          │                │
//! │ ┌───────────┐ ┌─────────────────┐             │                │
//! │ │CommitClock│ │  VersionStore   │◀────────────┘                │
//! │ │ (MVCC)    │ │    (MVCC)       │   trim_all                   │
//! │ └───────────┘ └─────────────────┘                              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use mvkv_common::config::EngineConfig;
//! use mvkv_common::types::IsolationLevel;
//! use mvkv_txn::Store;
//!
//! let store: Store<&'static str, &'static str> =
//!     Store::with_config(EngineConfig::for_testing()).unwrap();
//!
//! let t1 = store.begin().unwrap();
//! store.write(t1, "x", "A").unwrap();
//! store.commit(t1).unwrap();
//!
//! // Snapshot taken before t3 commits.
//! let t2 = store.begin_with_isolation(IsolationLevel::RepeatableRead).unwrap();
//!
//! let t3 = store.begin().unwrap();
//! store.write(t3, "x", "B").unwrap();
//! store.commit(t3).unwrap();
//!
//! assert_eq!(store.read(Some(t2), &"x").unwrap(), Some("A"));
//! assert_eq!(store.read(None, &"x").unwrap(), Some("B"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Read policies.
///
/// This module provides:
/// - [`isolation::ReadPolicy`]: Chooses the snapshot a read observes
/// - [`isolation::ReadCommitted`] and [`isolation::SnapshotRead`]
pub mod isolation;

/// Transaction lifecycle management.
///
/// This module provides:
/// - [`manager::TransactionManager`]: Main coordinator for transactions
/// - [`manager::Transaction`]: Transaction state and write buffer
/// - [`manager::TransactionState`]: Transaction lifecycle states
pub mod manager;

/// Store facade.
pub mod engine;

// Re-export commonly used types

pub use engine::Store;

pub use isolation::{policy_for, ReadCommitted, ReadPolicy, SnapshotRead};

pub use manager::{
    Transaction, TransactionInfo, TransactionManager, TransactionManagerConfig, TransactionState,
    TransactionStats,
};
