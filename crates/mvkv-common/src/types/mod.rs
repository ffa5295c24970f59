//! Type definitions for mvkv.
//!
//! This module contains the core type definitions used across the store.

mod ids;
mod isolation;
mod timestamps;

pub use ids::TxnId;
pub use isolation::IsolationLevel;
pub use timestamps::Timestamp;
