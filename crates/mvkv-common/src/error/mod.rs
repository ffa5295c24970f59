//! Error handling for mvkv.
//!
//! This module provides a unified error type and result alias used
//! across all mvkv components.

mod kv;

pub use kv::{invariant_violation, ErrorCode, KvError};

/// Result type alias for mvkv operations.
pub type KvResult<T> = std::result::Result<T, KvError>;
