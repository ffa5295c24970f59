//! # mvkv-common
//!
//! Common types, errors, and configuration for mvkv.
//!
//! This crate provides the foundational types shared by every mvkv crate:
//!
//! - **Types**: Transaction identifiers (`TxnId`), logical commit
//!   timestamps (`Timestamp`) and the `IsolationLevel` selector
//! - **Errors**: Unified error handling with `KvError`
//! - **Config**: Engine configuration loaded from TOML
//! - **Constants**: System-wide defaults
//!
//! ## Example
//!
//! ```rust
//! use mvkv_common::types::{IsolationLevel, Timestamp, TxnId};
//! use mvkv_common::error::KvResult;
//!
//! fn example() -> KvResult<()> {
//!     let txn_id = TxnId::new(1);
//!     let ts = Timestamp::ZERO.next();
//!     let level: IsolationLevel = "REPEATABLE READ".parse()?;
//!     assert!(txn_id.is_valid());
//!     assert!(level.is_supported());
//!     assert_eq!(ts.as_u64(), 1);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use error::{invariant_violation, ErrorCode, KvError, KvResult};
pub use types::{IsolationLevel, Timestamp, TxnId};
