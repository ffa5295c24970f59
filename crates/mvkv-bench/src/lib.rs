//! mvkv Performance Benchmarks
//!
//! This crate contains benchmarks for the mvkv components:
//! - Version chains and the version store
//! - Transaction begin/read/write/commit under both read policies
//! - Reclamation passes
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p mvkv-bench
//! ```

pub mod utils;
