//! # mvkv-test
//!
//! Integration tests for mvkv.
//!
//! This crate contains:
//! - Isolation tests for both read policies
//! - Concurrency tests for commit atomicity and timestamp ordering
//! - Reclamation safety tests
//! - Shared helpers and a seeded workload generator

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;

/// Workload generators
pub mod workload;
