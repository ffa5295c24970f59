//! Configuration for mvkv.
//!
//! This module provides the configuration structures for the store.

mod engine;

pub use engine::{EngineConfig, ReclamationConfig};
