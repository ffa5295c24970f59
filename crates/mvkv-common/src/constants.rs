//! System-wide constants for mvkv.

// =============================================================================
// Reclamation Constants
// =============================================================================

/// Default interval between background reclamation passes (100 ms).
pub const DEFAULT_GC_INTERVAL_MS: u64 = 100;

/// Name given to the background reclamation thread.
pub const GC_THREAD_NAME: &str = "mvkv-gc";

// =============================================================================
// Transaction Constants
// =============================================================================

/// First transaction ID handed out by a fresh store.
pub const FIRST_TXN_ID: u64 = 1;
