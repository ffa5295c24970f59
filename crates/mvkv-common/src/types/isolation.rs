//! Isolation level selector.
//!
//! The selector names all four ANSI levels so that a driver can pass through
//! whatever level it was asked for. Only two of them are implemented by the
//! store; the others are rejected with `KvError::UnsupportedIsolation` at
//! `begin` and during config validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KvError;

/// Isolation level requested for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Dirty reads. Not implemented.
    ReadUncommitted,
    /// Every read sees the latest committed state at the moment of the read.
    ReadCommitted,
    /// Every read sees the state as of the transaction's start (snapshot).
    #[default]
    #[serde(alias = "snapshot")]
    RepeatableRead,
    /// Full serializability. Not implemented.
    Serializable,
}

impl IsolationLevel {
    /// All selectable levels, in ANSI order.
    pub const ALL: [Self; 4] = [
        Self::ReadUncommitted,
        Self::ReadCommitted,
        Self::RepeatableRead,
        Self::Serializable,
    ];

    /// Returns true if the store implements this level.
    #[inline]
    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::ReadCommitted | Self::RepeatableRead)
    }

    /// Returns true if an active transaction at this level pins the
    /// reclamation horizon at its start timestamp.
    #[inline]
    #[must_use]
    pub const fn pins_snapshot(self) -> bool {
        matches!(self, Self::RepeatableRead)
    }

    /// Returns the SQL spelling of the level.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for IsolationLevel {
    type Err = KvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "read uncommitted" => Ok(Self::ReadUncommitted),
            "read committed" => Ok(Self::ReadCommitted),
            "repeatable read" | "snapshot" => Ok(Self::RepeatableRead),
            "serializable" => Ok(Self::Serializable),
            _ => Err(KvError::InvalidArgument {
                message: format!("unknown isolation level '{s}'"),
            }),
        }
    }
}
