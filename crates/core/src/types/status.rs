//! Sync status for script definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote sync state of a script definition.
///
/// `Synced` holds exactly when a remote script tag exists for the
/// definition. A failed push or remove parks the definition in
/// `SyncPending` until the next explicit user action re-attempts sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No remote script tag exists.
    #[default]
    Unsynced,
    /// A remote script tag exists and matches the local definition.
    Synced,
    /// The last push or remove failed; awaiting a manual retry.
    SyncPending,
}

/// Error returned when parsing an unknown sync status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sync status: {0}")]
pub struct SyncStatusParseError(pub String);

impl SyncStatus {
    /// The canonical string form, matching the serde representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unsynced => "unsynced",
            Self::Synced => "synced",
            Self::SyncPending => "sync_pending",
        }
    }
}

impl core::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SyncStatus {
    type Err = SyncStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsynced" => Ok(Self::Unsynced),
            "synced" => Ok(Self::Synced),
            "sync_pending" => Ok(Self::SyncPending),
            other => Err(SyncStatusParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_status_string_roundtrip() {
        for status in [
            SyncStatus::Unsynced,
            SyncStatus::Synced,
            SyncStatus::SyncPending,
        ] {
            let parsed: SyncStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_sync_status_default_is_unsynced() {
        assert_eq!(SyncStatus::default(), SyncStatus::Unsynced);
    }
}
