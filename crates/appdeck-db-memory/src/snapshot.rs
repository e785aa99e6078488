//! JSON snapshots of the in-memory store.

use std::path::Path;

use appdeck_storage::{StorageError, StoredEntity};
use serde::{Deserialize, Serialize};

/// Every row of the store plus the version counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub next_version: u64,
    pub entities: Vec<StoredEntity>,
}

impl Snapshot {
    /// Reads a snapshot file. A missing file yields an empty snapshot.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StorageError::internal(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            StorageError::internal(format!("invalid snapshot {}: {e}", path.display()))
        })
    }

    /// Writes the snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StorageError::internal(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| {
            StorageError::internal(format!("failed to write {}: {e}", path.display()))
        })
    }
}
