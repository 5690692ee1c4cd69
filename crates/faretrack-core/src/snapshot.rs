use std::fs;
use std::path::Path;

use crate::error::SnapshotError;
use crate::model::Snapshot;

/// Fallback output name when the caller supplies none. Repeated runs
/// overwrite it, so per-date collection should pass an explicit path.
pub const DEFAULT_SNAPSHOT_FILE: &str = "flights.json";

/// Writes the snapshot as pretty-printed UTF-8 JSON, creating or overwriting
/// the file. Non-ASCII text (airline and airport names in the provider's
/// locale) is written as-is, not escaped.
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let contents = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })
}
