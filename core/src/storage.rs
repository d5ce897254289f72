use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::DmError;
use crate::models::EntryLog;

/// Local dailymile cache layout: `<home>/.dailymile_cli/<username>/entries.json`.
pub fn entries_path(home: &Path, username: &str) -> PathBuf {
    home.join(".dailymile_cli")
        .join(username)
        .join("entries.json")
}

/// Load the cached entry log from disk (JSON). A missing or malformed file
/// is fatal to the run; decode errors carry the JSON path that failed.
pub fn load_entries(path: &Path) -> Result<EntryLog, DmError> {
    let contents = fs::read_to_string(path).map_err(|source| DmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut de = serde_json::Deserializer::from_str(&contents);
    let log: EntryLog =
        serde_path_to_error::deserialize(&mut de).map_err(|source| DmError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    info!("loaded {} entries from {}", log.entries.len(), path.display());
    Ok(log)
}
