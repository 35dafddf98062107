//! Whole-document JSON persistence shared by the enrichment cache and the
//! shuffle bag.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read and deserialize `path`.
///
/// A missing, unreadable or malformed file yields `None`; persisted state is
/// never fatal to load.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        debug!("No persisted state at {}", path.display());
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read {}: {}; starting empty", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Corrupt state in {}: {}; starting empty", path.display(), e);
            None
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize `value` as pretty JSON and replace `path` atomically: the
/// document is written to a sibling temp file which is then renamed over the
/// target, so readers see either the old or the new document.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut doc = BTreeMap::new();
        doc.insert("a".to_string(), vec![1, 2, 3]);

        write_json_atomic(&path, &doc).unwrap();
        let loaded: BTreeMap<String, Vec<u32>> = load_json(&path).unwrap();
        assert_eq!(loaded, doc);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_missing_and_corrupt_files_load_as_none() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(load_json::<Vec<u32>>(&missing).is_none());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(load_json::<Vec<u32>>(&corrupt).is_none());
    }
}
