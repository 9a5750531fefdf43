use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use snapstate_common::{Error, Result};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::store::{StateStore, empty_snapshot, parse_snapshot, quarantine_suffix};

/// Snapshot kept as a pretty-printed JSON file.
///
/// Saves go through a temporary file in the same directory that is renamed
/// over the target, so a crash mid-write leaves the previous snapshot intact.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Value> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no snapshot at {}, starting empty", self.path.display());
                return Ok(empty_snapshot());
            }
            Err(e) => {
                return Err(Error::Store(format!(
                    "failed to read snapshot at {}: {e}",
                    self.path.display()
                )));
            }
        };
        info!("loading snapshot from {}", self.path.display());
        parse_snapshot(&raw, &self.path.display().to_string())
    }

    fn save(&self, state: &Value) -> Result<()> {
        let dir = self.dir();
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, state)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            Error::Store(format!(
                "failed to replace snapshot at {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        info!("saved snapshot to {}", self.path.display());
        Ok(())
    }

    fn quarantine(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "state".to_string());
        let target = self
            .dir()
            .join(format!("{file_name}.{}", quarantine_suffix()));

        std::fs::rename(&self.path, &target).map_err(|e| {
            Error::Store(format!(
                "failed to move {} aside: {e}",
                self.path.display()
            ))
        })?;
        warn!(
            "moved unrestorable snapshot {} to {}",
            self.path.display(),
            target.display()
        );
        Ok(Some(target.display().to_string()))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::FileStateStore;
    use crate::store::StateStore;
    use serde_json::json;
    use std::fs;

    #[test]
    fn load_returns_empty_object_when_file_missing() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = FileStateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().expect("load should succeed"), json!({}));
    }

    #[test]
    fn save_then_load_round_trips_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("nested").join("state.json");
        let store = FileStateStore::new(&path);
        let state = json!({"meta": {"version": "202007221420"}, "windows": {}});

        store.save(&state).expect("save should succeed");
        assert!(path.exists());
        assert_eq!(store.load().expect("load should succeed"), state);

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json")
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind");
    }

    #[test]
    fn load_fails_on_corrupt_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("state.json");
        fs::write(&path, "{\"windows\": {").expect("failed to write file");

        let store = FileStateStore::new(&path);
        assert!(store.load().is_err());
    }

    #[test]
    fn quarantine_moves_file_aside() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("state.json");
        fs::write(&path, "garbage").expect("failed to write file");

        let store = FileStateStore::new(&path);
        let moved = store
            .quarantine()
            .expect("quarantine should succeed")
            .expect("a file should have been moved");

        assert!(!path.exists());
        assert!(moved.contains("state.json.corrupt-"));
        assert_eq!(fs::read_to_string(&moved).unwrap(), "garbage");
        assert_eq!(store.quarantine().unwrap(), None);
    }
}
