//! Effectiveness log persistence
//!
//! The log is one JSON array read and written wholesale on every operation:
//! no indexing, no partial writes, no migrations. Create appends, update
//! replaces by id, delete filters by id. The file store writes a sibling
//! temp file and renames it over the log, so the old array stays intact
//! until the new one is complete.

use crate::effectiveness::types::{EffectivenessLogEntry, LogPatch};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Fixed storage key; the file store appends `.json`
pub const LOG_STORE_KEY: &str = "krishi_logs";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write log store {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize log entries: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid log entry: {0}")]
    Invalid(String),
    #[error("Log store lock poisoned")]
    Poisoned,
}

/// Persistence seam for effectiveness logs
pub trait LogStore: Send + Sync {
    /// Every entry in insertion order
    fn get_all(&self) -> Result<Vec<EffectivenessLogEntry>, StoreError>;

    /// Append an entry
    fn save(&self, entry: EffectivenessLogEntry) -> Result<(), StoreError>;

    /// Patch the entry with `id`; `None` when no such entry exists
    ///
    /// The patched entry is validated under the same lock before it is
    /// stored; a failing patch returns `StoreError::Invalid` and changes nothing.
    fn update(&self, id: &str, patch: &LogPatch) -> Result<Option<EffectivenessLogEntry>, StoreError>;

    /// Remove the entry with `id`; false when nothing was removed
    fn remove(&self, id: &str) -> Result<bool, StoreError>;
}

fn patch_in_place(
    entries: &mut [EffectivenessLogEntry],
    id: &str,
    patch: &LogPatch,
) -> Result<Option<EffectivenessLogEntry>, StoreError> {
    let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
        return Ok(None);
    };
    let candidate = patch.applied_to(entry);
    candidate.validate().map_err(StoreError::Invalid)?;
    *entry = candidate.clone();
    Ok(Some(candidate))
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    entries: Mutex<Vec<EffectivenessLogEntry>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<EffectivenessLogEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl LogStore for InMemoryLogStore {
    fn get_all(&self) -> Result<Vec<EffectivenessLogEntry>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.clone())
    }

    fn save(&self, entry: EffectivenessLogEntry) -> Result<(), StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)?.push(entry);
        Ok(())
    }

    fn update(&self, id: &str, patch: &LogPatch) -> Result<Option<EffectivenessLogEntry>, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        patch_in_place(&mut entries, id, patch)
    }

    fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() != before)
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Whole-file JSON array on disk
///
/// A missing, unreadable or corrupt file reads as an empty log.
#[derive(Debug)]
pub struct JsonFileLogStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<dir>/krishi_logs.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{}.json", LOG_STORE_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Vec<EffectivenessLogEntry> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read log store {:?}: {}", self.path, e);
                return Vec::new();
            }
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Corrupt log store {:?}, treating as empty: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Replace the log atomically: temp file in the same directory, then rename
    fn write(&self, entries: &[EffectivenessLogEntry]) -> Result<(), StoreError> {
        let json = serde_json::to_string(entries)?;
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|source| self.write_error(source))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|source| self.write_error(source))?;
        // On failure the temp file is removed when the error drops
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl LogStore for JsonFileLogStore {
    fn get_all(&self) -> Result<Vec<EffectivenessLogEntry>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read())
    }

    fn save(&self, entry: EffectivenessLogEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read();
        entries.push(entry);
        self.write(&entries)
    }

    fn update(&self, id: &str, patch: &LogPatch) -> Result<Option<EffectivenessLogEntry>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read();
        let updated = patch_in_place(&mut entries, id, patch)?;
        if updated.is_some() {
            self.write(&entries)?;
        }
        Ok(updated)
    }

    fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(&entries)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effectiveness::types::{MethodType, NewLogEntry};

    fn entry(id: &str) -> EffectivenessLogEntry {
        NewLogEntry {
            id: Some(id.to_string()),
            crop: "Rice".into(),
            pest: "Stem Borer".into(),
            ..Default::default()
        }
        .into_entry()
    }

    fn exercise(store: &dyn LogStore) {
        store.save(entry("a")).unwrap();
        store.save(entry("b")).unwrap();
        let ids: Vec<String> = store.get_all().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let patch = LogPatch {
            method_type: Some(MethodType::Chemical),
            ..Default::default()
        };
        let updated = store.update("b", &patch).unwrap().unwrap();
        assert_eq!(updated.method_type, MethodType::Chemical);
        assert!(store.update("missing", &patch).unwrap().is_none());

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        let remaining = store.get_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].method_type, MethodType::Chemical);
    }

    #[test]
    fn test_in_memory_store_crud() {
        exercise(&InMemoryLogStore::new());
    }

    #[test]
    fn test_file_store_crud_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLogStore::in_dir(dir.path());
        exercise(&store);

        // a fresh handle on the same file sees the same data
        let reopened = JsonFileLogStore::in_dir(dir.path());
        assert_eq!(reopened.get_all().unwrap().len(), 1);
        assert!(reopened.path().ends_with("krishi_logs.json"));
    }

    #[test]
    fn test_file_store_corrupt_json_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("krishi_logs.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileLogStore::new(&path);
        assert!(store.get_all().unwrap().is_empty());

        // the next write replaces the corrupt content
        store.save(entry("c")).unwrap();
        assert_eq!(store.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_rejects_invalid_patch_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let file_store = JsonFileLogStore::in_dir(dir.path());
        let memory_store = InMemoryLogStore::new();

        for store in [&file_store as &dyn LogStore, &memory_store] {
            store.save(entry("e")).unwrap();
            let patch = LogPatch {
                soil_health_score: Some(150.0),
                yield_after: Some(9.0),
                ..Default::default()
            };
            let err = store.update("e", &patch).unwrap_err();
            assert!(matches!(err, StoreError::Invalid(ref msg) if msg.contains("soilHealthScore")));

            let stored = &store.get_all().unwrap()[0];
            assert_eq!(stored.soil_health_score, 0.0);
            assert_eq!(stored.yield_after, 0.0);
        }
    }

    #[test]
    fn test_failed_write_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLogStore::in_dir(dir.path());
        store.save(entry("kept")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        // A non-empty directory in the way makes the final rename fail
        let blocked = JsonFileLogStore::new(dir.path().join("blocked"));
        fs::create_dir(blocked.path()).unwrap();
        fs::write(blocked.path().join("marker"), "x").unwrap();
        let err = blocked.save(entry("lost")).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(fs::read_to_string(blocked.path().join("marker")).unwrap(), "x");

        // No temp files left behind; the real log is untouched
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["blocked", "krishi_logs.json"]);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
        assert_eq!(store.get_all().unwrap()[0].id, "kept");
    }

    #[test]
    fn test_file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLogStore::new(dir.path().join("nested").join("logs.json"));
        assert!(store.get_all().unwrap().is_empty());
        store.save(entry("d")).unwrap();
        assert_eq!(store.get_all().unwrap()[0].id, "d");
    }
}
