use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Key-value text storage backing the freshness cache. No transactional
/// guarantees are expected.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cache storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache storage unavailable: {0}")]
    Unavailable(String),
    /// The slot exists but its contents are not text.
    #[error("cache slot '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.slots
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside `dir`. Writes go through a temporary file and
/// a rename so readers never observe a half-written slot.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let bytes = match fs::read(self.path_for(key)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                key: key.to_string(),
                reason: err.to_string(),
            })
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_round_trips_and_deletes() {
        let store = MemoryStore::new();
        assert!(store.get("slot").expect("get").is_none());

        store.put("slot", "first").expect("put");
        store.put("slot", "second").expect("put");
        assert_eq!(store.get("slot").expect("get").as_deref(), Some("second"));

        store.delete("slot").expect("delete");
        assert!(store.get("slot").expect("get").is_none());
    }

    #[test]
    fn file_store_creates_directory_and_replaces_slot() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("cache"));

        assert!(store.get("job-report-cache").expect("get").is_none());
        store.put("job-report-cache", "{}").expect("put");
        store.put("job-report-cache", "{\"v\":2}").expect("put");

        assert_eq!(
            store.get("job-report-cache").expect("get").as_deref(),
            Some("{\"v\":2}")
        );
        assert!(!store
            .path_for("job-report-cache")
            .with_extension("json.tmp")
            .exists());
    }

    #[test]
    fn file_store_delete_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        store.delete("missing").expect("deleting a missing slot succeeds");
        store.put("slot", "x").expect("put");
        store.delete("slot").expect("delete");
        assert!(store.get("slot").expect("get").is_none());
    }

    #[test]
    fn file_store_reports_non_utf8_slot_as_corrupt() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        fs::write(store.path_for("slot"), [0xff, 0xfe, 0x00, 0x80]).expect("seed bytes");

        assert!(matches!(store.get("slot"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let store = FileStore::new("/tmp/cache");
        assert_eq!(
            store.path_for("../widget cache"),
            PathBuf::from("/tmp/cache/.._widget_cache.json")
        );
    }
}
