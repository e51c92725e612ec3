use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::KeyValueStore;
use crate::error::Result;

/// JSON object on disk, one string value per key.
///
/// Every call re-reads the file so that a wipe performed by another process
/// (or by hand) is observed on the next lookup.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut values) => values.remove(key),
            Err(err) => {
                log::warn!("Failed to read {}: {}", self.path.display(), err);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut values = self.load().unwrap_or_else(|err| {
            log::warn!(
                "Discarding unreadable store {}: {}",
                self.path.display(),
                err
            );
            BTreeMap::new()
        });
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_a_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        FileStore::new(&path).set("session_id", "abc").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("session_id").as_deref(), Some("abc"));
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));

        assert_eq!(store.get("session_id"), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_is_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileStore::new(&path);

        assert_eq!(store.get("k"), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn set_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store.json"));
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        store.set("a", "3").unwrap();

        assert_eq!(store.get("a").as_deref(), Some("3"));
        assert_eq!(store.get("b").as_deref(), Some("2"));
    }
}
