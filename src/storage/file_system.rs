use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use super::KeyValueStore;
use crate::error::StorageError;

const SESSION_FILE: &str = "session.json";

/// Key/value store backed by a single JSON document on disk
///
/// The document is rewritten on every mutation. A mutation whose write
/// fails leaves the in-memory view unchanged.
pub struct FileStore {
    base_path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store in the default base directory ("./dotvest-data")
    pub fn new() -> Result<Self, StorageError> {
        Self::new_with_base_dir(PathBuf::from("./dotvest-data"))
    }

    /// Open the store in a custom base directory, loading any existing document
    pub fn new_with_base_dir(base_path: PathBuf) -> Result<Self, StorageError> {
        let path = base_path.join(SESSION_FILE);
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        log::debug!("Opened session store at {:?} ({} keys)", path, entries.len());

        Ok(Self {
            base_path,
            entries: Mutex::new(entries),
        })
    }

    /// Get the base directory path
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(self.base_path.join(SESSION_FILE), json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new_with_base_dir(temp_dir.path().to_path_buf()).unwrap();
        store.set("dotvest_selected_account", "5Grw").unwrap();
        store.set("dotvest_wallet_connected", "true").unwrap();
        store.remove("dotvest_wallet_connected").unwrap();

        let reopened = FileStore::new_with_base_dir(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get("dotvest_selected_account").unwrap().as_deref(),
            Some("5Grw")
        );
        assert_eq!(reopened.get("dotvest_wallet_connected").unwrap(), None);
    }

    #[test]
    fn test_failed_write_is_not_applied() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new_with_base_dir(temp_dir.path().to_path_buf()).unwrap();
        store.set("dotvest_selected_account", "5Grw").unwrap();

        // Turn the document path into a directory so the next write fails
        let document = temp_dir.path().join(SESSION_FILE);
        fs::remove_file(&document).unwrap();
        fs::create_dir(&document).unwrap();

        assert!(store.set("dotvest_selected_account", "5FHn").is_err());
        assert!(store.remove("dotvest_selected_account").is_err());
        assert_eq!(
            store.get("dotvest_selected_account").unwrap().as_deref(),
            Some("5Grw")
        );

        assert!(store.set("dotvest_wallet_connected", "true").is_err());
        assert_eq!(store.get("dotvest_wallet_connected").unwrap(), None);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new_with_base_dir(temp_dir.path().join("nested")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
        assert!(!store.base_dir().exists());
    }
}
