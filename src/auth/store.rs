//! Namespaced key/value persistence for session state.
//!
//! The backing medium is a single JSON file holding a flat string map. The
//! file may be shared with unrelated keys; this store only ever reads,
//! writes, and deletes keys under its own namespace prefix.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub struct SessionStore {
    path: PathBuf,
    namespace: String,
}

impl SessionStore {
    pub fn new(path: PathBuf, namespace: &str) -> Self {
        Self {
            path,
            namespace: namespace.to_string(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}.{}", self.namespace, key)
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read store file: {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse store file: {}", self.path.display()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))?;
        Ok(())
    }

    /// Write a value under the namespaced key. Persists across restarts
    /// until explicitly removed.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(self.namespaced(key), value.to_string());
        self.write_map(&map)
    }

    /// Read a value. Missing keys are `None`, never an error.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map()?;
        Ok(map.get(&self.namespaced(key)).cloned())
    }

    /// Delete a key. Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map()?;
        if map.remove(&self.namespaced(key)).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    /// Remove every key under this store's namespace. Keys belonging to
    /// other namespaces in the same file are left untouched.
    pub fn clear_all(&self) -> Result<()> {
        let mut map = self.read_map()?;
        let prefix = format!("{}.", self.namespace);
        let before = map.len();
        map.retain(|k, _| !k.starts_with(&prefix));
        if map.len() != before {
            self.write_map(&map)?;
        }
        Ok(())
    }

    /// Count of keys currently held under this store's namespace.
    pub fn key_count(&self) -> Result<usize> {
        let map = self.read_map()?;
        let prefix = format!("{}.", self.namespace);
        Ok(map.keys().filter(|k| k.starts_with(&prefix)).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("store.json"), "authgate")
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        store.set("access_token", "access123").unwrap();
        assert_eq!(
            store.get("access_token").unwrap().as_deref(),
            Some("access123")
        );
    }

    #[test]
    fn get_missing_key_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        assert_eq!(store.get("never_set").unwrap(), None);
    }

    #[test]
    fn values_persist_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        SessionStore::new(path.clone(), "authgate")
            .set("username", "alice")
            .unwrap();

        let reopened = SessionStore::new(path, "authgate");
        assert_eq!(reopened.get("username").unwrap().as_deref(), Some("alice"));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        store.set("refresh_token", "refresh456").unwrap();
        store.remove("refresh_token").unwrap();
        assert_eq!(store.get("refresh_token").unwrap(), None);

        // Removing again must not error
        store.remove("refresh_token").unwrap();
    }

    #[test]
    fn clear_all_leaves_foreign_namespaces_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = SessionStore::new(path.clone(), "authgate");
        let other = SessionStore::new(path, "otherapp");

        other.set("theme", "dark").unwrap();
        store.set("access_token", "access123").unwrap();
        store.set("refresh_token", "refresh456").unwrap();
        store.set("username", "alice").unwrap();

        store.clear_all().unwrap();

        assert_eq!(store.key_count().unwrap(), 0);
        assert_eq!(other.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn clear_all_on_empty_store_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        store.clear_all().unwrap();
    }

    #[test]
    fn corrupt_store_file_propagates_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = SessionStore::new(path, "authgate");
        assert!(store.get("access_token").is_err());
    }
}
