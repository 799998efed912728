//! File-backed plugin option storage.
//!
//! Options persist in `settings.json`:
//!
//! ```json
//! {
//!   "options": { "enabled": "on", "urgency": "normal" },
//!   "descriptions": { "enabled": "Enable or disable notifications (default: \"on\")" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mn_core::{SettingsStore, StoreError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    options: BTreeMap<String, String>,
    #[serde(default)]
    descriptions: BTreeMap<String, String>,
}

/// [`SettingsStore`] persisted as a JSON file.
///
/// Every change is written back immediately; writes that would not change
/// anything are skipped, so re-initializing leaves the file untouched.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    file: SettingsFile,
}

impl JsonSettingsStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsFile::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the description attached to an option.
    pub fn description(&self, name: &str) -> Option<&str> {
        self.file.descriptions.get(name).map(String::as_str)
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

fn upsert(map: &mut BTreeMap<String, String>, key: &str, value: &str) -> bool {
    if map.get(key).map(String::as_str) == Some(value) {
        return false;
    }
    map.insert(key.to_string(), value.to_string());
    true
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, name: &str) -> Option<String> {
        self.file.options.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), StoreError> {
        if upsert(&mut self.file.options, name, value) {
            self.save()?;
        }
        Ok(())
    }

    fn supports_descriptions(&self) -> bool {
        true
    }

    fn set_description(&mut self, name: &str, description: &str) -> Result<(), StoreError> {
        if upsert(&mut self.file.descriptions, name, description) {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mn_core::ConfigStore;

    use super::*;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::open(dir.path().join("settings.json")).unwrap();
        assert!(store.get("enabled").is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut store = JsonSettingsStore::open(&path).unwrap();
        store.set("urgency", "critical").unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get("urgency").as_deref(), Some("critical"));
    }

    #[test]
    fn test_initialize_twice_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = JsonSettingsStore::open(&path).unwrap();
        store.set("icon", "dialog-information").unwrap();
        ConfigStore::load(&mut store).unwrap();
        let first = fs::read_to_string(&path).unwrap();

        let mut store = JsonSettingsStore::open(&path).unwrap();
        ConfigStore::load(&mut store).unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get("icon").as_deref(), Some("dialog-information"));
        assert_eq!(
            store.description("enabled"),
            Some("Enable or disable notifications (default: \"on\")")
        );
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let err = JsonSettingsStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }
}
