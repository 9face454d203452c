use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{StorageError, StorageResult};
use crate::kv::KeyValueStore;

/// Directory-backed key-value store: one `<key>.json` file per key.
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> StorageResult<Self> {
        let data_dir = expand_tilde(data_dir.as_ref())?;

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).map_err(|source| StorageError::Io {
                path: data_dir.clone(),
                source,
            })?;
        }

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the file path for a key
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.starts_with('.') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
            .collect();
        Ok(self.data_dir.join(format!("{}.json", file_name)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        let tmp_path = path.with_extension("json.tmp");

        // Write then rename so a crash never leaves a truncated value behind
        fs::write(&tmp_path, value).map_err(|source| StorageError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| StorageError::Io { path, source })
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> StorageResult<PathBuf> {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = std::env::var("HOME").map_err(|_| StorageError::NoHomeDir)?;
        Ok(PathBuf::from(home).join(rest))
    } else if path_str == "~" {
        let home = std::env::var("HOME").map_err(|_| StorageError::NoHomeDir)?;
        Ok(PathBuf::from(home))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn values_survive_reopening() {
        let temp = TempDir::new().unwrap();
        {
            let store = FileStore::new(temp.path()).unwrap();
            store.set("recentChats", "[]").unwrap();
        }
        let store = FileStore::new(temp.path()).unwrap();
        assert_eq!(store.get("recentChats").unwrap().as_deref(), Some("[]"));
        assert!(temp.path().join("recentChats.json").exists());
        assert!(!temp.path().join("recentChats.json.tmp").exists());
    }

    #[test]
    fn missing_keys_read_as_none_and_delete_quietly() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();
        assert_eq!(store.get("chat_1").unwrap(), None);
        store.delete("chat_1").unwrap();
    }

    #[test]
    fn creates_nested_data_dir() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        let store = FileStore::new(&nested).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.data_dir(), nested.as_path());
    }

    #[test]
    fn path_separators_in_keys_stay_inside_data_dir() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path()).unwrap();
        store.set("chat_../escape", "x").unwrap();
        assert!(temp.path().join("chat_.._escape.json").exists());
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.set("../x", "v"), Err(StorageError::InvalidKey(_))));
    }
}
