use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{DocumentStore, StorageError, StorageKey};

/// One `<key>.json` file per document under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl DocumentStore for FileStore {
    fn load(&self, key: StorageKey) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_str(&raw)?;
        Ok(Some(value))
    }

    fn save(&self, key: StorageKey, document: &Value) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let data = serde_json::to_vec(document)?;

        // Write to temp file, then rename over the target
        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;

        tracing::debug!(key = %key, bytes = data.len(), "document saved");
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_key_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.load(StorageKey::Teams).unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let doc = json!([{ "id": "team_1" }]);

        store.save(StorageKey::Teams, &doc).unwrap();
        assert_eq!(store.load(StorageKey::Teams).unwrap(), Some(doc));

        let temp = dir.path().join("gameport_teams.json.tmp");
        assert!(!temp.exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("gameport_users_db.json"), "{not json").unwrap();
        assert!(matches!(
            store.load(StorageKey::Users),
            Err(StorageError::Json(_))
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.save(StorageKey::Session, &json!({"id": "u"})).unwrap();
        store.remove(StorageKey::Session).unwrap();
        store.remove(StorageKey::Session).unwrap();
        assert!(store.load(StorageKey::Session).unwrap().is_none());
    }
}
