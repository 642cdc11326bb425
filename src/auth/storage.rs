use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{unexpected_error, Error};

/// String key-value storage backing the session.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.lock().map_err(|_| unexpected_error())?;

        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().map_err(|_| unexpected_error())?;
        entries.insert(key.into(), value.into());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().map_err(|_| unexpected_error())?;
        entries.remove(key);

        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SessionStorage for FileStorage {
    #[tracing::instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<(), Error> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[test]
fn memory_storage_round_trip() {
    let storage = MemoryStorage::new();

    assert_eq!(storage.get("k").unwrap(), None);
    storage.set("k", "v").unwrap();
    assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    storage.remove("k").unwrap();
    assert_eq!(storage.get("k").unwrap(), None);
}

#[test]
fn file_storage_creates_dir_and_ignores_missing_keys() {
    let dir = std::env::temp_dir().join(format!("pettrack-storage-{}", uuid::Uuid::new_v4()));
    let storage = FileStorage::new(&dir);

    assert_eq!(storage.get("k").unwrap(), None);
    storage.remove("k").unwrap();

    storage.set("k", "{}").unwrap();
    assert!(dir.join("k.json").exists());
    assert_eq!(storage.get("k").unwrap().as_deref(), Some("{}"));

    storage.remove("k").unwrap();
    assert_eq!(storage.get("k").unwrap(), None);

    fs::remove_dir_all(&dir).unwrap();
}
