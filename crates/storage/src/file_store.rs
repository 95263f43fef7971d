use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

use crate::KeyValueStore;

/// Key/value pairs persisted as a single JSON object on disk.
///
/// Every write serializes the whole map to a sibling temporary file and renames it over the
/// original, so readers never observe a partially written file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into(), lock: Mutex::new(()) }
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, FileStoreError> {
        let raw_text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("Store file {} does not exist yet", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(FileStoreError::IoError(err)),
        };

        match serde_json::from_str(&raw_text) {
            Ok(map) => Ok(map),
            Err(err) => {
                // A damaged store file is dropped rather than blocking every later write
                warn!("Ignoring unreadable store file {}: {}", self.path.display(), err);
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), FileStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let serialized = serde_json::to_string_pretty(map)?;
        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");

        fs::write(&tmp_path, serialized).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    type Error = FileStoreError;

    async fn get(&self, k: &str) -> Result<Option<String>, Self::Error> {
        debug!("Getting key: {}", k);
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.remove(k))
    }

    async fn set(&self, k: &str, v: &str) -> Result<(), Self::Error> {
        info!("Setting key: {} in {}", k, self.path.display());
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(k.to_string(), v.to_string());
        self.write_map(&map).await
    }

    async fn delete(&self, k: &str) -> Result<(), Self::Error> {
        info!("Deleting key: {} from {}", k, self.path.display());
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(k).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("Store file IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
