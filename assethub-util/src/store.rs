use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;
use tracing::trace;

use crate::config::StoredConfig;
use crate::fs::safe_write_all;

/// A filesystem backed document store
///
/// Every document is one JSON file directly under the store root. Writes
/// are atomic but the store does no locking, so two processes sharing a
/// root may lose each other's writes.
#[derive(Clone, Debug)]
pub struct Store {
    root: PathBuf,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("invalid document name '{0}'")]
    InvalidName(String),
}

impl Store {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn document_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        let is_plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !is_plain {
            return Err(StoreError::InvalidName(name.to_owned()));
        }
        Ok(self.root.join(name).with_extension("json"))
    }

    /// Create or replace the document `name`
    pub async fn write<V: Serialize>(&self, name: &str, value: &V) -> Result<(), StoreError> {
        let full_path = self.document_path(name)?;

        // fails if the root exists but is not a directory
        fs::create_dir_all(&self.root).await?;

        let buf = serde_json::to_vec(value)?;
        trace!("writing {}", full_path.display());
        safe_write_all(full_path, &buf).await?;
        Ok(())
    }

    /// Read the document `name`, returning `None` if it does not exist
    pub async fn read<V: DeserializeOwned>(&self, name: &str) -> Result<Option<V>, StoreError> {
        let full_path = self.document_path(name)?;
        trace!("reading {}", full_path.display());

        match fs::read_to_string(&full_path).await {
            Ok(contents) => Ok(Some(serde_json::from_str::<V>(&contents)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Store a config under its own name
    pub async fn save<C: StoredConfig>(&self, config: &C) -> Result<(), StoreError> {
        self.write(&config.name(), config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        value: u32,
    }

    impl StoredConfig for Doc {
        fn kind() -> &'static str {
            "doc"
        }
    }

    #[tokio::test]
    async fn test_read_missing_document_returns_none() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        let doc: Option<Doc> = store.read("missing").await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("nested"));

        store.write("doc", &Doc { value: 7 }).await.unwrap();
        let doc: Option<Doc> = store.read("doc").await.unwrap();

        assert_eq!(doc, Some(Doc { value: 7 }));
        assert!(dir.path().join("nested").join("doc.json").exists());
    }

    #[tokio::test]
    async fn test_save_uses_config_name() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        store.save(&Doc { value: 1 }).await.unwrap();
        assert!(dir.path().join("doc.json").exists());
    }

    #[tokio::test]
    async fn test_rejects_names_with_path_segments() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        let result = store.write("../escape", &Doc { value: 1 }).await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));
    }
}
