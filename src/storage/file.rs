//! Directory-backed storage
//!
//! One directory per scope, one `<key>.json` file per key. Point the shared
//! directory at something every member can reach (a network share, a synced
//! folder) and the vote map, feed and chat become common to the group.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{validate_key, Scope, Storage, StorageError};

#[derive(Debug, Clone)]
pub struct FileStorage {
    shared_dir: PathBuf,
    private_dir: PathBuf,
}

impl FileStorage {
    pub fn new(shared_dir: impl Into<PathBuf>, private_dir: impl Into<PathBuf>) -> Self {
        Self {
            shared_dir: shared_dir.into(),
            private_dir: private_dir.into(),
        }
    }

    fn path_for(&self, key: &str, scope: Scope) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        let dir = match scope {
            Scope::Shared => &self.shared_dir,
            Scope::Private => &self.private_dir,
        };
        Ok(dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str, scope: Scope) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key, scope)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str, scope: Scope) -> Result<(), StorageError> {
        let path = self.path_for(key, scope)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }

        // Write next to the target and rename over it; readers on other
        // machines see either the old blob or the new one
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        tokio::fs::write(&tmp, value).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}
