use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use super::FileStore;
use crate::errors::ServiceError;

/// Filesystem-backed store rooted at `root`, addressed under `public_url`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_url: String,
}

impl LocalFileStore {
    pub fn new<P: Into<PathBuf>>(root: P, public_url: &str) -> Self {
        Self { root: root.into(), public_url: public_url.trim_end_matches('/').to_string() }
    }

    pub fn root(&self) -> &Path { &self.root }

    /// Normalized key: no empty, `.` or `..` segments, so writes stay below `root`.
    fn sanitize_key(key: &str) -> String {
        key.split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
            .collect::<Vec<_>>()
            .join("/")
    }

    fn full_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for component in Self::sanitize_key(key).split('/') {
            path.push(component);
        }
        path
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<String, ServiceError> {
        let key = Self::sanitize_key(key);
        if key.is_empty() {
            return Err(ServiceError::Storage("empty storage key".into()));
        }
        let path = self.full_path(&key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        fs::write(&path, &data)
            .await
            .map_err(|e| ServiceError::Storage(format!("write {}: {e}", path.display())))?;
        debug!(%key, bytes = data.len(), "file stored");
        Ok(format!("{}/{}", self.public_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        let path = self.full_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Storage(format!("delete {}: {e}", path.display()))),
        }
    }
}
