//! Audit log persistence.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::repos::{AuditStore, StoreError};
use crate::util::lock::mutex_lock;

const SOURCE: &str = "infra::audit_store";

/// Process-local store, for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    value: Mutex<Option<Value>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing stored value, whatever its shape.
    pub fn with_value(value: Value) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn load(&self) -> Result<Option<Value>, StoreError> {
        Ok(mutex_lock(&self.value, SOURCE, "memory_load").clone())
    }

    async fn save(&self, value: Value) -> Result<(), StoreError> {
        *mutex_lock(&self.value, SOURCE, "memory_save") = Some(value);
        Ok(())
    }

    async fn remove(&self) -> Result<(), StoreError> {
        *mutex_lock(&self.value, SOURCE, "memory_remove") = None;
        Ok(())
    }
}

/// One JSON document on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileAuditStore {
    path: PathBuf,
}

impl FileAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStore for FileAuditStore {
    async fn load(&self) -> Result<Option<Value>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|err| StoreError::Corrupted(err.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, value: Value) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&value)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|err| StoreError::Io(std::io::Error::other(err)))?
    }

    async fn remove(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| StoreError::Io(err.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "Audit log written");
    Ok(())
}
