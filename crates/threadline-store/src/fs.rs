//! Filesystem implementation of DocumentStore
//!
//! Maps vault-relative document paths onto files beneath a root directory.
//! Hidden entries (names starting with `.`, e.g. `.obsidian`, `.git`) are
//! skipped when listing.

use crate::path::normalize_path;
use crate::{DocumentStore, DocumentStoreError, DocumentStoreResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

/// Document store rooted at a vault directory
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Create a store over an existing directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The vault root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> DocumentStoreResult<(String, PathBuf)> {
        let key = normalize_path(path);
        if key.split('/').any(|segment| segment == "..") {
            return Err(DocumentStoreError::InvalidPath(path.to_string()));
        }
        let mut full = self.root.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        Ok((key, full))
    }

    fn map_io(key: &str, err: std::io::Error) -> DocumentStoreError {
        match err.kind() {
            ErrorKind::NotFound => DocumentStoreError::NotFound(key.to_string()),
            ErrorKind::AlreadyExists => DocumentStoreError::AlreadyExists(key.to_string()),
            _ => DocumentStoreError::io(key, err),
        }
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn read(&self, path: &str) -> DocumentStoreResult<String> {
        let (key, full) = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| Self::map_io(&key, e))
    }

    async fn write(&self, path: &str, text: &str) -> DocumentStoreResult<()> {
        let (key, full) = self.resolve(path)?;
        let metadata = tokio::fs::metadata(&full)
            .await
            .map_err(|e| Self::map_io(&key, e))?;
        if !metadata.is_file() {
            return Err(DocumentStoreError::NotFound(key));
        }
        tokio::fs::write(&full, text)
            .await
            .map_err(|e| Self::map_io(&key, e))?;
        trace!(path = %key, bytes = text.len(), "Document written");
        Ok(())
    }

    async fn create(&self, path: &str, text: &str) -> DocumentStoreResult<()> {
        let (key, full) = self.resolve(path)?;
        if key.is_empty() {
            return Err(DocumentStoreError::InvalidPath(path.to_string()));
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
            .map_err(|e| Self::map_io(&key, e))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| DocumentStoreError::io(&key, e))?;
        file.flush()
            .await
            .map_err(|e| DocumentStoreError::io(&key, e))?;
        debug!(path = %key, "Document created");
        Ok(())
    }

    async fn exists(&self, path: &str) -> DocumentStoreResult<bool> {
        let (key, full) = self.resolve(path)?;
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| DocumentStoreError::io(key, e))
    }

    async fn list_all(&self) -> DocumentStoreResult<Vec<String>> {
        let mut paths = Vec::new();
        let mut pending: Vec<(PathBuf, String)> = vec![(self.root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| DocumentStoreError::io(prefix.clone(), e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| DocumentStoreError::io(prefix.clone(), e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') {
                    continue;
                }
                let rel = if prefix.is_empty() {
                    name
                } else {
                    format!("{}/{}", prefix, name)
                };
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| DocumentStoreError::io(rel.clone(), e))?;
                if file_type.is_dir() {
                    pending.push((entry.path(), rel));
                } else if file_type.is_file() {
                    paths.push(rel);
                }
            }
        }

        paths.sort();
        Ok(paths)
    }

    async fn create_folder(&self, path: &str) -> DocumentStoreResult<()> {
        let (key, full) = self.resolve(path)?;
        tokio::fs::create_dir_all(&full)
            .await
            .map_err(|e| Self::map_io(&key, e))?;
        debug!(folder = %key, "Folder ensured");
        Ok(())
    }
}
