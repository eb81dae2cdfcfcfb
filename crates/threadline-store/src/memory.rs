//! In-memory implementation of DocumentStore
//!
//! This implementation is primarily intended for testing and development purposes.

use crate::path::{normalize_path, parent_folder};
use crate::{DocumentStore, DocumentStoreError, DocumentStoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// In-memory implementation of DocumentStore
///
/// Documents and folders live in shared maps, so clones of the store observe
/// each other's writes. Creating a document requires its folder to exist,
/// mirroring the filesystem backend. All data is lost when the last clone
/// is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<BTreeMap<String, String>>>,
    folders: Arc<RwLock<BTreeSet<String>>>,
}

impl InMemoryDocumentStore {
    /// Create a new, empty in-memory document store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, creating any missing parent folders.
    ///
    /// Overwrites an existing document at the same path.
    pub async fn insert_document(&self, path: &str, text: &str) {
        let path = normalize_path(path);
        self.register_folders(parent_folder(&path)).await;
        self.documents.write().await.insert(path, text.to_string());
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns true if no documents are stored
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    async fn register_folders(&self, folder: &str) {
        if folder.is_empty() {
            return;
        }
        let mut folders = self.folders.write().await;
        let mut current = String::new();
        for segment in folder.split('/') {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            folders.insert(current.clone());
        }
    }

    async fn folder_exists(&self, folder: &str) -> bool {
        folder.is_empty() || self.folders.read().await.contains(folder)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read(&self, path: &str) -> DocumentStoreResult<String> {
        let key = normalize_path(path);
        let store = self.documents.read().await;

        match store.get(&key) {
            Some(text) => Ok(text.clone()),
            None => Err(DocumentStoreError::NotFound(key)),
        }
    }

    async fn write(&self, path: &str, text: &str) -> DocumentStoreResult<()> {
        let key = normalize_path(path);
        let mut store = self.documents.write().await;

        match store.get_mut(&key) {
            Some(existing) => {
                *existing = text.to_string();
                trace!(path = %key, bytes = text.len(), "Document overwritten");
                Ok(())
            }
            None => Err(DocumentStoreError::NotFound(key)),
        }
    }

    async fn create(&self, path: &str, text: &str) -> DocumentStoreResult<()> {
        let key = normalize_path(path);
        if key.is_empty() {
            return Err(DocumentStoreError::InvalidPath(path.to_string()));
        }

        let folder = parent_folder(&key).to_string();
        if !self.folder_exists(&folder).await {
            return Err(DocumentStoreError::NotFound(folder));
        }

        let mut store = self.documents.write().await;
        if store.contains_key(&key) {
            return Err(DocumentStoreError::AlreadyExists(key));
        }
        trace!(path = %key, bytes = text.len(), "Document created");
        store.insert(key, text.to_string());

        Ok(())
    }

    async fn exists(&self, path: &str) -> DocumentStoreResult<bool> {
        let key = normalize_path(path);
        if self.documents.read().await.contains_key(&key) {
            return Ok(true);
        }
        Ok(!key.is_empty() && self.folders.read().await.contains(&key))
    }

    async fn list_all(&self) -> DocumentStoreResult<Vec<String>> {
        let store = self.documents.read().await;
        Ok(store.keys().cloned().collect())
    }

    async fn create_folder(&self, path: &str) -> DocumentStoreResult<()> {
        let key = normalize_path(path);
        if self.documents.read().await.contains_key(&key) {
            return Err(DocumentStoreError::AlreadyExists(key));
        }
        self.register_folders(&key).await;
        Ok(())
    }
}
