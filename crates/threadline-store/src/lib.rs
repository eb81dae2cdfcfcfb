//! Threadline Document Store
//!
//! Provides the abstraction over the collection of named documents that
//! threads are built from. Documents are addressed by a vault-relative path
//! using `/` separators (e.g. `threads/20240101120000000.md`) and carry a
//! UTF-8 text body.
//!
//! The [`DocumentStore`] trait defines the contract; [`memory`] and [`fs`]
//! provide the in-memory and filesystem-backed implementations.

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod fs;
pub mod memory;
pub mod path;

pub use fs::FsDocumentStore;
pub use memory::InMemoryDocumentStore;

/// Errors that can occur during document store operations
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("Storage backend error: {0}")]
    BackendError(#[from] anyhow::Error),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentStoreError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        DocumentStoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for DocumentStore operations
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

/// Trait defining the contract for document storage implementations
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Read the full text of a document
    async fn read(&self, path: &str) -> DocumentStoreResult<String>;

    /// Overwrite an existing document
    async fn write(&self, path: &str, text: &str) -> DocumentStoreResult<()>;

    /// Create a new document; fails with `AlreadyExists` if the path is taken
    async fn create(&self, path: &str, text: &str) -> DocumentStoreResult<()>;

    /// Check whether a document or folder exists at the path
    async fn exists(&self, path: &str) -> DocumentStoreResult<bool>;

    /// List every document path, in lexicographic order
    async fn list_all(&self) -> DocumentStoreResult<Vec<String>>;

    /// Create a folder (and any missing parents). Existing folders are not an error.
    async fn create_folder(&self, path: &str) -> DocumentStoreResult<()>;
}
