use thiserror::Error;
use threadline_store::DocumentStoreError;

use crate::types::NotePath;

/// Core error type for thread operations
#[derive(Error, Debug)]
pub enum ThreadError {
    /// Document store rejected an operation
    #[error("Storage error: {0}")]
    Storage(#[from] DocumentStoreError),

    /// A walk over `prev` edges revisited a node
    #[error("Cycle detected walking from {start}: {revisited} was reached twice")]
    CycleDetected {
        /// Node the walk started from
        start: NotePath,
        /// First node seen twice
        revisited: NotePath,
    },

    /// Note is not known to the thread graph
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// No free identifier could be generated for a new note
    #[error("Identifier allocation error: {0}")]
    IdentifierExhausted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ThreadError {
    /// Returns true if this error reports a cycle in the thread graph
    pub fn is_cycle(&self) -> bool {
        matches!(self, ThreadError::CycleDetected { .. })
    }
}

/// Result type for thread operations
pub type ThreadResult<T> = Result<T, ThreadError>;
