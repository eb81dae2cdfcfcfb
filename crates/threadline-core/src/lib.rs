//!
//! Threadline Core - threads of linked notes
//!
//! Notes link backwards through a `prev` metadata property. This crate
//! builds the resulting thread graph from a document store, answers
//! traversal queries over it, and inserts new notes into existing threads
//! while keeping storage and the graph in step.

#![forbid(unsafe_code)]

/// Domain layer - graph, metadata and link models
pub mod domain;

/// Application services - graph building, insertion and orchestration
pub mod application;

/// Configuration
pub mod config;

/// Error types
pub mod error;

/// Shared identifier types
pub mod types;

// Re-export key types
pub use application::graph_builder::{BuildSummary, GraphBuilder};
pub use application::insertion_service::{
    note_identifier, ChainInsertionService, Clock, CreatedNote, FrontmatterMutation,
    InsertionContext, NotifyCallback, SystemClock,
};
pub use application::trigger::{BlankLineTrigger, TriggerSignal};
pub use application::workspace::{ReplyBranch, ThreadView, ThreadWorkspace};
pub use config::ThreadConfig;
pub use domain::graph::{SharedThreadGraph, ThreadGraph};
pub use domain::metadata::{MetadataAccessor, NoteMetadata, PrevReference, StoreMetadataAccessor};
pub use error::{ThreadError, ThreadResult};
pub use types::NotePath;
