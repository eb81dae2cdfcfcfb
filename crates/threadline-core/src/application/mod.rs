/// Full graph rebuild from the document store
pub mod graph_builder;

/// Chain insertion protocol
pub mod insertion_service;

/// Trailing-blank-line trigger detection
pub mod trigger;

/// Workspace orchestrator
pub mod workspace;
