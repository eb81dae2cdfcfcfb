use serde::Serialize;
use std::sync::Arc;
use threadline_store::path::has_extension;
use threadline_store::DocumentStore;
use tracing::{debug, info, warn};

use crate::domain::graph::SharedThreadGraph;
use crate::domain::link::strip_link_decoration;
use crate::domain::metadata::{MetadataAccessor, NoteMetadata};
use crate::error::ThreadResult;
use crate::types::NotePath;

/// Counts reported by a full graph build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    /// Documents scanned
    pub documents: usize,
    /// Documents with a predecessor edge
    pub edges: usize,
    /// Edges whose reference did not resolve to a document
    pub dangling: usize,
    /// Documents whose metadata could not be read
    pub degraded: usize,
}

/// Scans every document and rebuilds the thread graph from scratch
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    store: Arc<dyn DocumentStore>,
    accessor: Arc<dyn MetadataAccessor>,
    extension: String,
}

impl GraphBuilder {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        accessor: Arc<dyn MetadataAccessor>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            store,
            accessor,
            extension: extension.into(),
        }
    }

    /// Path used for a reference that resolves to nothing
    pub fn fallback_path(&self, reference: &str) -> NotePath {
        if has_extension(reference, &self.extension) {
            NotePath::new(reference)
        } else {
            NotePath::new(format!("{}.{}", reference, self.extension))
        }
    }

    /// Resolve the predecessor recorded in `metadata`.
    ///
    /// Returns the predecessor (if any) and whether it fell back to a
    /// synthesized path.
    async fn resolve_prev(&self, path: &NotePath, metadata: &NoteMetadata) -> (Option<NotePath>, bool) {
        let Some(raw) = metadata.prev.as_ref().and_then(|prev| prev.first()) else {
            return (None, false);
        };
        let bare = strip_link_decoration(raw);
        if bare.is_empty() {
            return (None, false);
        }

        match self.accessor.resolve_reference(&bare, path).await {
            Ok(Some(resolved)) => (Some(resolved), false),
            Ok(None) => {
                debug!(path = %path, reference = %bare, "Unresolved prev reference");
                (Some(self.fallback_path(&bare)), true)
            }
            Err(e) => {
                warn!(path = %path, reference = %bare, error = %e, "Failed to resolve prev reference");
                (Some(self.fallback_path(&bare)), true)
            }
        }
    }

    /// Clear `graph` and repopulate it from every document in the store.
    ///
    /// Documents are read before the graph lock is taken, so readers see
    /// either the old graph or the complete new one.
    pub async fn build(&self, graph: &SharedThreadGraph) -> ThreadResult<BuildSummary> {
        let paths: Vec<NotePath> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|p| has_extension(p, &self.extension))
            .map(NotePath::new)
            .collect();

        let mut summary = BuildSummary {
            documents: paths.len(),
            ..BuildSummary::default()
        };
        let mut entries = Vec::with_capacity(paths.len());

        for path in paths {
            let metadata = match self.accessor.get_metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %path, error = %e, "Unreadable document; treating as root");
                    summary.degraded += 1;
                    NoteMetadata::default()
                }
            };

            let (prev, dangling) = self.resolve_prev(&path, &metadata).await;
            if prev.is_some() {
                summary.edges += 1;
            }
            if dangling {
                summary.dangling += 1;
            }
            entries.push((path, prev, metadata.is_main_thread));
        }

        let mut graph = graph.write().await;
        graph.clear();
        for (path, prev, is_main) in entries {
            graph.set_prev(path.clone(), prev);
            graph.set_main_marker(path, is_main);
        }
        graph.rebuild_next();

        info!(
            documents = summary.documents,
            edges = summary.edges,
            dangling = summary.dangling,
            degraded = summary.degraded,
            "Thread graph rebuilt"
        );
        Ok(summary)
    }
}
