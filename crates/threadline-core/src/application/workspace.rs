//! Orchestrator owning the thread graph and its collaborators

use serde::Serialize;
use std::sync::Arc;
use threadline_store::DocumentStore;
use tokio::sync::Mutex;
use tracing::info;

use super::graph_builder::{BuildSummary, GraphBuilder};
use super::insertion_service::{ChainInsertionService, Clock, CreatedNote, NotifyCallback};
use super::trigger::BlankLineTrigger;
use crate::config::ThreadConfig;
use crate::domain::graph::{SharedThreadGraph, ThreadGraph};
use crate::domain::metadata::{MetadataAccessor, StoreMetadataAccessor};
use crate::error::{ThreadError, ThreadResult};
use crate::types::NotePath;

/// A reply chain hanging off a note of the main thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyBranch {
    /// Main-thread note the reply forks from
    pub from: NotePath,
    /// Chain as returned by the graph: thread root through the reply onward
    pub chain: Vec<NotePath>,
}

impl ReplyBranch {
    /// The part of the chain after the fork point
    pub fn branch_notes(&self) -> &[NotePath] {
        match self.chain.iter().position(|n| n == &self.from) {
            Some(idx) => &self.chain[idx + 1..],
            None => &self.chain,
        }
    }
}

/// Everything needed to display the thread a note belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadView {
    pub note: NotePath,
    pub thread: Vec<NotePath>,
    pub replies: Vec<ReplyBranch>,
}

pub struct ThreadWorkspace {
    store: Arc<dyn DocumentStore>,
    accessor: Arc<dyn MetadataAccessor>,
    graph: SharedThreadGraph,
    config: ThreadConfig,
    builder: GraphBuilder,
    insertion: ChainInsertionService,
    trigger: Mutex<BlankLineTrigger>,
    notify: Option<NotifyCallback>,
}

impl ThreadWorkspace {
    /// Wire up a workspace over `store` with an empty graph
    pub fn new(store: Arc<dyn DocumentStore>, config: ThreadConfig) -> Self {
        let accessor: Arc<dyn MetadataAccessor> =
            Arc::new(StoreMetadataAccessor::new(store.clone(), &config));
        let graph = ThreadGraph::new().shared();
        let builder = GraphBuilder::new(store.clone(), accessor.clone(), config.default_extension.clone());
        let insertion =
            ChainInsertionService::new(store.clone(), accessor.clone(), graph.clone(), config.clone());
        let trigger = Mutex::new(BlankLineTrigger::new(config.trigger_blank_lines));

        Self {
            store,
            accessor,
            graph,
            config,
            builder,
            insertion,
            trigger,
            notify: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.insertion = self.insertion.with_clock(clock);
        self
    }

    /// Register the callback run after every rebuild and insertion
    pub fn with_notifier(mut self, notify: NotifyCallback) -> Self {
        self.insertion = self.insertion.with_notifier(notify.clone());
        self.notify = Some(notify);
        self
    }

    pub fn graph(&self) -> SharedThreadGraph {
        self.graph.clone()
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn accessor(&self) -> Arc<dyn MetadataAccessor> {
        self.accessor.clone()
    }

    pub fn config(&self) -> &ThreadConfig {
        &self.config
    }

    pub fn insertion_service(&self) -> &ChainInsertionService {
        &self.insertion
    }

    /// Rebuild the graph from storage and notify listeners
    pub async fn rebuild(&self) -> ThreadResult<BuildSummary> {
        let summary = self.builder.build(&self.graph).await?;
        if let Some(notify) = &self.notify {
            notify();
        }
        Ok(summary)
    }

    /// Insert a new note after `source`
    pub async fn insert_after(&self, source: &NotePath) -> ThreadResult<CreatedNote> {
        self.insertion.execute_insertion(source).await
    }

    /// Feed an edit of `path` to the trigger; runs an insertion when it fires
    pub async fn document_changed(&self, path: &NotePath, text: &str) -> ThreadResult<Option<CreatedNote>> {
        let signal = self.trigger.lock().await.observe(path, text);
        match signal {
            Some(signal) => {
                info!(path = %signal.path, blank_lines = signal.blank_lines, "Insertion triggered");
                self.insertion.execute_insertion(&signal.path).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Drop trigger state for a document that was closed, renamed or deleted
    pub async fn document_closed(&self, path: &NotePath) {
        self.trigger.lock().await.forget(path);
    }

    /// Full thread of `note` plus the reply chains of every note on it
    pub async fn thread_view(&self, note: &NotePath) -> ThreadResult<ThreadView> {
        let graph = self.graph.read().await;
        if !graph.has_node(note) {
            return Err(ThreadError::NoteNotFound(note.to_string()));
        }

        let thread = graph.get_full_thread(note)?;
        let mut replies = Vec::new();
        for member in &thread {
            for chain in graph.get_reply_chains(member)? {
                replies.push(ReplyBranch {
                    from: member.clone(),
                    chain,
                });
            }
        }

        Ok(ThreadView {
            note: note.clone(),
            thread,
            replies,
        })
    }

    /// Notes whose backward walk runs into a cycle
    pub async fn find_cycles(&self) -> Vec<NotePath> {
        self.graph.read().await.find_cycles()
    }
}
