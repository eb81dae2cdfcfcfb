//! Chain insertion
//!
//! Creates a new note directly after a source note and splices it into the
//! source's main thread. One invocation runs
//! context → create → mutations → apply → graph update → notify.
//! Nothing is rolled back: if a step fails, earlier steps stay committed and
//! the next full graph rebuild reconciles the graph with storage.

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use std::fmt::{self, Debug};
use std::sync::Arc;
use threadline_store::path::{join_path, normalize_path};
use threadline_store::DocumentStore;
use tracing::{debug, error, info};

use crate::config::ThreadConfig;
use crate::domain::frontmatter::{render_document, upsert_property, PropertyValue};
use crate::domain::graph::SharedThreadGraph;
use crate::domain::link::format_link;
use crate::domain::metadata::MetadataAccessor;
use crate::error::{ThreadError, ThreadResult};
use crate::types::NotePath;

const MAX_IDENTIFIER_ATTEMPTS: u32 = 1000;

/// Callback telling dependent views to reload
pub type NotifyCallback = Arc<dyn Fn() + Send + Sync>;

/// Source of local wall-clock time for note identifiers
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Identifier for a note created at `at`: `YYYYMMDDHHMMSSmmm`.
///
/// Fixed width, so lexicographic order is chronological order.
pub fn note_identifier(at: &NaiveDateTime) -> String {
    at.format("%Y%m%d%H%M%S%3f").to_string()
}

/// Where an insertion happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionContext {
    pub source_path: NotePath,
    pub source_title: String,
    /// Current main continuation of the source, if any
    pub next_path: Option<NotePath>,
    pub is_append: bool,
}

/// A note written by the insertion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedNote {
    pub path: NotePath,
    pub title: String,
}

/// A single property rewrite on an existing document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterMutation {
    pub target: NotePath,
    pub property: String,
    pub value: PropertyValue,
}

pub struct ChainInsertionService {
    store: Arc<dyn DocumentStore>,
    accessor: Arc<dyn MetadataAccessor>,
    graph: SharedThreadGraph,
    config: ThreadConfig,
    clock: Arc<dyn Clock>,
    notify: Option<NotifyCallback>,
}

impl Debug for ChainInsertionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainInsertionService")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

impl ChainInsertionService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        accessor: Arc<dyn MetadataAccessor>,
        graph: SharedThreadGraph,
        config: ThreadConfig,
    ) -> Self {
        Self {
            store,
            accessor,
            graph,
            config,
            clock: Arc::new(SystemClock),
            notify: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notify: NotifyCallback) -> Self {
        self.notify = Some(notify);
        self
    }

    /// Step 1: read the source title and its current main continuation
    pub async fn build_insertion_context(&self, source_path: &NotePath) -> ThreadResult<InsertionContext> {
        let source_title = self.accessor.display_title(source_path).await?;
        let next_path = self
            .graph
            .read()
            .await
            .get_main_continuation(source_path)
            .cloned();

        Ok(InsertionContext {
            source_path: source_path.clone(),
            source_title,
            is_append: next_path.is_none(),
            next_path,
        })
    }

    /// Link text that resolves to `target` when written in `from`:
    /// the basename when unambiguous, else the extension-less path
    async fn link_text_for(&self, target: &NotePath, from: &NotePath) -> String {
        let basename = target.basename();
        match self.accessor.resolve_reference(basename, from).await {
            Ok(Some(resolved)) if &resolved == target => basename.to_string(),
            _ => target.without_extension().to_string(),
        }
    }

    async fn allocate_path(&self, folder: &str) -> ThreadResult<(NotePath, String)> {
        let mut at = self.clock.now();
        for _ in 0..MAX_IDENTIFIER_ATTEMPTS {
            let id = note_identifier(&at);
            let path = join_path(folder, &format!("{}.{}", id, self.config.default_extension));
            if !self.store.exists(&path).await? {
                return Ok((NotePath::new(path), id));
            }
            debug!(path = %path, "Identifier taken; advancing");
            at += Duration::milliseconds(1);
        }
        Err(ThreadError::IdentifierExhausted(format!(
            "no free identifier in {:?} after {} attempts",
            folder, MAX_IDENTIFIER_ATTEMPTS
        )))
    }

    /// Step 2: write the new note, pointing back at the source
    pub async fn create_note(&self, context: &InsertionContext) -> ThreadResult<CreatedNote> {
        let folder = normalize_path(&self.config.notes_folder);
        if !folder.is_empty() && !self.store.exists(&folder).await? {
            self.store.create_folder(&folder).await?;
            debug!(folder = %folder, "Created notes folder");
        }

        let (path, title) = self.allocate_path(&folder).await?;
        let link_text = self.link_text_for(&context.source_path, &path).await;
        let text = render_document(
            &[
                (
                    self.config.prev_property.as_str(),
                    PropertyValue::Text(format_link(&link_text)),
                ),
                (self.config.main_thread_property.as_str(), PropertyValue::Bool(true)),
            ],
            "",
        );

        self.store.create(path.as_str(), &text).await?;
        debug!(path = %path, source = %context.source_path, "Created note");

        Ok(CreatedNote { path, title })
    }

    /// Step 3: the rewrites needed elsewhere. A mid-chain insertion repoints
    /// the old continuation at the new note; an append needs nothing.
    pub async fn calculate_mutations(
        &self,
        context: &InsertionContext,
        created: &CreatedNote,
    ) -> ThreadResult<Vec<FrontmatterMutation>> {
        let Some(next_path) = context.next_path.as_ref().filter(|_| !context.is_append) else {
            return Ok(Vec::new());
        };

        let link_text = self.link_text_for(&created.path, next_path).await;
        Ok(vec![FrontmatterMutation {
            target: next_path.clone(),
            property: self.config.prev_property.clone(),
            value: PropertyValue::Text(format_link(&link_text)),
        }])
    }

    /// Step 4: apply mutations in order. Each write commits on its own.
    pub async fn apply_mutations(&self, mutations: &[FrontmatterMutation]) -> ThreadResult<()> {
        for mutation in mutations {
            let text = self.store.read(mutation.target.as_str()).await?;
            let updated = upsert_property(&text, &mutation.property, &mutation.value);
            self.store.write(mutation.target.as_str(), &updated).await?;
            debug!(
                target = %mutation.target,
                property = %mutation.property,
                "Applied metadata mutation"
            );
        }
        Ok(())
    }

    /// Step 5: mirror the storage changes into the graph
    pub async fn update_graph(&self, context: &InsertionContext, created: &CreatedNote) {
        let mut graph = self.graph.write().await;
        let source = Some(context.source_path.clone());
        match context.next_path.as_ref().filter(|_| !context.is_append) {
            // New note takes the old continuation's place among the source's successors
            Some(next_path) => {
                graph.insert_before(created.path.clone(), source, next_path);
                graph.set_prev(next_path.clone(), Some(created.path.clone()));
            }
            None => graph.set_prev(created.path.clone(), source),
        }
        graph.set_main_marker(created.path.clone(), true);
        graph.rebuild_next();
    }

    async fn run_steps(&self, source_path: &NotePath) -> ThreadResult<CreatedNote> {
        let context = self.build_insertion_context(source_path).await?;
        let created = self.create_note(&context).await?;
        let mutations = self.calculate_mutations(&context, &created).await?;
        self.apply_mutations(&mutations).await?;
        self.update_graph(&context, &created).await;

        info!(
            source = %context.source_path,
            created = %created.path,
            append = context.is_append,
            mutations = mutations.len(),
            "Inserted note into thread"
        );
        Ok(created)
    }

    /// Run the full insertion after `source_path` and notify listeners
    pub async fn execute_insertion(&self, source_path: &NotePath) -> ThreadResult<CreatedNote> {
        let created = match self.run_steps(source_path).await {
            Ok(created) => created,
            Err(e) => {
                error!(source = %source_path, error = %e, "Insertion failed");
                return Err(e);
            }
        };

        if let Some(notify) = &self.notify {
            notify();
        }
        Ok(created)
    }
}
