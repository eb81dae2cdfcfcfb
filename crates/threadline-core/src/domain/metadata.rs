//! Document Metadata Accessor
//!
//! Reads the thread-relevant properties of a document and resolves textual
//! references to canonical document paths.

use async_trait::async_trait;
use serde_yaml::{Mapping, Value};
use std::fmt::Debug;
use std::sync::Arc;
use threadline_store::path::{file_stem, has_extension, join_path, normalize_path};
use threadline_store::DocumentStore;
use tracing::debug;

use super::frontmatter::read_properties;
use crate::config::ThreadConfig;
use crate::error::ThreadResult;
use crate::types::NotePath;

const TITLE_PROPERTY: &str = "title";

/// Raw `prev` property value: one reference or a list of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrevReference {
    /// `prev: "[[A]]"`
    Single(String),
    /// `prev: ["[[A]]", "[[B]]"]`
    Many(Vec<String>),
}

impl PrevReference {
    /// The reference the graph uses; later list entries are ignored
    pub fn first(&self) -> Option<&str> {
        match self {
            PrevReference::Single(value) => Some(value.as_str()),
            PrevReference::Many(values) => values.first().map(String::as_str),
        }
    }
}

/// Thread-relevant metadata of a single document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteMetadata {
    pub prev: Option<PrevReference>,
    pub is_main_thread: bool,
    pub title: Option<String>,
}

/// Property names the accessor reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataKeys {
    pub prev: String,
    pub main_thread: String,
}

impl MetadataKeys {
    pub fn from_config(config: &ThreadConfig) -> Self {
        Self {
            prev: config.prev_property.clone(),
            main_thread: config.main_thread_property.clone(),
        }
    }
}

impl Default for MetadataKeys {
    fn default() -> Self {
        Self::from_config(&ThreadConfig::default())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // An unquoted `[[A]]` reads as a nested list; take its first scalar.
        Value::Sequence(items) => items.first().and_then(scalar_text),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    };
    text.filter(|s| !s.trim().is_empty())
}

fn parse_prev(value: &Value) -> Option<PrevReference> {
    match value {
        Value::Sequence(items) => {
            let refs: Vec<String> = items.iter().filter_map(scalar_text).collect();
            if refs.is_empty() {
                None
            } else {
                Some(PrevReference::Many(refs))
            }
        }
        other => scalar_text(other).map(PrevReference::Single),
    }
}

fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

impl NoteMetadata {
    /// Extract thread metadata from a parsed property mapping
    pub fn from_properties(properties: &Mapping, keys: &MetadataKeys) -> Self {
        let prev = properties.get(keys.prev.as_str()).and_then(parse_prev);
        let is_main_thread = properties
            .get(keys.main_thread.as_str())
            .map(parse_flag)
            .unwrap_or(false);
        let title = properties
            .get(TITLE_PROPERTY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Self {
            prev,
            is_main_thread,
            title,
        }
    }

    /// Parse thread metadata from a document's full text
    pub fn from_document(text: &str, keys: &MetadataKeys) -> Self {
        Self::from_properties(&read_properties(text), keys)
    }
}

/// Read access to document metadata and reference resolution
#[async_trait]
pub trait MetadataAccessor: Send + Sync + Debug {
    /// Metadata of the document at `path`
    async fn get_metadata(&self, path: &NotePath) -> ThreadResult<NoteMetadata>;

    /// Resolve a bare reference (no link decoration) written in `from`
    async fn resolve_reference(&self, text: &str, from: &NotePath) -> ThreadResult<Option<NotePath>>;

    /// Display title: the `title` property, else the basename
    async fn display_title(&self, path: &NotePath) -> ThreadResult<String> {
        let metadata = self.get_metadata(path).await?;
        Ok(metadata
            .title
            .unwrap_or_else(|| path.basename().to_string()))
    }
}

/// MetadataAccessor reading documents from a DocumentStore
#[derive(Debug, Clone)]
pub struct StoreMetadataAccessor {
    store: Arc<dyn DocumentStore>,
    keys: MetadataKeys,
    extension: String,
}

impl StoreMetadataAccessor {
    pub fn new(store: Arc<dyn DocumentStore>, config: &ThreadConfig) -> Self {
        Self {
            store,
            keys: MetadataKeys::from_config(config),
            extension: config.default_extension.clone(),
        }
    }

    fn with_extension(&self, target: &str) -> String {
        if has_extension(target, &self.extension) {
            target.to_string()
        } else {
            format!("{}.{}", target, self.extension)
        }
    }

    async fn resolve_by_title(&self, title: &str) -> ThreadResult<Option<NotePath>> {
        let documents: Vec<String> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|p| has_extension(p, &self.extension))
            .collect();

        let exact: Vec<&String> = documents.iter().filter(|p| file_stem(p) == title).collect();
        if exact.len() == 1 {
            return Ok(Some(NotePath::new(exact[0].as_str())));
        }
        if exact.len() > 1 {
            debug!(title = %title, candidates = exact.len(), "Ambiguous reference");
            return Ok(None);
        }

        let folded = title.to_lowercase();
        let casefold: Vec<&String> = documents
            .iter()
            .filter(|p| file_stem(p).to_lowercase() == folded)
            .collect();
        match casefold.as_slice() {
            [only] => Ok(Some(NotePath::new(only.as_str()))),
            [] => Ok(None),
            many => {
                debug!(title = %title, candidates = many.len(), "Ambiguous reference");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl MetadataAccessor for StoreMetadataAccessor {
    async fn get_metadata(&self, path: &NotePath) -> ThreadResult<NoteMetadata> {
        let text = self.store.read(path.as_str()).await?;
        Ok(NoteMetadata::from_document(&text, &self.keys))
    }

    async fn resolve_reference(&self, text: &str, from: &NotePath) -> ThreadResult<Option<NotePath>> {
        let target = normalize_path(text);
        if target.is_empty() {
            return Ok(None);
        }

        let with_ext = self.with_extension(&target);
        let mut candidates = vec![with_ext.clone()];
        if !from.folder().is_empty() {
            candidates.push(join_path(from.folder(), &with_ext));
        }
        for candidate in candidates {
            if self.store.exists(&candidate).await? {
                return Ok(Some(NotePath::new(candidate)));
            }
        }

        if target.contains('/') {
            return Ok(None);
        }
        self.resolve_by_title(file_stem(&with_ext)).await
    }
}
