use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use threadline_core::domain::link::strip_link_decoration;
use threadline_core::{
    BuildSummary, CreatedNote, MetadataAccessor, NotePath, ThreadConfig, ThreadError, ThreadResult, ThreadView,
    ThreadWorkspace,
};
use threadline_store::path::normalize_path;
use threadline_store::FsDocumentStore;
use tracing::debug;

/// Configuration file picked up from the vault root when `--config` is absent
pub const VAULT_CONFIG_FILE: &str = ".threadline.yaml";

/// Command output with a plain-text rendering next to its JSON form
pub trait Report: Serialize {
    fn render_text(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeEntry {
    pub path: NotePath,
    pub prev: Option<NotePath>,
    pub main_thread: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NodeList(pub Vec<NodeEntry>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    #[serde(flatten)]
    pub summary: BuildSummary,
    pub cycles: Vec<NotePath>,
}

impl Report for NodeList {
    fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.0 {
            let prev = entry.prev.as_ref().map(NotePath::as_str).unwrap_or("(root)");
            let marker = if entry.main_thread { " [main]" } else { "" };
            let _ = writeln!(out, "{} <- {}{}", entry.path, prev, marker);
        }
        out
    }
}

impl Report for ThreadView {
    fn render_text(&self) -> String {
        let mut out = String::new();
        for (idx, note) in self.thread.iter().enumerate() {
            let here = if note == &self.note { "  <" } else { "" };
            let _ = writeln!(out, "{:>3}. {}{}", idx + 1, note, here);
        }
        for reply in &self.replies {
            let branch: Vec<&str> = reply.branch_notes().iter().map(NotePath::as_str).collect();
            let _ = writeln!(out, "  reply from {}: {}", reply.from, branch.join(" -> "));
        }
        out
    }
}

impl Report for CreatedNote {
    fn render_text(&self) -> String {
        format!("Created {}\n", self.path)
    }
}

impl Report for CheckReport {
    fn render_text(&self) -> String {
        let mut out = format!(
            "{} notes, {} links, {} dangling, {} unreadable\n",
            self.summary.documents, self.summary.edges, self.summary.dangling, self.summary.degraded
        );
        if self.cycles.is_empty() {
            out.push_str("No cycles\n");
        }
        for note in &self.cycles {
            let _ = writeln!(out, "cycle: {}", note);
        }
        out
    }
}

/// Explicit file first, then the vault's own config file, then defaults
pub fn load_config(vault: &Path, explicit: Option<&Path>) -> ThreadResult<ThreadConfig> {
    if explicit.is_some() {
        return ThreadConfig::load(explicit);
    }
    let in_vault = vault.join(VAULT_CONFIG_FILE);
    if in_vault.is_file() {
        debug!(path = %in_vault.display(), "Using vault configuration");
        ThreadConfig::load(Some(&in_vault))
    } else {
        ThreadConfig::load(None)
    }
}

/// Workspace over `vault` with its graph built
pub async fn open_workspace(vault: &Path, config: ThreadConfig) -> ThreadResult<(ThreadWorkspace, BuildSummary)> {
    let store = Arc::new(FsDocumentStore::new(vault));
    let workspace = ThreadWorkspace::new(store, config);
    let summary = workspace.rebuild().await?;
    Ok((workspace, summary))
}

/// Accepts a vault path or any reference a `prev` property could hold
pub async fn resolve_note(workspace: &ThreadWorkspace, arg: &str) -> ThreadResult<NotePath> {
    let direct = NotePath::new(normalize_path(arg));
    if workspace.graph().read().await.has_node(&direct) {
        return Ok(direct);
    }

    let bare = strip_link_decoration(arg);
    workspace
        .accessor()
        .resolve_reference(&bare, &NotePath::new(""))
        .await?
        .ok_or_else(|| ThreadError::NoteNotFound(arg.to_string()))
}

pub async fn run_nodes(workspace: &ThreadWorkspace) -> NodeList {
    let graph = workspace.graph();
    let graph = graph.read().await;
    NodeList(
        graph
            .get_all_nodes()
            .iter()
            .map(|path| NodeEntry {
                path: path.clone(),
                prev: graph.get_prev(path).cloned(),
                main_thread: graph.is_main(path),
            })
            .collect(),
    )
}

pub async fn run_thread(workspace: &ThreadWorkspace, note: &str) -> ThreadResult<ThreadView> {
    let path = resolve_note(workspace, note).await?;
    workspace.thread_view(&path).await
}

pub async fn run_insert(workspace: &ThreadWorkspace, note: &str) -> ThreadResult<CreatedNote> {
    let path = resolve_note(workspace, note).await?;
    workspace.insert_after(&path).await
}

pub async fn run_check(workspace: &ThreadWorkspace, summary: BuildSummary) -> CheckReport {
    CheckReport {
        summary,
        cycles: workspace.find_cycles().await,
    }
}
