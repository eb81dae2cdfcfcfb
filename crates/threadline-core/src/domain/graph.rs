//! Thread graph
//!
//! An in-memory view of how notes link into threads. The only stored
//! relation is the explicit predecessor of each note (`prev`); successors
//! (`next`) are derived by inverting it in [`ThreadGraph::rebuild_next`].
//!
//! A note with several successors forks: the successor flagged as main
//! thread (or, failing that, the first one seen) continues the thread and
//! the rest are replies.
//!
//! All queries are synchronous and do no I/O. Walks along `prev` keep a
//! visited set and report [`ThreadError::CycleDetected`] instead of looping.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ThreadError, ThreadResult};
use crate::types::NotePath;

/// The single graph instance shared between the builder, the insertion
/// service and readers.
pub type SharedThreadGraph = Arc<RwLock<ThreadGraph>>;

#[derive(Debug, Clone, Default)]
pub struct ThreadGraph {
    /// Explicit predecessor per known note; `None` marks a known root
    prev: HashMap<NotePath, Option<NotePath>>,
    /// Notes in the order they were first added
    order: Vec<NotePath>,
    /// Derived successors, in `order` order
    next: HashMap<NotePath, Vec<NotePath>>,
    main: HashMap<NotePath, bool>,
}

impl ThreadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a graph for sharing between collaborators
    pub fn shared(self) -> SharedThreadGraph {
        Arc::new(RwLock::new(self))
    }

    /// Set (or replace) the explicit predecessor of `node`.
    ///
    /// Successors are stale until [`rebuild_next`](Self::rebuild_next) runs.
    pub fn set_prev(&mut self, node: NotePath, prev: Option<NotePath>) {
        if !self.prev.contains_key(&node) {
            self.order.push(node.clone());
        }
        self.prev.insert(node, prev);
    }

    /// Like [`set_prev`](Self::set_prev), but a new `node` takes the place
    /// of `anchor` in insertion order instead of going last. Used when
    /// splicing a note in front of `anchor`, so the note inherits its
    /// precedence among siblings.
    pub fn insert_before(&mut self, node: NotePath, prev: Option<NotePath>, anchor: &NotePath) {
        if !self.prev.contains_key(&node) {
            match self.order.iter().position(|n| n == anchor) {
                Some(idx) => self.order.insert(idx, node.clone()),
                None => self.order.push(node.clone()),
            }
        }
        self.prev.insert(node, prev);
    }

    pub fn set_main_marker(&mut self, node: NotePath, is_main: bool) {
        self.main.insert(node, is_main);
    }

    pub fn get_prev(&self, node: &NotePath) -> Option<&NotePath> {
        self.prev.get(node).and_then(Option::as_ref)
    }

    /// Successors of `node`; empty for unknown notes
    pub fn get_next(&self, node: &NotePath) -> &[NotePath] {
        self.next.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_main(&self, node: &NotePath) -> bool {
        self.main.get(node).copied().unwrap_or(false)
    }

    /// The successor a forward walk follows from `node`
    pub fn get_main_continuation(&self, node: &NotePath) -> Option<&NotePath> {
        let successors = self.get_next(node);
        successors
            .iter()
            .find(|candidate| self.is_main(candidate))
            .or_else(|| successors.first())
    }

    /// Successors of `node` other than its main continuation
    pub fn get_replies(&self, node: &NotePath) -> Vec<NotePath> {
        let main = self.get_main_continuation(node);
        self.get_next(node)
            .iter()
            .filter(|candidate| Some(*candidate) != main)
            .cloned()
            .collect()
    }

    /// The notes from the thread root down to `node`, inclusive
    pub fn get_lineage(&self, node: &NotePath) -> ThreadResult<Vec<NotePath>> {
        let mut lineage = vec![node.clone()];
        let mut visited: HashSet<&NotePath> = HashSet::from([node]);
        let mut current = node;

        while let Some(prev) = self.get_prev(current) {
            if !visited.insert(prev) {
                return Err(ThreadError::CycleDetected {
                    start: node.clone(),
                    revisited: prev.clone(),
                });
            }
            lineage.push(prev.clone());
            current = prev;
        }

        lineage.reverse();
        Ok(lineage)
    }

    /// Follow `prev` edges back to a note without a predecessor
    pub fn get_thread_root(&self, node: &NotePath) -> ThreadResult<NotePath> {
        let mut visited: HashSet<&NotePath> = HashSet::from([node]);
        let mut current = node;

        while let Some(prev) = self.get_prev(current) {
            if !visited.insert(prev) {
                return Err(ThreadError::CycleDetected {
                    start: node.clone(),
                    revisited: prev.clone(),
                });
            }
            current = prev;
        }

        Ok(current.clone())
    }

    /// Append main continuations after the last element of `path`
    fn extend_forward(&self, start: &NotePath, path: &mut Vec<NotePath>) -> ThreadResult<()> {
        let mut visited: HashSet<NotePath> = path.iter().cloned().collect();
        let Some(mut current) = path.last().cloned() else {
            return Ok(());
        };

        while let Some(next) = self.get_main_continuation(&current) {
            if !visited.insert(next.clone()) {
                return Err(ThreadError::CycleDetected {
                    start: start.clone(),
                    revisited: next.clone(),
                });
            }
            path.push(next.clone());
            current = next.clone();
        }
        Ok(())
    }

    /// The canonical thread `node` belongs to: its root, then main
    /// continuations until none remain
    pub fn get_full_thread(&self, node: &NotePath) -> ThreadResult<Vec<NotePath>> {
        let mut thread = vec![self.get_thread_root(node)?];
        self.extend_forward(node, &mut thread)?;
        Ok(thread)
    }

    /// One chain per reply of `node`, in reply order.
    ///
    /// Each chain starts at the reply's thread root, runs down to the reply
    /// and continues along the reply's main continuations. The leading part
    /// repeats the notes shared with the main thread; callers that show both
    /// drop the overlap themselves.
    pub fn get_reply_chains(&self, node: &NotePath) -> ThreadResult<Vec<Vec<NotePath>>> {
        self.get_replies(node)
            .iter()
            .map(|reply| {
                let mut chain = self.get_lineage(reply)?;
                self.extend_forward(reply, &mut chain)?;
                Ok(chain)
            })
            .collect()
    }

    pub fn has_node(&self, node: &NotePath) -> bool {
        self.prev.contains_key(node)
    }

    /// Every known note, in insertion order
    pub fn get_all_nodes(&self) -> &[NotePath] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Recompute `next` as the inverse of `prev`
    pub fn rebuild_next(&mut self) {
        self.next.clear();
        for node in &self.order {
            if let Some(Some(prev)) = self.prev.get(node) {
                self.next.entry(prev.clone()).or_default().push(node.clone());
            }
        }
    }

    pub fn clear(&mut self) {
        self.prev.clear();
        self.order.clear();
        self.next.clear();
        self.main.clear();
    }

    /// Notes whose backward walk runs into a cycle
    pub fn find_cycles(&self) -> Vec<NotePath> {
        self.order
            .iter()
            .filter(|node| matches!(self.get_thread_root(node), Err(ThreadError::CycleDetected { .. })))
            .cloned()
            .collect()
    }
}
