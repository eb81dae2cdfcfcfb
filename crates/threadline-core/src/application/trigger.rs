//! Trailing-blank-line trigger
//!
//! Watches document text as it is edited and signals an insertion when a
//! document ends in enough blank lines. A document fires once per crossing:
//! it re-arms only after its blank-line count drops back below the threshold.

use std::collections::HashSet;
use tracing::debug;

use crate::types::NotePath;

/// Emitted when a document crosses the blank-line threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSignal {
    pub path: NotePath,
    pub blank_lines: usize,
}

/// Number of line breaks after the last non-blank character
pub fn trailing_blank_lines(text: &str) -> usize {
    let content_end = text.trim_end().len();
    text[content_end..].chars().filter(|c| *c == '\n').count()
}

#[derive(Debug, Clone)]
pub struct BlankLineTrigger {
    threshold: usize,
    fired: HashSet<NotePath>,
}

impl BlankLineTrigger {
    /// A threshold of zero is treated as one
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            fired: HashSet::new(),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Feed the current text of `path`; returns a signal on a fresh crossing
    pub fn observe(&mut self, path: &NotePath, text: &str) -> Option<TriggerSignal> {
        let blank_lines = trailing_blank_lines(text);

        if blank_lines < self.threshold {
            if self.fired.remove(path) {
                debug!(path = %path, "Trigger re-armed");
            }
            return None;
        }

        if !self.fired.insert(path.clone()) {
            return None;
        }

        debug!(path = %path, blank_lines, "Trigger fired");
        Some(TriggerSignal {
            path: path.clone(),
            blank_lines,
        })
    }

    /// Forget state for a document (closed, renamed or deleted)
    pub fn forget(&mut self, path: &NotePath) {
        self.fired.remove(path);
    }
}
