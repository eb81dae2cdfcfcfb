//! Shared identifier types

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use threadline_store::path;

/// Vault-relative path of a document; the node identity in a thread graph.
///
/// No normalization is applied beyond what the producer guarantees: two
/// `NotePath`s are the same node exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotePath(pub String);

impl NotePath {
    /// Create a note path
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Get the string representation of the path
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String
    pub fn into_string(self) -> String {
        self.0
    }

    /// File name without extension
    pub fn basename(&self) -> &str {
        path::file_stem(&self.0)
    }

    /// Folder containing the note, `""` at the vault root
    pub fn folder(&self) -> &str {
        path::parent_folder(&self.0)
    }

    /// Path without its extension, as used in path-qualified links
    pub fn without_extension(&self) -> &str {
        path::strip_extension(&self.0)
    }
}

impl Display for NotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NotePath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NotePath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for NotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
