/// Thread graph over note paths
pub mod graph;

/// Metadata block parsing and rewriting
pub mod frontmatter;

/// Wikilink syntax helpers
pub mod link;

/// Metadata accessor interface and store-backed implementation
pub mod metadata;
