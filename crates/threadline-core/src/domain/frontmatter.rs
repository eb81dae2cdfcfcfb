//! Metadata block codec
//!
//! A metadata block is a leading `---` delimited section of `key: value`
//! lines. Reads go through `serde_yaml`; writes are line-level so every
//! property other than the one being upserted keeps its exact text, even
//! when the block as a whole is not valid YAML.

use serde_yaml::{Mapping, Value};
use tracing::debug;

const DELIMITER: &str = "---";
const BOM: char = '\u{feff}';

/// Value written into a metadata property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Rendered as a double-quoted YAML string
    Text(String),
    /// Rendered as `true` / `false`
    Bool(bool),
}

impl PropertyValue {
    /// Render the value as it appears after `key: `
    pub fn render(&self) -> String {
        match self {
            PropertyValue::Text(text) => {
                let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{}\"", escaped)
            }
            PropertyValue::Bool(flag) => flag.to_string(),
        }
    }
}

/// Byte offsets of a metadata block within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockSpan {
    /// Start of the first line after the opening delimiter
    inner_start: usize,
    /// Start of the closing delimiter line
    inner_end: usize,
}

fn locate_block(text: &str) -> Option<BlockSpan> {
    let offset = if text.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    let mut lines = text[offset..].split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let inner_start = offset + first.len();
    let mut cursor = inner_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == DELIMITER || trimmed == "..." {
            return Some(BlockSpan {
                inner_start,
                inner_end: cursor,
            });
        }
        cursor += line.len();
    }
    None
}

/// Returns the raw text between the delimiters, if the document has a block.
pub fn block_text(text: &str) -> Option<&str> {
    locate_block(text).map(|span| &text[span.inner_start..span.inner_end])
}

/// Parses the metadata block into a mapping.
///
/// Absent, empty and malformed blocks all read as an empty mapping.
pub fn read_properties(text: &str) -> Mapping {
    let Some(raw) = block_text(text) else {
        return Mapping::new();
    };
    if raw.trim().is_empty() {
        return Mapping::new();
    }

    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Mapping(mapping)) => mapping,
        Ok(_) => {
            debug!("Metadata block is not a mapping; treating as empty");
            Mapping::new()
        }
        Err(e) => {
            debug!(error = %e, "Malformed metadata block; treating as empty");
            Mapping::new()
        }
    }
}

fn top_level_key(line: &str) -> Option<&str> {
    if line.starts_with(char::is_whitespace) || line.starts_with('#') || line.starts_with('-') {
        return None;
    }
    let (key, _) = line.split_once(':')?;
    let key = key.trim();
    let key = key
        .strip_prefix('"')
        .and_then(|k| k.strip_suffix('"'))
        .or_else(|| key.strip_prefix('\'').and_then(|k| k.strip_suffix('\'')))
        .unwrap_or(key);
    Some(key)
}

fn is_continuation(line: &str) -> bool {
    let content = line.trim_end_matches(['\r', '\n']);
    !content.trim().is_empty() && (content.starts_with(char::is_whitespace) || content.starts_with('-'))
}

/// Sets `key` to `value` in the document's metadata block and returns the new text.
///
/// An existing top-level entry for `key` (including indented or hyphenated
/// continuation lines of a list value) is replaced in place. A missing key is
/// appended at the end of the block. A document without a block gets a new
/// block in front of its body.
pub fn upsert_property(text: &str, key: &str, value: &PropertyValue) -> String {
    let entry = format!("{}: {}\n", key, value.render());

    let Some(span) = locate_block(text) else {
        return format!("{}\n{}{}\n{}", DELIMITER, entry, DELIMITER, text);
    };

    let inner = &text[span.inner_start..span.inner_end];
    let mut rewritten = String::with_capacity(inner.len() + entry.len());
    let mut replaced = false;
    let mut skipping = false;

    for line in inner.split_inclusive('\n') {
        if skipping {
            if is_continuation(line) {
                continue;
            }
            skipping = false;
        }
        if !replaced && top_level_key(line) == Some(key) {
            rewritten.push_str(&entry);
            replaced = true;
            skipping = true;
            continue;
        }
        rewritten.push_str(line);
    }

    if !replaced {
        if !rewritten.is_empty() && !rewritten.ends_with('\n') {
            rewritten.push('\n');
        }
        rewritten.push_str(&entry);
    }

    let mut out = String::with_capacity(text.len() + entry.len());
    out.push_str(&text[..span.inner_start]);
    out.push_str(&rewritten);
    out.push_str(&text[span.inner_end..]);
    out
}

/// Renders a new document consisting of a metadata block and a body.
pub fn render_document(properties: &[(&str, PropertyValue)], body: &str) -> String {
    let mut out = String::from(DELIMITER);
    out.push('\n');
    for (key, value) in properties {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&value.render());
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(body);
    out
}
