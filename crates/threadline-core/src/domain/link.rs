//! Wikilink syntax used in reference properties (`[[target]]`, `[[target|alias]]`).

/// Strips link decoration from a reference value and returns the bare target.
///
/// Removes surrounding double brackets (and a leading `!` embed marker) and
/// drops a trailing `|alias`. Text without brackets is returned trimmed, minus
/// any alias. An empty result means the value carried no reference.
pub fn strip_link_decoration(value: &str) -> String {
    let mut inner = value.trim();
    inner = inner.strip_prefix('!').unwrap_or(inner);
    if let Some(rest) = inner.strip_prefix("[[") {
        inner = rest;
        inner = inner.strip_suffix("]]").unwrap_or(inner);
    }

    let target = match inner.split_once('|') {
        Some((left, _alias)) => left,
        None => inner,
    };
    target.trim().to_string()
}

/// Formats a target as a wikilink.
pub fn format_link(target: &str) -> String {
    format!("[[{}]]", target)
}
