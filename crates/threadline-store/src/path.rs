//! Helpers for vault-relative document paths.

/// Normalizes a path: backslashes become `/`, leading `./` and `/` are removed
/// and repeated separators collapse.
pub fn normalize_path(s: &str) -> String {
    let replaced = s.trim().replace('\\', "/");
    let mut out = replaced.as_str();
    loop {
        if let Some(rest) = out.strip_prefix("./") {
            out = rest;
        } else if let Some(rest) = out.strip_prefix('/') {
            out = rest;
        } else {
            break;
        }
    }
    out.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the folder part of a path, or `""` for a top-level document.
pub fn parent_folder(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Returns the file name without its extension.
pub fn file_stem(path: &str) -> &str {
    let name = match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    };
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Returns the path without its final extension.
pub fn strip_extension(path: &str) -> &str {
    let stem = file_stem(path);
    let folder = parent_folder(path);
    if folder.is_empty() {
        stem
    } else {
        &path[..folder.len() + 1 + stem.len()]
    }
}

/// Returns true if the path's file name has the given extension (case-insensitive).
pub fn has_extension(path: &str, extension: &str) -> bool {
    let name = match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    };
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx + 1..].eq_ignore_ascii_case(extension),
        _ => false,
    }
}

/// Joins a folder and a relative path.
pub fn join_path(folder: &str, rest: &str) -> String {
    if folder.is_empty() {
        normalize_path(rest)
    } else {
        normalize_path(&format!("{}/{}", folder, rest))
    }
}
