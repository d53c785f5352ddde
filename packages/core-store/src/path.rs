//! API-style contents paths.
//!
//! A path is a `/`-separated unicode string. Leading and trailing slashes are
//! insignificant; the empty string is the virtual root. The first component
//! selects a mount point, the rest is handed to the mounted store.

/// Result of splitting a path at its first component.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct SplitPath {
    /// First component: the candidate mount prefix. Empty for the root.
    pub prefix: String,
    /// Everything after the first `/`. Empty when the path is a single component.
    pub remainder: String,
    /// The whole path with leading and trailing `/` removed.
    pub normalized: String,
}

impl SplitPath {
    /// True when the path addresses the virtual root.
    pub fn is_root(&self) -> bool {
        self.prefix.is_empty()
    }

    /// True when the path is a single component (a mount point, if mounted).
    pub fn is_top_level(&self) -> bool {
        !self.prefix.is_empty() && self.remainder.is_empty()
    }
}

/// Strip leading and trailing `/`.
///
/// ```rust
/// use mixedfs_core_store::normalize;
///
/// assert_eq!(normalize("/gdrive/notes/"), "gdrive/notes");
/// assert_eq!(normalize("///"), "");
/// ```
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Split a path into mount prefix and remainder.
///
/// ```rust
/// use mixedfs_core_store::split;
///
/// let split = split("/gdrive/notes/todo.ipynb");
/// assert_eq!(split.prefix, "gdrive");
/// assert_eq!(split.remainder, "notes/todo.ipynb");
/// assert_eq!(split.normalized, "gdrive/notes/todo.ipynb");
/// ```
pub fn split(path: &str) -> SplitPath {
    let normalized = normalize(path);
    let (prefix, remainder) = normalized.split_once('/').unwrap_or((normalized, ""));
    SplitPath {
        prefix: prefix.to_string(),
        remainder: remainder.to_string(),
        normalized: normalized.to_string(),
    }
}

/// Rebuild a full path from a mount prefix and a remainder.
pub fn join(prefix: &str, remainder: &str) -> String {
    match (prefix.is_empty(), remainder.is_empty()) {
        (true, _) => remainder.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, remainder),
    }
}

/// Last component of a path, or the empty string for the root.
pub fn file_name(path: &str) -> &str {
    let path = normalize(path);
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Everything but the last component.
pub fn parent(path: &str) -> &str {
    let path = normalize(path);
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Split a file name into stem and extension (extension keeps its dot).
///
/// Dotfiles have no extension: `.bashrc` is all stem.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(i) => name.split_at(i),
    }
}
