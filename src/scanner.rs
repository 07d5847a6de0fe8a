use super::log;
use super::types::SourceRef;
use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};

pub const RECORD_EXTENSION: &str = "sgf";
pub const COMPRESSED_EXTENSION: &str = "zst";

/// Read access to a tree of record files.
pub trait FileTree {
    fn list_children(&self, container: &Path) -> io::Result<Vec<PathBuf>>;

    fn is_container(&self, entry: &Path) -> bool;

    fn extension_of(&self, entry: &Path) -> Option<String> {
        entry
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
    }

    fn read_text(&self, file: &Path) -> io::Result<String>;

    /// Key shared by every path that reaches the same container, such as a
    /// link and its target. `None` when it cannot be resolved.
    fn container_identity(&self, container: &Path) -> Option<PathBuf> {
        Some(container.to_path_buf())
    }
}

/// `*.sgf`, or a zstd-compressed `*.sgf.zst`, compared case-insensitively.
pub fn is_record_file<T: FileTree + ?Sized>(tree: &T, entry: &Path) -> bool {
    let Some(ext) = tree.extension_of(entry) else {
        return false;
    };

    if ext.eq_ignore_ascii_case(RECORD_EXTENSION) {
        return true;
    }

    ext.eq_ignore_ascii_case(COMPRESSED_EXTENSION)
        && entry
            .file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .is_some_and(|inner| inner.eq_ignore_ascii_case(RECORD_EXTENSION))
}

/// Collects every record file below `root`.
///
/// Traversal uses an explicit stack, so the order of the result is not
/// meaningful. A root that is not an existing container yields nothing, and a
/// container that cannot be listed is skipped. A container reached a second
/// time, e.g. through a link back to an ancestor, is not walked again.
pub fn scan<T: FileTree + ?Sized>(tree: &T, root: &Path) -> Vec<SourceRef> {
    let mut found = Vec::new();
    if !tree.is_container(root) {
        return found;
    }

    let mut visited = HashSet::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(container) = stack.pop() {
        if let Some(identity) = tree.container_identity(&container)
            && !visited.insert(identity)
        {
            log::debug(format!(
                "Skipping '{}': folder already visited",
                container.display()
            ));
            continue;
        }

        let children = match tree.list_children(&container) {
            Ok(children) => children,
            Err(e) => {
                log::warn(format!(
                    "Skipping unreadable folder '{}': {}",
                    container.display(),
                    e
                ));
                continue;
            }
        };

        for child in children {
            if tree.is_container(&child) {
                stack.push(child);
            } else if is_record_file(tree, &child) {
                found.push(SourceRef::under(root, child));
            }
        }
    }

    log::debug(format!(
        "Found {} record file(s) under '{}'",
        found.len(),
        root.display()
    ));
    found
}

pub fn is_glob_pattern(root: &str) -> bool {
    root.contains('*') || root.contains('?') || root.contains('[')
}

/// Leading components of `pattern` that contain no wildcard.
fn glob_base(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| match c {
            Component::Normal(part) => !is_glob_pattern(&part.to_string_lossy()),
            _ => true,
        })
        .collect()
}

/// Expands a glob such as `games/**/*.sgf` to the record files it names.
/// Entries that cannot be read while expanding are logged and skipped.
pub fn scan_pattern<T: FileTree + ?Sized>(
    tree: &T,
    pattern: &str,
) -> Result<Vec<SourceRef>, glob::PatternError> {
    let base = glob_base(pattern);
    let mut found = Vec::new();
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) => {
                if !tree.is_container(&path) && is_record_file(tree, &path) {
                    found.push(SourceRef::under(&base, path));
                }
            }
            Err(e) => log::warn(format!("Skipping glob entry: {e}")),
        }
    }
    Ok(found)
}
