//! Recursive traversal of a shared directory.

use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::manifest::SkippedFile;

/// A regular file to be added to the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    /// Absolute path to read from.
    pub source: PathBuf,
    /// Entry name inside the archive.
    pub name: String,
}

type VisibleFilter = fn(&DirEntry) -> bool;

/// Yields one [`ArchiveJob`] per regular file under a root.
///
/// Entries whose name starts with `.` are skipped together with everything
/// below them. Symlinks are included only when they resolve to a regular
/// file; directory symlinks are not descended into. Unreadable entries are
/// yielded as [`SkippedFile`] and traversal continues.
pub struct FileWalker {
    root: PathBuf,
    inner: walkdir::FilterEntry<walkdir::IntoIter, VisibleFilter>,
}

impl FileWalker {
    /// Walk everything below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let inner = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_visible as VisibleFilter);
        Self { root, inner }
    }

    fn entry_name(&self, path: &Path) -> String {
        relative_name(&self.root, path)
    }
}

impl Iterator for FileWalker {
    type Item = Result<ArchiveJob, SkippedFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| self.entry_name(p))
                        .unwrap_or_default();
                    return Some(Err(SkippedFile {
                        path,
                        reason: err.to_string(),
                    }));
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                match std::fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => {}
                    Ok(_) => continue,
                    Err(err) => {
                        return Some(Err(SkippedFile {
                            path: self.entry_name(entry.path()),
                            reason: err.to_string(),
                        }));
                    }
                }
            } else if !file_type.is_file() {
                continue;
            }

            let name = self.entry_name(entry.path());
            return Some(Ok(ArchiveJob {
                source: entry.into_path(),
                name,
            }));
        }
    }
}

fn is_visible(entry: &DirEntry) -> bool {
    entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
}

/// `/`-joined path of `path` relative to `root`.
pub(crate) fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
