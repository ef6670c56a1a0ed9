use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::{DirEntry, WalkDir};

use crate::model::{EntryFailure, FailureStage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Relative to the walk root, `/`-separated.
    pub rel_path: String,
    pub name: String,
    pub is_dir: bool,
    /// Epoch seconds.
    pub mtime: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkItem {
    Entry(WalkEntry),
    Failed(EntryFailure),
}

/// Single-pass traversal of a vault. Dot-prefixed directories are pruned
/// with everything below them; the root itself is never yielded.
#[derive(Debug, Clone)]
pub struct PathWalker {
    root: PathBuf,
}

impl PathWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn walk(&self) -> impl Iterator<Item = WalkItem> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
            .map(move |res| match res {
                Ok(entry) => self.to_item(&entry),
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| self.display_rel(p))
                        .unwrap_or_default();
                    WalkItem::Failed(EntryFailure::new(path, FailureStage::Walk, err))
                }
            })
    }

    fn to_item(&self, entry: &DirEntry) -> WalkItem {
        let path = entry.path();
        let Some(rel_path) = rel_path(&self.root, path) else {
            return WalkItem::Failed(EntryFailure::new(
                self.display_rel(path),
                FailureStage::Walk,
                "path is not valid UTF-8",
            ));
        };
        let Some(name) = entry.file_name().to_str() else {
            return WalkItem::Failed(EntryFailure::new(
                rel_path,
                FailureStage::Walk,
                "name is not valid UTF-8",
            ));
        };
        let mtime = match entry.metadata() {
            Ok(meta) => meta.modified().map(epoch_seconds).unwrap_or(0),
            Err(err) => {
                return WalkItem::Failed(EntryFailure::new(rel_path, FailureStage::Walk, err));
            }
        };

        WalkItem::Entry(WalkEntry {
            path: path.to_path_buf(),
            rel_path,
            name: name.to_string(),
            is_dir: entry.file_type().is_dir(),
            mtime,
        })
    }

    fn display_rel(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

fn rel_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

pub fn epoch_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
