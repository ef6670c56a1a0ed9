use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::error::VaultError;
use crate::grammar::EntityType;

/// An indexed filesystem entry: a classified directory or a note file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Node {
    /// Relative to the vault root, `/`-separated. Primary key.
    pub path: String,
    pub id: Option<String>,
    pub entity_type: Option<EntityType>,
    pub name: String,
    /// Epoch seconds.
    pub mtime: i64,
}

/// A reference from a note file to a hierarchical ID. The target need not
/// exist as a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub source_path: String,
    pub target_id: String,
    pub link_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKey {
    SchemaVersion,
    VaultPathHash,
    LastSyncTime,
}

impl MetaKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaKey::SchemaVersion => "schema_version",
            MetaKey::VaultPathHash => "vault_path_hash",
            MetaKey::LastSyncTime => "last_sync_time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SyncMode {
    #[default]
    Full,
    Incremental,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Full => f.write_str("full"),
            SyncMode::Incremental => f.write_str("incremental"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureStage {
    Walk,
    Read,
    Write,
}

/// One entry the pass could not index. The pass itself continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    pub path: String,
    pub stage: FailureStage,
    pub reason: String,
}

impl EntryFailure {
    pub fn new(path: impl Into<String>, stage: FailureStage, reason: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            stage,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub mode: SyncMode,
    /// Entries visited by the walk.
    pub scanned: usize,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub edges: usize,
    pub failures: Vec<EntryFailure>,
    pub elapsed: Duration,
}

impl SyncStats {
    pub fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub(crate) fn fail(&mut self, failure: EntryFailure) {
        tracing::warn!(
            "skipping {} ({:?}): {}",
            failure.path,
            failure.stage,
            failure.reason
        );
        self.failures.push(failure);
    }
}

/// A pass that could not commit. The index is unchanged; `stats` tells how
/// far the pass got.
#[derive(Debug, Error)]
#[error("{} sync failed after {:?}: {source}", .stats.mode, .stats.elapsed)]
pub struct PassError {
    pub stats: SyncStats,
    #[source]
    pub source: VaultError,
}
