//! One synchronization pass: walk, classify, parse, write.

use std::path::PathBuf;
use std::time::{Instant, SystemTime};

use tracing::{error, info};

use crate::config::IndexConfig;
use crate::error::{Result, VaultError};
use crate::grammar::{Classification, Grammar};
use crate::model::{EntryFailure, FailureStage, MetaKey, Node, PassError, SyncMode, SyncStats};
use crate::parse::ParsedNote;
use crate::store::{IndexStore, IndexWriter, SCHEMA_VERSION};
use crate::walker::{WalkEntry, epoch_seconds};

mod full;
mod incremental;

pub struct SyncCoordinator<'a> {
    store: &'a mut IndexStore,
    grammar: &'a Grammar,
    config: &'a IndexConfig,
    root: PathBuf,
}

impl<'a> SyncCoordinator<'a> {
    pub fn new(store: &'a mut IndexStore, grammar: &'a Grammar, config: &'a IndexConfig) -> Self {
        let root = store.vault_root().to_path_buf();
        Self {
            store,
            grammar,
            config,
            root,
        }
    }

    /// Incremental when the index is current and has completed a pass
    /// before, full otherwise.
    pub fn run(&mut self) -> std::result::Result<SyncStats, PassError> {
        match self.choose_mode() {
            Ok(SyncMode::Full) => self.run_full(),
            Ok(SyncMode::Incremental) => self.run_incremental(),
            Err(source) => Err(PassError {
                stats: SyncStats::default(),
                source,
            }),
        }
    }

    pub fn run_full(&mut self) -> std::result::Result<SyncStats, PassError> {
        self.timed(SyncMode::Full, |this, stats| this.full_pass(stats))
    }

    pub fn run_incremental(&mut self) -> std::result::Result<SyncStats, PassError> {
        self.timed(SyncMode::Incremental, |this, stats| {
            this.incremental_pass(stats)
        })
    }

    /// A missing root would look like an empty vault and wipe the index.
    fn ensure_root(&self) -> Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        Err(VaultError::InvalidPath(format!(
            "{} is not a directory",
            self.root.display()
        )))
    }

    fn choose_mode(&self) -> Result<SyncMode> {
        if self.store.needs_full_rebuild()? || self.store.last_sync_time()?.is_none() {
            return Ok(SyncMode::Full);
        }
        Ok(SyncMode::Incremental)
    }

    fn timed<F>(&mut self, mode: SyncMode, pass: F) -> std::result::Result<SyncStats, PassError>
    where
        F: FnOnce(&mut Self, &mut SyncStats) -> Result<()>,
    {
        let started = Instant::now();
        let mut stats = SyncStats::new(mode);
        info!("Starting {} sync of {}", mode, self.root.display());

        let outcome = pass(self, &mut stats);
        stats.elapsed = started.elapsed();

        match outcome {
            Ok(()) => {
                info!(
                    scanned = stats.scanned,
                    added = stats.added,
                    updated = stats.updated,
                    deleted = stats.deleted,
                    edges = stats.edges,
                    failed = stats.failures.len(),
                    "{} sync finished in {:?}",
                    mode,
                    stats.elapsed
                );
                Ok(stats)
            }
            Err(source) => {
                error!("{} sync rolled back: {}", mode, source);
                Err(PassError { stats, source })
            }
        }
    }
}

fn now_epoch() -> i64 {
    epoch_seconds(SystemTime::now())
}

fn directory_node(entry: &WalkEntry, classification: Classification) -> Node {
    Node {
        path: entry.rel_path.clone(),
        id: classification.id,
        entity_type: Some(classification.entity_type),
        name: classification.name,
        mtime: entry.mtime,
    }
}

/// Writes a note's node and its full edge set. Returns the edge count.
fn write_note(writer: &IndexWriter<'_>, note: &ParsedNote) -> Result<usize> {
    writer.upsert_node(&note.node)?;
    writer.replace_edges(&note.node.path, &note.links)
}

/// Records a failed entry write, unless the pass transaction can no longer
/// be trusted. Then the error ends the pass and the writer is rolled back.
fn record_write_error(
    writer: &IndexWriter<'_>,
    stats: &mut SyncStats,
    path: &str,
    err: VaultError,
) -> Result<()> {
    if err.is_fatal() || writer.is_aborted() {
        return Err(err);
    }
    stats.fail(EntryFailure::new(path, FailureStage::Write, err));
    Ok(())
}

/// Stamps the pass as complete. Runs last, inside the pass transaction.
/// `started_at` is taken before the walk, so an entry edited while the pass
/// ran is newer than the stamp and the next incremental pass revisits it.
fn finish_pass(writer: &IndexWriter<'_>, vault_hash: &str, started_at: i64) -> Result<()> {
    writer.set_meta(MetaKey::SchemaVersion, &SCHEMA_VERSION.to_string())?;
    writer.set_meta(MetaKey::VaultPathHash, vault_hash)?;
    writer.set_meta(MetaKey::LastSyncTime, &started_at.to_string())
}
