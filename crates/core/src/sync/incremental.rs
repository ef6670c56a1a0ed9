use std::collections::HashSet;

use tracing::debug;

use super::{SyncCoordinator, directory_node, now_epoch, record_write_error, write_note};
use crate::error::{Result, VaultError};
use crate::grammar::is_note;
use crate::model::{MetaKey, SyncStats};
use crate::parse::{NoteParser, NoteTask};
use crate::walker::{PathWalker, WalkItem};

impl SyncCoordinator<'_> {
    /// Reprocesses entries that are new or modified since the last pass and
    /// deletes indexed paths the walk no longer sees. Runs on one thread.
    pub(super) fn incremental_pass(&mut self, stats: &mut SyncStats) -> Result<()> {
        self.ensure_root()?;
        if self.store.needs_full_rebuild()? {
            return Err(VaultError::RebuildRequired(
                "schema version or vault path changed".to_string(),
            ));
        }
        let last_sync = self.store.last_sync_time()?.ok_or_else(|| {
            VaultError::RebuildRequired("no completed sync recorded".to_string())
        })?;

        let started_at = now_epoch();
        let grammar = self.grammar;
        let config = self.config;
        let walker = PathWalker::new(self.root.clone());
        let parser = NoteParser::new(grammar);
        let known = self.store.node_paths()?;
        let mut seen: HashSet<String> = HashSet::with_capacity(known.len());

        let writer = self.store.begin()?;

        for item in walker.walk() {
            let entry = match item {
                WalkItem::Entry(entry) => entry,
                WalkItem::Failed(failure) => {
                    // Kept as is; only a clean walk proves a deletion.
                    seen.insert(failure.path.clone());
                    stats.fail(failure);
                    continue;
                }
            };
            stats.scanned += 1;

            let is_known = known.contains(&entry.rel_path);
            if is_known && entry.mtime <= last_sync {
                seen.insert(entry.rel_path);
                continue;
            }

            if entry.is_dir {
                let classification = grammar.classify(&entry.name);
                if !classification.is_classified() {
                    continue;
                }
                debug!("Reprocessing directory {}", entry.rel_path);
                match writer.upsert_node(&directory_node(&entry, classification)) {
                    Ok(()) => count_write(stats, is_known),
                    Err(e) => record_write_error(&writer, stats, &entry.rel_path, e)?,
                }
                seen.insert(entry.rel_path);
            } else if is_note(&entry.path, &config.note_extensions) {
                let rel_path = entry.rel_path.clone();
                debug!("Reprocessing note {}", rel_path);
                match parser.parse(NoteTask::from(entry)) {
                    Ok(note) => match write_note(&writer, &note) {
                        Ok(edges) => {
                            count_write(stats, is_known);
                            stats.edges += edges;
                        }
                        Err(e) => record_write_error(&writer, stats, &rel_path, e)?,
                    },
                    // Keep what was indexed before; the next pass retries.
                    Err(failure) => stats.fail(failure),
                }
                seen.insert(rel_path);
            }
        }

        let mut vanished: Vec<&String> = known.difference(&seen).collect();
        vanished.sort();
        for path in vanished {
            debug!("Removing {}", path);
            match writer.delete_node(path) {
                Ok(_) => stats.deleted += 1,
                Err(e) => record_write_error(&writer, stats, path, e)?,
            }
        }

        writer.set_meta(MetaKey::LastSyncTime, &started_at.to_string())?;
        writer.commit()
    }
}

fn count_write(stats: &mut SyncStats, existed: bool) {
    if existed {
        stats.updated += 1;
    } else {
        stats.added += 1;
    }
}
