use jdvault_ingest::{CommitSink, IngestError, WorkerPool};
use tracing::debug;

use super::{SyncCoordinator, directory_node, finish_pass, now_epoch, record_write_error, write_note};
use crate::error::{Result, VaultError};
use crate::grammar::is_note;
use crate::model::SyncStats;
use crate::parse::{NoteParser, NoteTask, ParseOutcome};
use crate::store::IndexWriter;
use crate::walker::{PathWalker, WalkItem};

/// Single consumer of parse results; the only place a full pass writes notes.
struct NoteSink<'w, 'conn> {
    writer: &'w IndexWriter<'conn>,
    stats: &'w mut SyncStats,
    /// Set when a write error ends the pass; the pool is stopped through
    /// the returned `IngestError`.
    fatal: Option<VaultError>,
}

impl CommitSink<ParseOutcome> for NoteSink<'_, '_> {
    fn commit(&mut self, outcome: ParseOutcome) -> std::result::Result<(), IngestError> {
        let note = match outcome {
            Ok(note) => note,
            Err(failure) => {
                self.stats.fail(failure);
                return Ok(());
            }
        };
        let written = match write_note(self.writer, &note) {
            Ok(edges) => {
                self.stats.added += 1;
                self.stats.edges += edges;
                Ok(())
            }
            Err(e) => record_write_error(self.writer, self.stats, &note.node.path, e),
        };
        written.map_err(|e| {
            let stop = IngestError::Commit(e.to_string());
            self.fatal = Some(e);
            stop
        })
    }
}

impl SyncCoordinator<'_> {
    /// Wipes the index, inserts classified directories during the walk and
    /// hands note files to the worker pool.
    pub(super) fn full_pass(&mut self, stats: &mut SyncStats) -> Result<()> {
        self.ensure_root()?;
        let started_at = now_epoch();
        let grammar = self.grammar;
        let config = self.config;
        let walker = PathWalker::new(self.root.clone());
        let vault_hash = self.store.vault_hash().to_string();

        let writer = self.store.begin()?;
        writer.clear()?;

        let mut work = Vec::new();
        for item in walker.walk() {
            let entry = match item {
                WalkItem::Entry(entry) => entry,
                WalkItem::Failed(failure) => {
                    stats.fail(failure);
                    continue;
                }
            };
            stats.scanned += 1;

            if entry.is_dir {
                let classification = grammar.classify(&entry.name);
                if !classification.is_classified() {
                    continue;
                }
                match writer.upsert_node(&directory_node(&entry, classification)) {
                    Ok(()) => stats.added += 1,
                    Err(e) => record_write_error(&writer, stats, &entry.rel_path, e)?,
                }
            } else if is_note(&entry.path, &config.note_extensions) {
                work.push(NoteTask::from(entry));
            }
        }

        debug!("Parsing {} note files", work.len());
        let parser = NoteParser::new(grammar);
        let pool = WorkerPool::new(&config.pool_config());
        let mut sink = NoteSink {
            writer: &writer,
            stats,
            fatal: None,
        };
        let run = pool.run(work, &parser, &mut sink);
        if let Some(fatal) = sink.fatal.take() {
            return Err(fatal);
        }
        run?;

        finish_pass(&writer, &vault_hash, started_at)?;
        writer.commit()
    }
}
