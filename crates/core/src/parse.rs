use std::path::PathBuf;

use jdvault_ingest::Executor;

use crate::grammar::{Grammar, LinkRef};
use crate::model::{EntryFailure, FailureStage, Node};
use crate::walker::WalkEntry;

/// A note file queued for parsing.
#[derive(Debug, Clone)]
pub struct NoteTask {
    pub path: PathBuf,
    pub rel_path: String,
    pub mtime: i64,
}

impl From<WalkEntry> for NoteTask {
    fn from(entry: WalkEntry) -> Self {
        Self {
            path: entry.path,
            rel_path: entry.rel_path,
            mtime: entry.mtime,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNote {
    pub node: Node,
    pub links: Vec<LinkRef>,
}

pub type ParseOutcome = Result<ParsedNote, EntryFailure>;

/// Reads a note and extracts its ID links. Holds no mutable state, so one
/// instance serves every worker.
#[derive(Debug, Clone, Copy)]
pub struct NoteParser<'g> {
    grammar: &'g Grammar,
}

impl<'g> NoteParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    pub fn parse(&self, task: NoteTask) -> ParseOutcome {
        let bytes = std::fs::read(&task.path)
            .map_err(|e| EntryFailure::new(task.rel_path.as_str(), FailureStage::Read, e))?;
        let content = String::from_utf8_lossy(&bytes);
        let links = self.grammar.extract_links(&content);

        let name = task
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ParsedNote {
            node: Node {
                path: task.rel_path,
                id: None,
                entity_type: None,
                name,
                mtime: task.mtime,
            },
            links,
        })
    }
}

impl Executor<NoteTask, ParseOutcome> for NoteParser<'_> {
    fn execute(&self, item: NoteTask) -> ParseOutcome {
        self.parse(item)
    }
}
