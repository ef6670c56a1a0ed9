//! SQLite-backed index of nodes, edges and pass metadata for one vault.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use crate::config::{IndexConfig, resolve_vault_path, vault_path_hash};
use crate::error::{Result, VaultError};
use crate::grammar::LinkRef;
use crate::model::{MetaKey, Node};

mod query;
mod schema;
mod writer;

pub use query::IndexCounts;
pub use schema::SCHEMA_VERSION;
pub use writer::IndexWriter;

pub struct IndexStore {
    conn: Connection,
    db_path: PathBuf,
    vault_root: PathBuf,
    vault_hash: String,
}

impl IndexStore {
    /// Opens (creating if needed) the index for `vault` at its derived
    /// location under the configured index directory.
    pub fn open(vault: &Path, config: &IndexConfig) -> Result<Self> {
        let db_path = config.index_path_for(vault)?;
        Self::open_at(&db_path, vault, config)
    }

    /// Opens the index file at an explicit location.
    pub fn open_at(db_path: &Path, vault: &Path, config: &IndexConfig) -> Result<Self> {
        let vault_root = resolve_vault_path(vault)?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        schema::configure(&conn, config)?;
        schema::initialize(&conn)?;

        let vault_hash = vault_path_hash(&vault_root);
        info!(
            "Opened index {} for vault {}",
            db_path.display(),
            vault_root.display()
        );

        Ok(Self {
            conn,
            db_path: db_path.to_path_buf(),
            vault_root,
            vault_hash,
        })
    }

    /// Deletes the index file of `vault` with its WAL side files. Returns
    /// whether anything was removed.
    pub fn remove(vault: &Path, config: &IndexConfig) -> Result<bool> {
        let db_path = config.index_path_for(vault)?;
        let mut removed = false;
        for suffix in ["", "-wal", "-shm"] {
            let mut name = db_path.clone().into_os_string();
            name.push(suffix);
            let path = PathBuf::from(name);
            if path.exists() {
                std::fs::remove_file(&path)?;
                removed = true;
            }
        }
        if removed {
            info!("Removed index {}", db_path.display());
        }
        Ok(removed)
    }

    /// Deletes every index under the configured index directory.
    pub fn remove_all(config: &IndexConfig) -> Result<()> {
        let base_dir = config.base_index_dir();
        if base_dir.exists() {
            std::fs::remove_dir_all(&base_dir)?;
            info!("Removed all indices under {}", base_dir.display());
        }
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        debug!("Closing index {}", self.db_path.display());
        self.conn.close().map_err(|(_, e)| VaultError::Store(e))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    pub fn vault_hash(&self) -> &str {
        &self.vault_hash
    }

    /// Starts the single transaction a pass (or a live edit) writes through.
    pub fn begin(&mut self) -> Result<IndexWriter<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(IndexWriter::new(tx))
    }

    pub fn meta(&self, key: MetaKey) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn last_sync_time(&self) -> Result<Option<i64>> {
        match self.meta(MetaKey::LastSyncTime)? {
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                VaultError::Internal(format!("corrupt last_sync_time value '{raw}'"))
            }),
            None => Ok(None),
        }
    }

    /// True when the stored schema version or vault path hash is missing or
    /// differs from the running ones.
    pub fn needs_full_rebuild(&self) -> Result<bool> {
        let schema = self.meta(MetaKey::SchemaVersion)?;
        if schema.as_deref() != Some(SCHEMA_VERSION.to_string().as_str()) {
            return Ok(true);
        }
        let hash = self.meta(MetaKey::VaultPathHash)?;
        Ok(hash.as_deref() != Some(self.vault_hash.as_str()))
    }

    // ---- Live mutations, each in its own short transaction ----

    pub fn upsert_node(&mut self, node: &Node) -> Result<()> {
        let writer = self.begin()?;
        writer.upsert_node(node)?;
        writer.commit()
    }

    pub fn delete_node(&mut self, path: &str) -> Result<usize> {
        let writer = self.begin()?;
        let removed = writer.delete_node(path)?;
        writer.commit()?;
        Ok(removed)
    }

    pub fn rename_node(&mut self, old: &str, new: &str) -> Result<usize> {
        let writer = self.begin()?;
        let moved = writer.rename_node(old, new)?;
        writer.commit()?;
        Ok(moved)
    }

    pub fn replace_edges(&mut self, source_path: &str, links: &[LinkRef]) -> Result<usize> {
        let writer = self.begin()?;
        let inserted = writer.replace_edges(source_path, links)?;
        writer.commit()?;
        Ok(inserted)
    }

    pub fn update_edge_target(&mut self, old_id: &str, new_id: &str) -> Result<usize> {
        let writer = self.begin()?;
        let updated = writer.update_edge_target(old_id, new_id)?;
        writer.commit()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::model::{Edge, SyncMode};
    use crate::vault::VaultIndex;

    type Snapshot = (IndexCounts, Vec<Node>, Vec<Edge>, Option<i64>);

    fn snapshot(store: &IndexStore) -> Snapshot {
        (
            store.counts().unwrap(),
            store.nodes().unwrap(),
            store.edges().unwrap(),
            store.last_sync_time().unwrap(),
        )
    }

    /// Notes `from..to` under one category, forty links each.
    fn write_notes(root: &Path, from: usize, to: usize) {
        let body: String = (1..=40).map(|j| format!("[[S01.11.{j:02}]]\n")).collect();
        let dir = root.join("S01 Personal/S01.11 Finance");
        fs::create_dir_all(&dir).unwrap();
        for i in from..to {
            fs::write(dir.join(format!("note-{i:04}.md")), &body).unwrap();
        }
    }

    /// Forbids the database file from growing past its current size.
    fn cap_at_current_size(store: &IndexStore) {
        let pages: i64 = store
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))
            .unwrap();
        let _max: i64 = store
            .conn
            .pragma_update_and_check(None, "max_page_count", pages, |row| row.get(0))
            .unwrap();
    }

    fn indexed_vault() -> (tempfile::TempDir, tempfile::TempDir, VaultIndex) {
        let vault = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_notes(vault.path(), 0, 400);

        let config = IndexConfig::default().with_index_dir(index_dir.path());
        let mut index = VaultIndex::open_with(vault.path(), config).unwrap();
        let stats = index.sync_full().unwrap();
        assert_eq!(stats.edges, 16_000);
        (vault, index_dir, index)
    }

    #[test]
    fn test_full_pass_that_runs_out_of_space_changes_nothing() {
        let (vault, _index_dir, mut index) = indexed_vault();
        let before = snapshot(index.store());

        cap_at_current_size(index.store());
        write_notes(vault.path(), 400, 800);

        let err = index.sync_full().unwrap_err();
        assert_eq!(err.stats.mode, SyncMode::Full);
        assert!(matches!(err.source, VaultError::Store(_)));
        assert!(err.source.is_fatal());
        assert_eq!(snapshot(index.store()), before);
        assert!(!index.store().needs_full_rebuild().unwrap());
    }

    #[test]
    fn test_incremental_pass_that_runs_out_of_space_changes_nothing() {
        let (vault, _index_dir, mut index) = indexed_vault();
        let before = snapshot(index.store());

        cap_at_current_size(index.store());
        write_notes(vault.path(), 400, 800);

        let err = index.sync_incremental().unwrap_err();
        assert_eq!(err.stats.mode, SyncMode::Incremental);
        assert!(err.source.is_fatal());
        // The pass stopped at the first failed write instead of skipping it.
        assert!(err.stats.failures.is_empty());
        assert_eq!(snapshot(index.store()), before);
    }
}
