use rusqlite::{Transaction, params};

use crate::error::Result;
use crate::grammar::LinkRef;
use crate::model::{MetaKey, Node};

/// All writes of one transaction. Dropping the writer without calling
/// [`IndexWriter::commit`] rolls everything back.
///
/// Not `Sync`: a pass parses on many threads but writes from one.
pub struct IndexWriter<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> IndexWriter<'conn> {
    pub(crate) fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }

    /// Removes every node and edge. Meta rows are kept.
    pub fn clear(&self) -> Result<()> {
        self.tx.execute_batch("DELETE FROM edges; DELETE FROM nodes;")?;
        Ok(())
    }

    pub fn upsert_node(&self, node: &Node) -> Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO nodes (path, id, type, name, mtime) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(path) DO UPDATE SET
                     id = excluded.id,
                     type = excluded.type,
                     name = excluded.name,
                     mtime = excluded.mtime",
            )?
            .execute(params![
                node.path,
                node.id,
                node.entity_type.map(|t| t.as_str()),
                node.name,
                node.mtime,
            ])?;
        Ok(())
    }

    /// Deletes the node at `path` together with the edges it sourced.
    /// Returns the number of node rows removed.
    pub fn delete_node(&self, path: &str) -> Result<usize> {
        self.delete_edges_from_file(path)?;
        let removed = self
            .tx
            .prepare_cached("DELETE FROM nodes WHERE path = ?1")?
            .execute([path])?;
        Ok(removed)
    }

    /// Moves a node and everything below it from `old` to `new`, including
    /// the source side of their edges. ID, type and name are left as they
    /// were; re-upsert the node if its name changed.
    pub fn rename_node(&self, old: &str, new: &str) -> Result<usize> {
        let moved = self
            .tx
            .prepare_cached(
                "UPDATE nodes SET path = ?2 || substr(path, length(?1) + 1)
                 WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'",
            )?
            .execute([old, new])?;
        self.tx
            .prepare_cached(
                "UPDATE edges SET source_path = ?2 || substr(source_path, length(?1) + 1)
                 WHERE source_path = ?1
                    OR substr(source_path, 1, length(?1) + 1) = ?1 || '/'",
            )?
            .execute([old, new])?;
        Ok(moved)
    }

    pub fn insert_edge(&self, source_path: &str, link: &LinkRef) -> Result<()> {
        self.tx
            .prepare_cached(
                "INSERT OR REPLACE INTO edges (source_path, target_id, link_text)
                 VALUES (?1, ?2, ?3)",
            )?
            .execute(params![source_path, link.target_id, link.link_text])?;
        Ok(())
    }

    /// Must run before a changed file's edges are inserted again.
    pub fn delete_edges_from_file(&self, source_path: &str) -> Result<usize> {
        let removed = self
            .tx
            .prepare_cached("DELETE FROM edges WHERE source_path = ?1")?
            .execute([source_path])?;
        Ok(removed)
    }

    /// Repoints every edge aimed at `old_id`. Link text is kept verbatim.
    pub fn update_edge_target(&self, old_id: &str, new_id: &str) -> Result<usize> {
        let updated = self
            .tx
            .prepare_cached("UPDATE edges SET target_id = ?2 WHERE target_id = ?1")?
            .execute([old_id, new_id])?;
        Ok(updated)
    }

    /// Replaces the edges sourced by `source_path` with `links`.
    pub fn replace_edges(&self, source_path: &str, links: &[LinkRef]) -> Result<usize> {
        self.delete_edges_from_file(source_path)?;
        for link in links {
            self.insert_edge(source_path, link)?;
        }
        Ok(links.len())
    }

    pub fn set_meta(&self, key: MetaKey, value: &str) -> Result<()> {
        self.tx
            .prepare_cached("INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)")?
            .execute([key.as_str(), value])?;
        Ok(())
    }

    /// True once SQLite has rolled the transaction back on its own. Any
    /// further write would then run in autocommit mode.
    pub fn is_aborted(&self) -> bool {
        self.tx.is_autocommit()
    }

    pub fn commit(self) -> Result<()> {
        // Cached statements live only as long as the transaction that used them.
        self.tx.flush_prepared_statement_cache();
        self.tx.commit()?;
        Ok(())
    }

    pub fn rollback(self) -> Result<()> {
        self.tx.flush_prepared_statement_cache();
        self.tx.rollback()?;
        Ok(())
    }
}
