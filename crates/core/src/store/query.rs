use std::collections::HashSet;

use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row};
use serde::Serialize;

use super::IndexStore;
use crate::error::{Result, VaultError};
use crate::grammar::EntityType;
use crate::model::{Edge, Node};

const NODE_COLUMNS: &str = "path, id, type, name, mtime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IndexCounts {
    pub nodes: usize,
    pub edges: usize,
}

impl IndexStore {
    pub fn node_by_path(&self, path: &str) -> Result<Option<Node>> {
        let node = self
            .conn
            .prepare_cached(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE path = ?1"))?
            .query_row([path], node_from_row)
            .optional()?;
        Ok(node)
    }

    /// First node (by path) carrying `id`.
    pub fn node_by_id(&self, id: &str) -> Result<Option<Node>> {
        let node = self
            .conn
            .prepare_cached(&format!(
                "SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1 ORDER BY path LIMIT 1"
            ))?
            .query_row([id], node_from_row)
            .optional()?;
        Ok(node)
    }

    /// Highest numeric last segment among IDs directly below `prefix`
    /// (`S01.11` -> `S01.11.07` gives 7). Range IDs such as areas are skipped.
    pub fn max_child_suffix(&self, prefix: &str) -> Result<Option<u32>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id FROM nodes
             WHERE id IS NOT NULL AND substr(id, 1, length(?1) + 1) = ?1 || '.'",
        )?;
        let ids = stmt.query_map([prefix], |row| row.get::<_, String>(0))?;

        let mut max = None;
        for id in ids {
            let id = id?;
            let rest = &id[prefix.len() + 1..];
            if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Ok(n) = rest.parse::<u32>() {
                max = max.max(Some(n));
            }
        }
        Ok(max)
    }

    /// Next free two-digit child ID under `prefix`, without listing any
    /// directory.
    pub fn next_child_id(&self, prefix: &str) -> Result<String> {
        let next = self.max_child_suffix(prefix)?.map_or(1, |n| n + 1);
        if next > 99 {
            return Err(VaultError::Internal(format!(
                "no free child IDs left under {prefix}"
            )));
        }
        Ok(format!("{prefix}.{next:02}"))
    }

    /// Reverse references: every edge pointing at `target_id`, existing
    /// node or not.
    pub fn edges_to(&self, target_id: &str) -> Result<Vec<Edge>> {
        self.collect_edges(
            "SELECT source_path, target_id, link_text FROM edges
             WHERE target_id = ?1 ORDER BY source_path, link_text",
            target_id,
        )
    }

    /// Forward references: every edge sourced by the note at `source_path`.
    pub fn edges_from(&self, source_path: &str) -> Result<Vec<Edge>> {
        self.collect_edges(
            "SELECT source_path, target_id, link_text FROM edges
             WHERE source_path = ?1 ORDER BY link_text",
            source_path,
        )
    }

    pub fn node_paths(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare_cached("SELECT path FROM nodes")?;
        let paths = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(paths)
    }

    pub fn nodes(&self) -> Result<Vec<Node>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {NODE_COLUMNS} FROM nodes ORDER BY path"))?;
        let nodes = stmt
            .query_map([], node_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    pub fn edges(&self) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT source_path, target_id, link_text FROM edges
             ORDER BY source_path, link_text",
        )?;
        let edges = stmt
            .query_map([], edge_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    pub fn counts(&self) -> Result<IndexCounts> {
        let (nodes, edges): (i64, i64) = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM nodes), (SELECT COUNT(*) FROM edges)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(IndexCounts {
            nodes: nodes as usize,
            edges: edges as usize,
        })
    }

    fn collect_edges(&self, sql: &str, key: &str) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let edges = stmt
            .query_map([key], edge_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    let entity_type = match row.get::<_, Option<String>>(2)? {
        Some(raw) => Some(
            raw.parse::<EntityType>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        ),
        None => None,
    };
    Ok(Node {
        path: row.get(0)?,
        id: row.get(1)?,
        entity_type,
        name: row.get(3)?,
        mtime: row.get(4)?,
    })
}

fn edge_from_row(row: &Row<'_>) -> rusqlite::Result<Edge> {
    Ok(Edge {
        source_path: row.get(0)?,
        target_id: row.get(1)?,
        link_text: row.get(2)?,
    })
}
