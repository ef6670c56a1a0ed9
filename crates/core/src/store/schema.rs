use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::model::MetaKey;

/// Bump whenever the layout of `nodes` or `edges` changes.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_META: &str = "
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

const CREATE_DERIVED: &str = "
CREATE TABLE IF NOT EXISTS nodes (
    path  TEXT PRIMARY KEY,
    id    TEXT,
    type  TEXT,
    name  TEXT NOT NULL,
    mtime INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_nodes_id ON nodes(id);

CREATE TABLE IF NOT EXISTS edges (
    source_path TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    link_text   TEXT NOT NULL,
    PRIMARY KEY (source_path, link_text)
);
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);
CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_path);";

const DROP_DERIVED: &str = "
DROP TABLE IF EXISTS edges;
DROP TABLE IF EXISTS nodes;";

pub(crate) fn configure(conn: &Connection, config: &IndexConfig) -> Result<()> {
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", -config.cache_size_kib.abs())?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}

/// Creates missing tables. Node and edge tables written by another schema
/// version are dropped; their content is derived and a full pass rebuilds it.
/// The stale `schema_version` row stays until that pass, so the rebuild is
/// still reported as needed.
pub(crate) fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_META)?;

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            [MetaKey::SchemaVersion.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(version) = stored
        && version != SCHEMA_VERSION.to_string()
    {
        warn!(
            "Index schema version mismatch (found {}, expected {}). Dropping derived tables.",
            version, SCHEMA_VERSION
        );
        conn.execute_batch(DROP_DERIVED)?;
    }

    conn.execute_batch(CREATE_DERIVED)?;
    Ok(())
}
