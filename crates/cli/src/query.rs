use std::path::Path;

use jdvault_core::{IndexConfig, MetaKey, Node, VaultIndex};
use serde::Serialize;

use crate::CliResult;
use crate::view::{self, EdgeRow, FieldRow, NodeRow};

#[derive(Serialize)]
struct Status {
    vault: String,
    index: String,
    nodes: usize,
    edges: usize,
    schema_version: Option<String>,
    last_sync_time: Option<i64>,
    needs_full_rebuild: bool,
}

pub fn status(vault: &Path, config: IndexConfig, json: bool) -> CliResult<String> {
    let index = VaultIndex::open_with(vault, config)?;
    let store = index.store();
    let counts = store.counts()?;
    let status = Status {
        vault: index.root().display().to_string(),
        index: store.db_path().display().to_string(),
        nodes: counts.nodes,
        edges: counts.edges,
        schema_version: store.meta(MetaKey::SchemaVersion)?,
        last_sync_time: store.last_sync_time()?,
        needs_full_rebuild: store.needs_full_rebuild()?,
    };

    if json {
        return view::json(&status);
    }
    Ok(view::table(vec![
        FieldRow::new("Vault", &status.vault),
        FieldRow::new("Index", &status.index),
        FieldRow::new("Nodes", status.nodes),
        FieldRow::new("Edges", status.edges),
        FieldRow::new(
            "Schema",
            status.schema_version.as_deref().unwrap_or("-"),
        ),
        FieldRow::new(
            "Last sync",
            status
                .last_sync_time
                .map_or_else(|| "never".to_string(), |t| t.to_string()),
        ),
        FieldRow::new("Needs rebuild", status.needs_full_rebuild),
    ]))
}

/// Paths are tried before IDs.
pub fn show(vault: &Path, config: IndexConfig, key: &str, json: bool) -> CliResult<String> {
    let index = VaultIndex::open_with(vault, config)?;
    let store = index.store();
    let node = match store.node_by_path(key)? {
        Some(node) => Some(node),
        None => store.node_by_id(key)?,
    };

    if json {
        return view::json(&node);
    }
    Ok(match node {
        Some(node) => render_nodes(&[node]),
        None => format!("No node matches '{key}'."),
    })
}

pub fn refs(vault: &Path, config: IndexConfig, id: &str, json: bool) -> CliResult<String> {
    let index = VaultIndex::open_with(vault, config)?;
    let edges = index.store().edges_to(id)?;
    if json {
        return view::json(&edges);
    }
    if edges.is_empty() {
        return Ok(format!("Nothing links to {id}."));
    }
    Ok(view::table(edges.iter().map(EdgeRow::from).collect()))
}

pub fn links(vault: &Path, config: IndexConfig, path: &str, json: bool) -> CliResult<String> {
    let index = VaultIndex::open_with(vault, config)?;
    let edges = index.store().edges_from(path)?;
    if json {
        return view::json(&edges);
    }
    if edges.is_empty() {
        return Ok(format!("{path} has no ID links."));
    }
    Ok(view::table(edges.iter().map(EdgeRow::from).collect()))
}

pub fn next_id(vault: &Path, config: IndexConfig, prefix: &str, json: bool) -> CliResult<String> {
    let index = VaultIndex::open_with(vault, config)?;
    let id = index.store().next_child_id(prefix)?;
    if json {
        return view::json(&serde_json::json!({ "prefix": prefix, "next_id": id }));
    }
    Ok(id)
}

fn render_nodes(nodes: &[Node]) -> String {
    view::table(nodes.iter().map(NodeRow::from).collect())
}
