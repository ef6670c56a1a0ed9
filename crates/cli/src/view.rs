use jdvault_core::{Edge, EntryFailure, Node, SyncStats};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::CliResult;

#[derive(Tabled)]
pub struct NodeRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Path")]
    pub path: String,
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone().unwrap_or_else(|| "-".to_string()),
            kind: node
                .entity_type
                .map_or_else(|| "note".to_string(), |t| t.to_string()),
            name: node.name.clone(),
            path: node.path.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct EdgeRow {
    #[tabled(rename = "Source")]
    pub source: String,
    #[tabled(rename = "Target")]
    pub target: String,
    #[tabled(rename = "Link")]
    pub link: String,
}

impl From<&Edge> for EdgeRow {
    fn from(edge: &Edge) -> Self {
        Self {
            source: edge.source_path.clone(),
            target: edge.target_id.clone(),
            link: edge.link_text.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &'static str, value: impl ToString) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&EntryFailure> for FailureRow {
    fn from(failure: &EntryFailure) -> Self {
        Self {
            path: failure.path.clone(),
            stage: format!("{:?}", failure.stage),
            reason: failure.reason.clone(),
        }
    }
}

pub fn table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn stats_table(stats: &SyncStats) -> String {
    let mut out = table(vec![
        FieldRow::new("Mode", stats.mode),
        FieldRow::new("Scanned", stats.scanned),
        FieldRow::new("Added", stats.added),
        FieldRow::new("Updated", stats.updated),
        FieldRow::new("Deleted", stats.deleted),
        FieldRow::new("Edges", stats.edges),
        FieldRow::new("Failures", stats.failures.len()),
        FieldRow::new("Elapsed", format!("{:.2?}", stats.elapsed)),
    ]);
    if !stats.failures.is_empty() {
        out.push_str("\n\n");
        out.push_str(&table(
            stats.failures.iter().map(FailureRow::from).collect(),
        ));
    }
    out
}
