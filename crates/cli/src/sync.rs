use std::path::Path;

use jdvault_core::{IndexConfig, PassError, SyncStats, VaultIndex};
use thiserror::Error;
use tracing::info;

use crate::CliResult;
use crate::view;

/// A failed pass together with the statistics it gathered before failing.
#[derive(Debug, Error)]
#[error("{source}\n\n{report}")]
pub struct SyncFailed {
    pub report: String,
    #[source]
    pub source: PassError,
}

pub fn run(vault: &Path, config: IndexConfig, full: bool, json: bool) -> CliResult<String> {
    let mut index = VaultIndex::open_with(vault, config)?;
    info!("Syncing vault at {}...", index.root().display());

    let outcome = if full {
        index.sync_full()
    } else {
        index.sync()
    };
    index.close()?;

    let render = |stats: &SyncStats| -> CliResult<String> {
        if json {
            view::json(stats)
        } else {
            Ok(view::stats_table(stats))
        }
    };
    match outcome {
        Ok(stats) => render(&stats),
        Err(source) => Err(SyncFailed {
            report: render(&source.stats)?,
            source,
        }
        .into()),
    }
}
