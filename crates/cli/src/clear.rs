use std::path::Path;

use jdvault_core::{IndexConfig, IndexStore};
use serde_json::json;

use crate::CliResult;
use crate::view;

pub fn run(vault: Option<&Path>, config: &IndexConfig, as_json: bool) -> CliResult<String> {
    let message = match vault {
        Some(vault) => {
            if IndexStore::remove(vault, config)? {
                format!("Index for {} cleared.", vault.display())
            } else {
                format!("No index found for {}.", vault.display())
            }
        }
        None => {
            IndexStore::remove_all(config)?;
            format!(
                "All indices under {} cleared.",
                config.base_index_dir().display()
            )
        }
    };

    if as_json {
        view::json(&json!({ "message": message }))
    } else {
        Ok(message)
    }
}
