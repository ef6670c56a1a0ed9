mod clear;
mod query;
mod sync;
mod view;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jdvault_core::IndexConfig;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "jdvault",
    version,
    about = "Derived SQLite index over a hierarchically numbered notes vault",
    long_about = "jdvault walks a vault whose folder names carry dotted IDs (S01, S01.10-19, \
                  S01.11, S01.11.11), records every classified folder and every note, and \
                  keeps the [[ID]] links between them queryable without re-walking the tree."
)]
pub struct Cli {
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding index files (overrides JDVAULT_INDEX_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub index_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring the index up to date with the vault
    #[command(
        long_about = "Runs an incremental pass when the index is current, or a full rebuild when \
                      it is new, was written by another schema version, or belongs to a \
                      different vault path."
    )]
    Sync {
        #[arg(value_name = "VAULT")]
        vault: PathBuf,
        /// Rebuild from scratch even if an incremental pass would do
        #[arg(long)]
        full: bool,
    },
    /// Show index location, size and freshness
    Status {
        #[arg(value_name = "VAULT")]
        vault: PathBuf,
    },
    /// Look up one node by ID or by vault-relative path
    Show {
        #[arg(value_name = "VAULT")]
        vault: PathBuf,
        #[arg(value_name = "ID_OR_PATH")]
        key: String,
    },
    /// List notes linking to an ID
    Refs {
        #[arg(value_name = "VAULT")]
        vault: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
    },
    /// List the links a note makes
    Links {
        #[arg(value_name = "VAULT")]
        vault: PathBuf,
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Suggest the next free child ID under a prefix
    NextId {
        #[arg(value_name = "VAULT")]
        vault: PathBuf,
        #[arg(value_name = "PREFIX")]
        prefix: String,
    },
    /// Delete built indices
    #[command(
        long_about = "Removes the index of one vault, or every index in the index directory \
                      when no vault is given."
    )]
    Clear {
        #[arg(value_name = "VAULT")]
        vault: Option<PathBuf>,
    },
}

impl Cli {
    pub fn config(&self) -> IndexConfig {
        let config = IndexConfig::from_env();
        match &self.index_dir {
            Some(dir) => config.with_index_dir(dir),
            None => config,
        }
    }
}

pub fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let _guard = jdvault_core::logging::init_logging(&cli.config(), "cli", !cli.json);

    let output = dispatch(&cli)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Runs one command and returns what it would print.
pub fn dispatch(cli: &Cli) -> CliResult<String> {
    let config = cli.config();
    match &cli.command {
        Commands::Sync { vault, full } => sync::run(vault, config, *full, cli.json),
        Commands::Status { vault } => query::status(vault, config, cli.json),
        Commands::Show { vault, key } => query::show(vault, config, key, cli.json),
        Commands::Refs { vault, id } => query::refs(vault, config, id, cli.json),
        Commands::Links { vault, path } => query::links(vault, config, path, cli.json),
        Commands::NextId { vault, prefix } => query::next_id(vault, config, prefix, cli.json),
        Commands::Clear { vault } => clear::run(vault.as_deref(), &config, cli.json),
    }
}
