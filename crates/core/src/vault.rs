//! One vault's index: the store plus the grammar and configuration every
//! pass needs.

use std::path::Path;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::grammar::Grammar;
use crate::model::{PassError, SyncStats};
use crate::store::IndexStore;
use crate::sync::SyncCoordinator;

pub struct VaultIndex {
    store: IndexStore,
    grammar: Grammar,
    config: IndexConfig,
}

impl VaultIndex {
    /// Opens the index for `vault` with defaults and `JDVAULT_INDEX_DIR`.
    pub fn open(vault: &Path) -> Result<Self> {
        Self::open_with(vault, IndexConfig::from_env())
    }

    pub fn open_with(vault: &Path, config: IndexConfig) -> Result<Self> {
        let grammar = Grammar::new()?;
        let store = IndexStore::open(vault, &config)?;
        Ok(Self {
            store,
            grammar,
            config,
        })
    }

    pub fn close(self) -> Result<()> {
        self.store.close()
    }

    /// Full or incremental, whichever the index state calls for.
    pub fn sync(&mut self) -> std::result::Result<SyncStats, PassError> {
        self.coordinator().run()
    }

    pub fn sync_full(&mut self) -> std::result::Result<SyncStats, PassError> {
        self.coordinator().run_full()
    }

    pub fn sync_incremental(&mut self) -> std::result::Result<SyncStats, PassError> {
        self.coordinator().run_incremental()
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut IndexStore {
        &mut self.store
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        self.store.vault_root()
    }

    fn coordinator(&mut self) -> SyncCoordinator<'_> {
        SyncCoordinator::new(&mut self.store, &self.grammar, &self.config)
    }
}
