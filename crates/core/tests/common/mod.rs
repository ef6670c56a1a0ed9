#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use jdvault_core::{IndexConfig, VaultIndex};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const PINNED_MTIME: u64 = 1_600_000_000;

/// A scratch vault plus a private index directory.
pub struct Fixture {
    pub vault: TempDir,
    pub index_dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            vault: tempfile::tempdir().unwrap(),
            index_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.vault.path()
    }

    pub fn config(&self) -> IndexConfig {
        IndexConfig::default().with_index_dir(self.index_dir.path())
    }

    pub fn open(&self) -> VaultIndex {
        VaultIndex::open_with(self.root(), self.config()).unwrap()
    }

    /// Opens the same vault against a separate, empty index directory.
    pub fn open_fresh(&self, index_dir: &TempDir) -> VaultIndex {
        let config = IndexConfig::default().with_index_dir(index_dir.path());
        VaultIndex::open_with(self.root(), config).unwrap()
    }

    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn note(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, body).unwrap();
        path
    }

    /// Pins every mtime in the vault to a fixed past instant so that only
    /// entries touched afterwards look modified to an incremental pass.
    pub fn backdate(&self) {
        let past = SystemTime::UNIX_EPOCH + Duration::from_secs(PINNED_MTIME);
        for entry in WalkDir::new(self.root()).min_depth(1) {
            let entry = entry.unwrap();
            set_mtime(entry.path(), past);
        }
    }

    /// Rewrites a note and stamps it clearly after any completed pass.
    pub fn modify(&self, rel: &str, body: &str) {
        let path = self.note(rel, body);
        set_mtime(&path, SystemTime::now() + Duration::from_secs(60));
    }
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    File::open(path).unwrap().set_modified(time).unwrap();
}

/// The worked example vault: four classified directories and one note
/// linking to an item that does not exist yet.
pub fn budget_vault() -> Fixture {
    let fx = Fixture::new();
    fx.note(
        "S01 Personal/S01.10-19 Life Admin/S01.11 Finance/S01.11.11 Budget/S01.11.11 Budget.md",
        "# Budget\n\nSee [[S01.11.12 Taxes]].\n",
    );
    fx.backdate();
    fx
}

pub const BUDGET_DIR: &str = "S01 Personal/S01.10-19 Life Admin/S01.11 Finance/S01.11.11 Budget";
pub const BUDGET_NOTE: &str =
    "S01 Personal/S01.10-19 Life Admin/S01.11 Finance/S01.11.11 Budget/S01.11.11 Budget.md";
