use std::path::{Component, Path, PathBuf};

use jdvault_ingest::{DEFAULT_MAX_WORKERS, DEFAULT_RESULT_CAPACITY, PoolConfig};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{Result, VaultError};

pub const INDEX_DIR_ENV: &str = "JDVAULT_INDEX_DIR";
const APP_DIR: &str = "jdvault";
const INDICES_DIR: &str = "indices";
const LOGS_DIR: &str = "logs";

/// Per-user application directory holding indices and logs.
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding index files. Falls back to `JDVAULT_INDEX_DIR`,
    /// then to the per-user data directory.
    pub index_dir: Option<PathBuf>,
    /// Note file extensions, matched case-insensitively and without the dot.
    pub note_extensions: Vec<String>,
    /// Parse workers for a full pass; `0` means one per core.
    pub workers: usize,
    pub max_workers: usize,
    pub result_queue_capacity: usize,
    pub busy_timeout_ms: u64,
    pub cache_size_kib: i64,
    /// Directory for daily log files. Defaults to `logs` in the data directory.
    pub log_dir: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: None,
            note_extensions: vec!["md".to_string()],
            workers: 0,
            max_workers: DEFAULT_MAX_WORKERS,
            result_queue_capacity: DEFAULT_RESULT_CAPACITY,
            busy_timeout_ms: 5_000,
            cache_size_kib: 64 * 1024,
            log_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl IndexConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(INDEX_DIR_ENV)
            && !dir.is_empty()
        {
            config.index_dir = Some(PathBuf::from(dir));
        }
        config
    }

    #[must_use]
    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    pub fn base_index_dir(&self) -> PathBuf {
        if let Some(dir) = &self.index_dir {
            return dir.clone();
        }
        if let Ok(dir) = std::env::var(INDEX_DIR_ENV)
            && !dir.is_empty()
        {
            return PathBuf::from(dir);
        }
        data_dir().join(INDICES_DIR)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| data_dir().join(LOGS_DIR))
    }

    /// Index file for a vault: `<base>/<hash>.db`, where the hash is taken
    /// over the absolute, tilde-expanded vault path.
    pub fn index_path_for(&self, vault: &Path) -> Result<PathBuf> {
        let root = resolve_vault_path(vault)?;
        Ok(self
            .base_index_dir()
            .join(format!("{}.db", vault_path_hash(&root))))
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
            max_workers: self.max_workers,
            result_capacity: self.result_queue_capacity,
        }
    }
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Absolute, tilde-expanded and (when it exists) canonical form of a vault path.
pub fn resolve_vault_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(VaultError::InvalidPath("empty path".to_string()));
    }
    let expanded = expand_tilde(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };
    Ok(absolute.canonicalize().unwrap_or(absolute))
}

pub fn vault_path_hash(root: &Path) -> String {
    format!("{:016x}", xxh3_64(root.to_string_lossy().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_path_is_stable_per_vault() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();

        let config = IndexConfig::default().with_index_dir(dir.path().join("idx"));
        let path_a = config.index_path_for(&a).unwrap();

        assert_eq!(path_a, config.index_path_for(&a).unwrap());
        assert_ne!(path_a, config.index_path_for(&b).unwrap());
        assert!(path_a.starts_with(dir.path().join("idx")));
        assert_eq!(path_a.extension().and_then(|e| e.to_str()), Some("db"));
    }

    #[test]
    fn test_relative_and_absolute_paths_agree() {
        let cwd = std::env::current_dir().unwrap();
        let config = IndexConfig::default().with_index_dir("/tmp/jdvault-test-idx");
        assert_eq!(
            config.index_path_for(Path::new(".")).unwrap(),
            config.index_path_for(&cwd).unwrap()
        );
    }

    #[test]
    fn test_expand_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_tilde(Path::new("~/notes")), home.join("notes"));
        assert_eq!(expand_tilde(Path::new("/srv/~x")), PathBuf::from("/srv/~x"));
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(matches!(
            resolve_vault_path(Path::new("")),
            Err(VaultError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_hash_is_sixteen_hex_digits() {
        let hash = vault_path_hash(Path::new("/vaults/personal"));
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
