//! Configuration types for raftlog
//!
//! This module defines the on-disk store configuration. Every field has a
//! default so partial TOML files and environment overrides deserialize.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database file name inside the data directory
pub const DEFAULT_FILE_NAME: &str = "raft.redb";

/// Store configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Data directory holding the database file
    pub dir: PathBuf,
    /// Auxiliary value directory, provisioned alongside `dir` when set
    pub value_dir: Option<PathBuf>,
    /// Database file name inside `dir`
    pub file_name: String,
    /// Page cache size in bytes (default: 64 MB)
    pub cache_size_bytes: usize,
    /// Durability of committed write transactions
    pub sync_mode: SyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./raft"),
            value_dir: None,
            file_name: DEFAULT_FILE_NAME.to_string(),
            cache_size_bytes: 64 * 1024 * 1024, // 64 MB
            sync_mode: SyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Create config rooted at `dir`, with the value directory set to the same path
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            value_dir: Some(dir.clone()),
            dir,
            ..Default::default()
        }
    }

    /// Full path of the database file
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Directories that must exist before the engine is opened
    #[must_use]
    pub fn required_dirs(&self) -> Vec<&Path> {
        let mut dirs = vec![self.dir.as_path()];
        if let Some(value_dir) = &self.value_dir
            && value_dir != &self.dir
        {
            dirs.push(value_dir.as_path());
        }
        dirs
    }
}

/// Commit durability
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// fsync on every commit (safest)
    #[default]
    Immediate,
    /// Commits become durable at the next immediate commit (fastest, may lose
    /// the tail on crash)
    Eventual,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.file_name, "raft.redb");
        assert_eq!(config.sync_mode, SyncMode::Immediate);
        assert!(config.value_dir.is_none());
        assert_eq!(config.db_path(), PathBuf::from("./raft/raft.redb"));
    }

    #[test]
    fn test_with_dir_uses_same_value_dir() {
        let config = StoreConfig::with_dir("/tmp/raft-1");
        assert_eq!(config.value_dir.as_deref(), Some(Path::new("/tmp/raft-1")));
        // Same path is only provisioned once
        assert_eq!(config.required_dirs(), vec![Path::new("/tmp/raft-1")]);
    }

    #[test]
    fn test_required_dirs_includes_distinct_value_dir() {
        let config = StoreConfig {
            value_dir: Some(PathBuf::from("/tmp/values")),
            ..StoreConfig::with_dir("/tmp/data")
        };
        assert_eq!(
            config.required_dirs(),
            vec![Path::new("/tmp/data"), Path::new("/tmp/values")]
        );
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"dir": "/data/raft", "sync_mode": "eventual"}"#).unwrap();
        assert_eq!(config.dir, PathBuf::from("/data/raft"));
        assert_eq!(config.sync_mode, SyncMode::Eventual);
        assert_eq!(config.file_name, DEFAULT_FILE_NAME);
    }
}
