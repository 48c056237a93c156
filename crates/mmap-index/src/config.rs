//! Configuration for an index stored in a directory

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where an index lives and how large it may grow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding the index and data files
    pub directory: PathBuf,

    /// Largest number of items a build may store
    pub max_item_count: u64,

    /// File name of the slot array inside `directory`
    pub index_file_name: String,

    /// File name of the record log inside `directory`
    pub data_file_name: String,

    /// Fsync both files at the end of a build
    pub sync_on_write: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./index"),
            max_item_count: 1_000_000,
            index_file_name: "index".to_string(),
            data_file_name: "data".to_string(),
            sync_on_write: true,
        }
    }
}

impl IndexConfig {
    /// Create a configuration for `directory` holding up to `max_item_count` items
    pub fn new<P: AsRef<Path>>(directory: P, max_item_count: u64) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            max_item_count,
            ..Default::default()
        }
    }

    /// Set both file names
    #[must_use]
    pub fn with_file_names(mut self, index: impl Into<String>, data: impl Into<String>) -> Self {
        self.index_file_name = index.into();
        self.data_file_name = data.into();
        self
    }

    /// Enable or disable fsync after a build
    #[must_use]
    pub const fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Path of the index file
    pub fn index_path(&self) -> PathBuf {
        self.directory.join(&self.index_file_name)
    }

    /// Path of the data file
    pub fn data_path(&self) -> PathBuf {
        self.directory.join(&self.data_file_name)
    }
}
