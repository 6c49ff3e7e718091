use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::index::IndexType;

/// Configuration for opening a [`DB`](crate::DB).
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory holding the data files (default: ./bitcask)
    pub dir_path: PathBuf,

    /// Size at which the active data file is sealed and a new one started
    /// (default: 256MB)
    pub data_file_size: u64,

    /// fsync after every append, batched or not (default: false)
    pub sync_writes: bool,

    /// In-memory index implementation (default: BTree)
    pub index_type: IndexType,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dir_path: PathBuf::from("./bitcask"),
            data_file_size: 256 * 1024 * 1024, // 256MB
            sync_writes: false,
            index_type: IndexType::BTree,
        }
    }
}

impl Options {
    /// Create options for the given directory, everything else default.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir_path: dir.into(),
            ..Default::default()
        }
    }

    /// Set the data file rotation threshold
    pub fn with_data_file_size(mut self, size: u64) -> Self {
        self.data_file_size = size;
        self
    }

    /// Enable or disable fsync on every append
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Choose the index implementation
    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dir_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("dir_path is empty".into()));
        }
        if self.data_file_size == 0 {
            return Err(Error::InvalidConfig("data_file_size must be > 0".into()));
        }
        Ok(())
    }
}

/// Configuration for a single [`WriteBatch`](crate::WriteBatch).
#[derive(Debug, Clone, Copy)]
pub struct WriteBatchOptions {
    /// Most pending entries a commit will accept (default: 10000)
    pub max_pending_count: usize,

    /// Sync the log once the completion marker is appended (default: true)
    pub sync_on_commit: bool,
}

impl Default for WriteBatchOptions {
    fn default() -> Self {
        Self {
            max_pending_count: 10_000,
            sync_on_commit: true,
        }
    }
}

impl WriteBatchOptions {
    pub fn new(max_pending_count: usize, sync_on_commit: bool) -> Self {
        Self {
            max_pending_count,
            sync_on_commit,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pending_count == 0 {
            return Err(Error::InvalidConfig("max_pending_count must be > 0".into()));
        }
        Ok(())
    }
}
