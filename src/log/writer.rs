use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::log::data_file_path;
use crate::log::record::LogRecord;
use crate::types::{FileId, RecordPos};

/// Appends log records to one data file.
///
///   file.write_all()  → OS page cache (visible to readers)
///   file.sync_all()   → OS page cache → physical disk
///
/// Each record goes to the file in a single `write_all` with no user-space
/// buffer in between, so a failed append leaves nothing queued behind it.
/// Whatever part of it did reach the file is cut off again, keeping
/// `offset` equal to the file length.
pub struct DataFile {
    file_id: FileId,
    path: PathBuf,
    file: File,
    offset: u64,
}

impl DataFile {
    /// Open (or create) data file `file_id` in `dir` for appending.
    /// The write offset starts at the current file length.
    pub fn open(dir: &Path, file_id: FileId) -> Result<Self> {
        let path = data_file_path(dir, file_id);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let offset = file.metadata()?.len();

        Ok(DataFile {
            file_id,
            path,
            file,
            offset,
        })
    }

    /// Append a record and return its position.
    ///
    /// On error the file is truncated back to where the record would have
    /// started.
    pub fn append(&mut self, record: &LogRecord) -> io::Result<RecordPos> {
        let encoded = record.encode();
        let size = u32::try_from(encoded.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "log record exceeds 4 GiB")
        })?;

        if let Err(err) = self.file.write_all(&encoded) {
            self.roll_back();
            return Err(err);
        }

        let pos = RecordPos::new(self.file_id, self.offset, size);
        self.offset += encoded.len() as u64;
        Ok(pos)
    }

    /// Drop a partially written record. If the truncate itself fails, adopt
    /// the real file length so later positions still match the bytes on disk.
    fn roll_back(&mut self) {
        if let Err(err) = self.file.set_len(self.offset) {
            tracing::warn!(
                file_id = self.file_id,
                offset = self.offset,
                error = %err,
                "could not truncate failed append"
            );
            if let Ok(meta) = self.file.metadata() {
                self.offset = meta.len();
            }
        }
    }

    /// Force fsync to disk.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }

    /// Bytes in the file so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
