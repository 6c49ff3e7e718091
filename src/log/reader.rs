use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::log::record::LogRecord;
use crate::types::{FileId, RecordPos};

/// Reads every record of one data file, for recovery.
///
/// Loads the entire file into memory, then iterates record by record.
/// If a record fails to decode, iteration stops there with a warning: a torn
/// write at the tail of the file, or damage that hides everything after it.
/// All preceding records are valid.
pub struct LogReader {
    file_id: FileId,
    data: Vec<u8>,
}

impl LogReader {
    /// Open a data file for reading.
    pub fn new(path: &Path, file_id: FileId) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(LogReader { file_id, data })
    }

    /// Iterate over all valid records, each with its position.
    pub fn iter(&self) -> LogIterator<'_> {
        LogIterator {
            file_id: self.file_id,
            data: &self.data,
            offset: 0,
        }
    }

    /// Length of the valid prefix of the file. Anything past it is a torn tail.
    pub fn valid_len(&self) -> u64 {
        self.iter()
            .last()
            .map(|(_, pos)| pos.offset + pos.size as u64)
            .unwrap_or(0)
    }

    /// Total bytes read from disk.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Iterator over data file records. Yields records until EOF or the first
/// record that doesn't decode.
pub struct LogIterator<'a> {
    file_id: FileId,
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for LogIterator<'a> {
    type Item = (LogRecord, RecordPos);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        match LogRecord::decode(&self.data[self.offset..]) {
            Ok(record) => {
                let size = record.encoded_size();
                let pos = RecordPos::new(self.file_id, self.offset as u64, size as u32);
                self.offset += size;
                Some((record, pos))
            }
            Err(err) => {
                tracing::warn!(
                    file_id = self.file_id,
                    offset = self.offset,
                    skipped_bytes = self.data.len() - self.offset,
                    error = %err,
                    "stopped reading data file at undecodable record"
                );
                self.offset = self.data.len();
                None
            }
        }
    }
}
