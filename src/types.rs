use std::fmt;

/// Raw key bytes.
pub type Key = Vec<u8>;

/// Raw value bytes.
pub type Value = Vec<u8>;

/// Identifies one data file in the log directory.
pub type FileId = u32;

/// Where a record lives in the log.
///
/// Produced by [`LogStore::append`](crate::log::LogStore::append) and stored
/// by value in the index. The batch path never dereferences it; only
/// [`ReadHandle::read`](crate::log::ReadHandle::read) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordPos {
    /// Data file holding the record.
    pub file_id: FileId,
    /// Byte offset of the record's first (CRC) byte.
    pub offset: u64,
    /// Encoded size of the whole record, header included.
    pub size: u32,
}

impl RecordPos {
    pub fn new(file_id: FileId, offset: u64, size: u32) -> Self {
        RecordPos {
            file_id,
            offset,
            size,
        }
    }
}

impl fmt::Display for RecordPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file={}, offset={}, size={}", self.file_id, self.offset, self.size)
    }
}
