pub mod key;
pub mod reader;
pub mod record;
pub mod store;
pub mod writer;

use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{FileId, RecordPos};

pub use key::{NON_TXN_SEQ_NO, TXN_FIN_KEY, decode_key, encode_key};
pub use record::{LogRecord, LogRecordType};
pub use store::{FileLog, FileReadHandle};

/// Extension of every data file in the log directory.
pub const DATA_FILE_SUFFIX: &str = "data";

/// Path of data file `file_id` inside `dir`, e.g. `000000003.data`.
pub fn data_file_path(dir: &Path, file_id: FileId) -> PathBuf {
    dir.join(format!("{:09}.{}", file_id, DATA_FILE_SUFFIX))
}

/// The append-only log the engine writes through.
///
/// Implementations own the active segment and its offset bookkeeping. The
/// engine only ever calls these under its write lock, so `&mut self` is
/// never contended.
pub trait LogStore: Send {
    /// Append one record to the active segment and return where it landed.
    fn append(&mut self, record: &LogRecord) -> io::Result<RecordPos>;

    /// Make every record appended so far durable.
    fn sync(&mut self) -> io::Result<()>;

    /// A handle for reading records back. It is used without the write lock,
    /// so reads never wait behind an append or a sync.
    fn read_handle(&self) -> Box<dyn ReadHandle>;
}

/// Random-access reads of records already appended to a [`LogStore`].
pub trait ReadHandle: Send + Sync {
    /// Read back the record at `pos`.
    fn read(&self, pos: RecordPos) -> Result<LogRecord>;
}
