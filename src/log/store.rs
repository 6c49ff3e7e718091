use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::config::Options;
use crate::error::Result;
use crate::log::reader::LogReader;
use crate::log::record::LogRecord;
use crate::log::writer::DataFile;
use crate::log::{DATA_FILE_SUFFIX, LogStore, ReadHandle, data_file_path};
use crate::types::{FileId, RecordPos};

const INITIAL_FILE_ID: FileId = 0;

/// File-backed [`LogStore`]: a directory of numbered data files.
///
/// ```text
/// dir/
///   000000000.data   sealed (read-only)
///   000000001.data   sealed (read-only)
///   000000002.data   active ← appends go here
/// ```
///
/// When an append would push the active file past `data_file_size`, the
/// active file is synced and sealed and the next id becomes active. Sealed
/// files are never written again.
pub struct FileLog {
    dir: PathBuf,
    data_file_size: u64,
    sync_writes: bool,
    active: DataFile,
    sealed: Vec<FileId>,
}

impl FileLog {
    /// Open the log in `options.dir_path`, creating the directory if needed.
    ///
    /// A torn record at the tail of the active file is truncated away so new
    /// appends don't land behind garbage.
    pub fn open(options: &Options) -> Result<Self> {
        let dir = options.dir_path.clone();
        fs::create_dir_all(&dir)?;

        let mut ids = list_file_ids(&dir)?;
        let active_id = ids.pop().unwrap_or(INITIAL_FILE_ID);

        let active_path = data_file_path(&dir, active_id);
        if active_path.exists() {
            truncate_torn_tail(&active_path, active_id)?;
        }

        let active = DataFile::open(&dir, active_id)?;

        Ok(FileLog {
            dir,
            data_file_size: options.data_file_size,
            sync_writes: options.sync_writes,
            active,
            sealed: ids,
        })
    }

    /// Every data file id, oldest first, active last.
    pub fn file_ids(&self) -> Vec<FileId> {
        let mut ids = self.sealed.clone();
        ids.push(self.active.file_id());
        ids
    }

    /// Reader over one data file, for recovery scans.
    pub fn reader(&self, file_id: FileId) -> Result<LogReader> {
        LogReader::new(&data_file_path(&self.dir, file_id), file_id)
    }

    pub fn active_file_id(&self) -> FileId {
        self.active.file_id()
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.active.sync()?;
        let next_id = self.active.file_id() + 1;
        let next = DataFile::open(&self.dir, next_id).map_err(into_io)?;
        let sealed = std::mem::replace(&mut self.active, next);
        self.sealed.push(sealed.file_id());
        tracing::debug!(
            sealed = sealed.file_id(),
            active = next_id,
            "rotated data file"
        );
        Ok(())
    }
}

impl LogStore for FileLog {
    fn append(&mut self, record: &LogRecord) -> io::Result<RecordPos> {
        let size = record.encoded_size() as u64;
        if self.active.offset() > 0 && self.active.offset() + size > self.data_file_size {
            self.rotate()?;
        }

        let pos = self.active.append(record)?;
        if self.sync_writes {
            self.active.sync()?;
        }
        Ok(pos)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.active.sync()
    }

    fn read_handle(&self) -> Box<dyn ReadHandle> {
        Box::new(FileReadHandle {
            dir: self.dir.clone(),
        })
    }
}

/// Reads records from the data files of one directory.
///
/// Each read opens its own file handle, so it never touches the active
/// file's writer. A position is only handed out after its bytes reached the
/// file, and sealed files are never rewritten.
pub struct FileReadHandle {
    dir: PathBuf,
}

impl ReadHandle for FileReadHandle {
    fn read(&self, pos: RecordPos) -> Result<LogRecord> {
        let mut file = File::open(data_file_path(&self.dir, pos.file_id))?;
        file.seek(SeekFrom::Start(pos.offset))?;
        let mut buf = vec![0u8; pos.size as usize];
        file.read_exact(&mut buf)?;
        LogRecord::decode(&buf)
    }
}

/// Data file ids present in `dir`, ascending.
fn list_file_ids(dir: &Path) -> Result<Vec<FileId>> {
    let mut ids: Vec<FileId> = fs::read_dir(dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.extension()?.to_str()? != DATA_FILE_SUFFIX {
                return None;
            }
            path.file_stem()?.to_str()?.parse::<FileId>().ok()
        })
        .collect();
    ids.sort_unstable();
    Ok(ids)
}

fn truncate_torn_tail(path: &Path, file_id: FileId) -> Result<()> {
    let reader = LogReader::new(path, file_id)?;
    let valid_len = reader.valid_len();
    if valid_len < reader.len() {
        tracing::warn!(
            file_id,
            valid_len,
            file_len = reader.len(),
            "truncating torn tail of active data file"
        );
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(valid_len)?;
        file.sync_all()?;
    }
    Ok(())
}

fn into_io(err: crate::error::Error) -> io::Error {
    match err {
        crate::error::Error::Io(e) => e,
        other => io::Error::other(other.to_string()),
    }
}
