use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::batch::WriteBatch;
use crate::config::{Options, WriteBatchOptions};
use crate::error::{Error, Result};
use crate::index::{Indexer, new_indexer};
use crate::log::{
    FileLog, LogRecord, LogRecordType, LogStore, NON_TXN_SEQ_NO, ReadHandle, encode_key,
};
use crate::recovery;
use crate::types::{Key, Value};

/// The storage engine.
///
/// Holds the log behind the engine-wide write lock, a lock-free read handle
/// on that log, the index, and the sequence counter that tags each committed
/// batch.
///
/// Lock order: a [`WriteBatch`] lock, if any, is always taken before
/// `store`. Nothing takes them the other way round.
pub struct DB {
    pub(crate) store: Mutex<Box<dyn LogStore>>,
    reader: Box<dyn ReadHandle>,
    pub(crate) index: Box<dyn Indexer>,
    seq_no: AtomicU64,
}

impl DB {
    /// Open (or create) a database in `options.dir_path`.
    ///
    /// Replays every data file to rebuild the index. Batches without a
    /// completion marker are skipped, and the sequence counter resumes
    /// after the largest sequence number found.
    pub fn open(options: Options) -> Result<Self> {
        options.validate()?;

        let log = FileLog::open(&options)?;
        let index = new_indexer(options.index_type);

        let readers = log
            .file_ids()
            .into_iter()
            .map(|id| log.reader(id))
            .collect::<Result<Vec<_>>>()?;
        let replay = recovery::replay(readers.iter().flat_map(|r| r.iter()))?;
        replay.apply_to(index.as_ref());

        for seq_no in &replay.incomplete {
            tracing::warn!(seq_no, "dropping write batch without completion marker");
        }
        tracing::info!(
            dir = %options.dir_path.display(),
            files = readers.len(),
            keys = index.len(),
            max_seq_no = replay.max_seq_no,
            "opened database"
        );

        Ok(Self::with_store(Box::new(log), index, replay.max_seq_no))
    }

    /// Build an engine over caller-supplied collaborators. No recovery is run:
    /// `index` is taken as already consistent with `store`, and `seq_no` is
    /// the last sequence number already used.
    pub fn with_store(store: Box<dyn LogStore>, index: Box<dyn Indexer>, seq_no: u64) -> Self {
        DB {
            reader: store.read_handle(),
            store: Mutex::new(store),
            index,
            seq_no: AtomicU64::new(seq_no),
        }
    }

    /// Start an empty write batch against this engine.
    pub fn new_write_batch(&self, options: WriteBatchOptions) -> Result<WriteBatch<'_>> {
        options.validate()?;
        Ok(WriteBatch::new(self, options))
    }

    /// Write one key outside any batch. Visible as soon as this returns.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::KeyIsEmpty);
        }

        let record = LogRecord::normal(encode_key(key, NON_TXN_SEQ_NO), value.to_vec());
        let mut store = self.store.lock();
        let pos = store.append(&record).map_err(Error::AppendFailure)?;
        self.index.put(key.to_vec(), pos);
        Ok(())
    }

    /// Delete one key outside any batch. Deleting an absent key is a no-op.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::KeyIsEmpty);
        }

        let mut store = self.store.lock();
        if self.index.get(key).is_none() {
            return Ok(());
        }
        let record = LogRecord::deleted(encode_key(key, NON_TXN_SEQ_NO));
        store.append(&record).map_err(Error::AppendFailure)?;
        self.index.delete(key);
        Ok(())
    }

    /// Read the committed value of `key`.
    pub fn get(&self, key: &[u8]) -> Result<Value> {
        if key.is_empty() {
            return Err(Error::KeyIsEmpty);
        }

        let pos = self.index.get(key).ok_or(Error::KeyNotFound)?;
        let record = self.reader.read(pos)?;
        match record.rec_type {
            LogRecordType::Normal => Ok(record.value),
            _ => Err(Error::KeyNotFound),
        }
    }

    /// Every committed key, ascending.
    pub fn list_keys(&self) -> Vec<Key> {
        self.index.keys()
    }

    /// Force everything appended so far to disk.
    pub fn sync(&self) -> Result<()> {
        self.store.lock().sync().map_err(Error::SyncFailure)
    }

    /// Sync and drop the engine.
    pub fn close(self) -> Result<()> {
        self.sync()?;
        tracing::info!(keys = self.index.len(), seq_no = self.seq_no(), "closed database");
        Ok(())
    }

    /// Last sequence number handed to a batch (0 if none yet).
    pub fn seq_no(&self) -> u64 {
        self.seq_no.load(Ordering::SeqCst)
    }

    /// Draw the next batch sequence number. Numbers are never reused, even
    /// if the commit that drew one fails.
    pub(crate) fn next_seq_no(&self) -> u64 {
        self.seq_no.fetch_add(1, Ordering::SeqCst) + 1
    }
}
