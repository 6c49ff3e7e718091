use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::config::WriteBatchOptions;
use crate::db::DB;
use crate::error::{Error, Result};
use crate::log::{LogRecord, LogRecordType, LogStore, TXN_FIN_KEY, encode_key};
use crate::types::{Key, RecordPos};

/// A group of puts and deletes committed all-or-nothing.
///
/// Writes are buffered in memory until [`commit`](WriteBatch::commit). The
/// commit appends every pending record under one fresh sequence number, then
/// a `TxnFinished` marker with the same number, and only then touches the
/// index:
///
/// ```text
///   batch lock ─► engine lock ─► seq_no = n
///     append  [n]k1  [n]k2 ... [n]kN  [n]"txn-fix"   (TxnFinished)
///     sync (if sync_on_commit)
///     index ← k1..kN
///   release engine lock ─► release batch lock
/// ```
///
/// If anything before the index step fails, the index and the pending set
/// are left exactly as they were. Records already appended for `n` stay in
/// the log without a marker; recovery ignores them.
///
/// The batch may be shared between threads; its own lock serializes
/// `put`/`delete`/`commit` on it.
pub struct WriteBatch<'a> {
    options: WriteBatchOptions,
    pending: Mutex<BTreeMap<Key, LogRecord>>,
    db: &'a DB,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(db: &'a DB, options: WriteBatchOptions) -> Self {
        WriteBatch {
            options,
            pending: Mutex::new(BTreeMap::new()),
            db,
        }
    }

    /// Stage a put. Replaces any earlier pending write to the same key.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::KeyIsEmpty);
        }

        let record = LogRecord::normal(key.to_vec(), value.to_vec());
        self.pending.lock().insert(key.to_vec(), record);
        Ok(())
    }

    /// Stage a delete.
    ///
    /// Checks the committed index, not the pending set: a key the index
    /// doesn't know has nothing to delete, so this only cancels a pending put
    /// of it. A key the index does know always gets a tombstone.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::KeyIsEmpty);
        }

        let mut pending = self.pending.lock();
        if self.db.index.get(key).is_none() {
            pending.remove(key);
            return Ok(());
        }

        pending.insert(key.to_vec(), LogRecord::deleted(key.to_vec()));
        Ok(())
    }

    /// Write every pending entry to the log and apply them to the index.
    ///
    /// On success the batch is empty and can be reused. On error nothing is
    /// visible in the index and the pending entries are untouched, so the
    /// same batch can be committed again.
    pub fn commit(&self) -> Result<()> {
        let mut pending = self.pending.lock();

        if pending.is_empty() {
            return Ok(());
        }
        if pending.len() > self.options.max_pending_count {
            return Err(Error::ExceedMaxBatchSize);
        }

        let mut store = self.db.store.lock();
        let seq_no = self.db.next_seq_no();

        let positions = match self.write_records(&mut **store, &pending, seq_no) {
            Ok(positions) => positions,
            Err(e) => {
                tracing::warn!(seq_no, error = %e, "aborted write batch");
                return Err(e);
            }
        };

        let committed = std::mem::take(&mut *pending);
        let count = committed.len();
        for ((key, record), pos) in committed.into_iter().zip(positions) {
            match record.rec_type {
                LogRecordType::Normal => {
                    self.db.index.put(key, pos);
                }
                LogRecordType::Deleted => {
                    self.db.index.delete(&key);
                }
                LogRecordType::TxnFinished => {}
            }
        }

        tracing::debug!(seq_no, records = count, "committed write batch");
        Ok(())
    }

    /// Append the batch's records and its marker, then sync if configured.
    /// Positions come back in `pending`'s iteration order.
    fn write_records(
        &self,
        store: &mut dyn LogStore,
        pending: &BTreeMap<Key, LogRecord>,
        seq_no: u64,
    ) -> Result<Vec<RecordPos>> {
        let mut positions = Vec::with_capacity(pending.len());
        for (key, record) in pending {
            let pos = store
                .append(&LogRecord {
                    key: encode_key(key, seq_no),
                    value: record.value.clone(),
                    rec_type: record.rec_type,
                })
                .map_err(Error::AppendFailure)?;
            positions.push(pos);
        }

        store
            .append(&LogRecord::txn_finished(encode_key(TXN_FIN_KEY, seq_no)))
            .map_err(Error::AppendFailure)?;

        if self.options.sync_on_commit {
            store.sync().map_err(Error::SyncFailure)?;
        }

        Ok(positions)
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// The pending entry for `key`, if any.
    pub fn pending(&self, key: &[u8]) -> Option<LogRecord> {
        self.pending.lock().get(key).cloned()
    }

    pub fn options(&self) -> &WriteBatchOptions {
        &self.options
    }
}
