// Shared test doubles.
#![allow(dead_code)]

use std::io;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use bitcask_engine::index::{IndexType, new_indexer};
use bitcask_engine::log::{LogRecord, LogStore, ReadHandle, decode_key};
use bitcask_engine::{DB, Error, RecordPos, Result};

#[derive(Default)]
struct MemLogState {
    records: Vec<(LogRecord, RecordPos)>,
    next_offset: u64,
    syncs: usize,
    appends_since_armed: usize,
    fail_append_at: Option<usize>,
    fail_sync: bool,
    hold_sync: bool,
    sync_waiting: bool,
}

/// In-memory log store. Clones share the same log, so a test can keep a
/// handle after giving one to the engine.
#[derive(Clone, Default)]
pub struct MemLog {
    state: Arc<Mutex<MemLogState>>,
    sync_cv: Arc<Condvar>,
}

impl MemLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record appended so far, in order.
    pub fn records(&self) -> Vec<(LogRecord, RecordPos)> {
        self.state.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn sync_count(&self) -> usize {
        self.state.lock().syncs
    }

    /// Make the `n`th append from now (1-based) and every one after it fail.
    pub fn fail_on_append(&self, n: usize) {
        let mut state = self.state.lock();
        state.appends_since_armed = 0;
        state.fail_append_at = Some(n);
    }

    pub fn fail_sync(&self, fail: bool) {
        self.state.lock().fail_sync = fail;
    }

    /// Park every `sync` call until [`MemLog::release_syncs`].
    pub fn hold_syncs(&self) {
        self.state.lock().hold_sync = true;
    }

    pub fn release_syncs(&self) {
        self.state.lock().hold_sync = false;
        self.sync_cv.notify_all();
    }

    /// Block until some `sync` call is parked.
    pub fn wait_for_held_sync(&self) {
        let mut state = self.state.lock();
        while !state.sync_waiting {
            self.sync_cv.wait(&mut state);
        }
    }

    /// Clear every injected fault.
    pub fn heal(&self) {
        let mut state = self.state.lock();
        state.fail_append_at = None;
        state.fail_sync = false;
    }
}

impl LogStore for MemLog {
    fn append(&mut self, record: &LogRecord) -> io::Result<RecordPos> {
        let mut state = self.state.lock();
        state.appends_since_armed += 1;
        if let Some(n) = state.fail_append_at {
            if state.appends_since_armed >= n {
                return Err(io::Error::other("injected append failure"));
            }
        }

        let size = record.encoded_size() as u32;
        let pos = RecordPos::new(0, state.next_offset, size);
        state.next_offset += size as u64;
        state.records.push((record.clone(), pos));
        Ok(pos)
    }

    fn sync(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.hold_sync {
            state.sync_waiting = true;
            self.sync_cv.notify_all();
            while state.hold_sync {
                self.sync_cv.wait(&mut state);
            }
            state.sync_waiting = false;
        }
        if state.fail_sync {
            return Err(io::Error::other("injected sync failure"));
        }
        state.syncs += 1;
        Ok(())
    }

    fn read_handle(&self) -> Box<dyn ReadHandle> {
        Box::new(self.clone())
    }
}

impl ReadHandle for MemLog {
    fn read(&self, pos: RecordPos) -> Result<LogRecord> {
        self.state
            .lock()
            .records
            .iter()
            .find(|(_, p)| *p == pos)
            .map(|(r, _)| r.clone())
            .ok_or_else(|| Error::Corruption(format!("no record at {pos}")))
    }
}

/// Engine over a fresh [`MemLog`], plus a handle to that log.
pub fn mem_db() -> (DB, MemLog) {
    let log = MemLog::new();
    let db = DB::with_store(Box::new(log.clone()), new_indexer(IndexType::BTree), 0);
    (db, log)
}

/// Sequence number carried by a stored record's key.
pub fn seq_of(record: &LogRecord) -> u64 {
    decode_key(&record.key).unwrap().1
}

/// Raw key of a stored record.
pub fn raw_key_of(record: &LogRecord) -> Vec<u8> {
    decode_key(&record.key).unwrap().0
}
