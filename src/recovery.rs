//! Rebuilding the index from the log.
//!
//! Records are grouped by the sequence number in their key. Sequence 0 is a
//! non-batched write and applies at once. Any other sequence applies only
//! when its `TxnFinished` marker shows up; groups that never see a marker
//! were aborted (or torn by a crash) and are dropped.

use std::collections::HashMap;

use crate::error::Result;
use crate::index::Indexer;
use crate::log::{LogRecord, LogRecordType, NON_TXN_SEQ_NO, decode_key};
use crate::types::{Key, RecordPos};

/// One committed write, in the order recovery applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedWrite {
    pub seq_no: u64,
    pub key: Key,
    pub pos: RecordPos,
    pub rec_type: LogRecordType,
}

/// Result of scanning a log.
#[derive(Debug, Default)]
pub struct Replay {
    /// Committed writes in log order.
    pub writes: Vec<ReplayedWrite>,
    /// Largest sequence number seen, committed or not.
    pub max_seq_no: u64,
    /// Sequence numbers that had records but no completion marker, ascending.
    pub incomplete: Vec<u64>,
}

impl Replay {
    /// Apply the committed writes to `index` in order.
    pub fn apply_to(&self, index: &dyn Indexer) {
        for write in &self.writes {
            match write.rec_type {
                LogRecordType::Normal => {
                    index.put(write.key.clone(), write.pos);
                }
                LogRecordType::Deleted => {
                    index.delete(&write.key);
                }
                LogRecordType::TxnFinished => {}
            }
        }
    }
}

/// Scan `records` (in log order) and work out which writes are committed.
pub fn replay<I>(records: I) -> Result<Replay>
where
    I: IntoIterator<Item = (LogRecord, RecordPos)>,
{
    let mut replay = Replay::default();
    let mut open_batches: HashMap<u64, Vec<ReplayedWrite>> = HashMap::new();

    for (record, pos) in records {
        let (key, seq_no) = decode_key(&record.key)?;
        replay.max_seq_no = replay.max_seq_no.max(seq_no);

        let write = ReplayedWrite {
            seq_no,
            key,
            pos,
            rec_type: record.rec_type,
        };

        if seq_no == NON_TXN_SEQ_NO {
            if write.rec_type != LogRecordType::TxnFinished {
                replay.writes.push(write);
            }
            continue;
        }

        match write.rec_type {
            LogRecordType::TxnFinished => {
                if let Some(batch) = open_batches.remove(&seq_no) {
                    replay.writes.extend(batch);
                }
            }
            _ => open_batches.entry(seq_no).or_default().push(write),
        }
    }

    let mut incomplete: Vec<u64> = open_batches.into_keys().collect();
    incomplete.sort_unstable();
    replay.incomplete = incomplete;

    Ok(replay)
}
