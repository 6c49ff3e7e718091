// WriteBatch tests
// Staging semantics of put/delete, commit preconditions, and what a
// successful commit leaves in the log and the index.

mod common;

use bitcask_engine::log::{LogRecordType, TXN_FIN_KEY};
use bitcask_engine::{Error, WriteBatchOptions};
use common::{mem_db, raw_key_of, seq_of};

fn opts(max_pending_count: usize, sync_on_commit: bool) -> WriteBatchOptions {
    WriteBatchOptions::new(max_pending_count, sync_on_commit)
}

// =============================================================================
// Test 1: Empty keys are rejected and leave the batch untouched
// =============================================================================
#[test]
fn empty_key_rejected() {
    let (db, _log) = mem_db();
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();
    wb.put(b"k", b"v").unwrap();

    assert!(matches!(wb.put(b"", b"v"), Err(Error::KeyIsEmpty)));
    assert!(matches!(wb.delete(b""), Err(Error::KeyIsEmpty)));

    assert_eq!(wb.len(), 1);
    assert_eq!(wb.pending(b"k").unwrap().value, b"v");
}

// =============================================================================
// Test 2: Last writer wins inside one batch
// =============================================================================
#[test]
fn last_writer_wins() {
    let (db, _log) = mem_db();
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();

    wb.put(b"k", b"v1").unwrap();
    wb.put(b"k", b"v2").unwrap();

    assert_eq!(wb.len(), 1);
    let pending = wb.pending(b"k").unwrap();
    assert_eq!(pending.rec_type, LogRecordType::Normal);
    assert_eq!(pending.value, b"v2");
}

// =============================================================================
// Test 3: Delete of a key not in the index cancels the pending put
// =============================================================================
#[test]
fn delete_cancels_uncommitted_put() {
    let (db, log) = mem_db();
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();

    wb.put(b"k", b"v").unwrap();
    wb.delete(b"k").unwrap();

    assert!(wb.pending(b"k").is_none());
    assert!(wb.is_empty());

    // Nothing to commit, nothing appended
    wb.commit().unwrap();
    assert_eq!(log.len(), 0);
}

// =============================================================================
// Test 4: Delete of an absent key is a no-op
// =============================================================================
#[test]
fn delete_absent_key_is_noop() {
    let (db, _log) = mem_db();
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();

    wb.delete(b"nobody").unwrap();
    assert!(wb.is_empty());
}

// =============================================================================
// Test 5: Delete of an indexed key always stages a tombstone
// =============================================================================
#[test]
fn delete_existing_key_stages_tombstone() {
    let (db, _log) = mem_db();
    db.put(b"k", b"on-disk").unwrap();

    // Not pending at all
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();
    wb.delete(b"k").unwrap();
    assert_eq!(wb.pending(b"k").unwrap().rec_type, LogRecordType::Deleted);

    // Pending put is superseded by the tombstone
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();
    wb.put(b"k", b"newer").unwrap();
    wb.delete(b"k").unwrap();
    let pending = wb.pending(b"k").unwrap();
    assert_eq!(pending.rec_type, LogRecordType::Deleted);
    assert!(pending.value.is_empty());

    wb.commit().unwrap();
    assert!(matches!(db.get(b"k"), Err(Error::KeyNotFound)));
}

// =============================================================================
// Test 6: Batch size limit
// =============================================================================
#[test]
fn commit_over_limit_fails_and_keeps_pending() {
    let (db, log) = mem_db();
    let wb = db.new_write_batch(opts(2, false)).unwrap();

    wb.put(b"a", b"1").unwrap();
    wb.put(b"b", b"2").unwrap();
    wb.put(b"c", b"3").unwrap();

    assert!(matches!(wb.commit(), Err(Error::ExceedMaxBatchSize)));
    assert_eq!(wb.len(), 3);
    assert_eq!(log.len(), 0);
    assert_eq!(db.seq_no(), 0, "no sequence number drawn");
    assert!(db.list_keys().is_empty());
}

// =============================================================================
// Test 7: Zero max_pending_count is rejected up front
// =============================================================================
#[test]
fn zero_limit_rejected() {
    let (db, _log) = mem_db();
    assert!(matches!(
        db.new_write_batch(opts(0, true)),
        Err(Error::InvalidConfig(_))
    ));
}

// =============================================================================
// Test 8: Empty commit is a no-op
// =============================================================================
#[test]
fn empty_commit_is_noop() {
    let (db, log) = mem_db();
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();

    wb.commit().unwrap();

    assert_eq!(log.len(), 0);
    assert_eq!(log.sync_count(), 0);
    assert_eq!(db.seq_no(), 0);
}

// =============================================================================
// Test 9: End-to-end: put a, put b, delete a, commit
// =============================================================================
#[test]
fn end_to_end_commit() {
    let (db, log) = mem_db();
    let wb = db.new_write_batch(opts(10, true)).unwrap();

    wb.put(b"a", b"1").unwrap();
    wb.put(b"b", b"2").unwrap();
    wb.delete(b"a").unwrap();
    wb.commit().unwrap();

    // "a" was cancelled before commit; only "b" and the marker hit the log
    let records = log.records();
    assert_eq!(records.len(), 2);

    let (b_record, _) = &records[0];
    assert_eq!(raw_key_of(b_record), b"b");
    assert_eq!(b_record.value, b"2");
    assert_eq!(b_record.rec_type, LogRecordType::Normal);

    let (marker, _) = &records[1];
    assert_eq!(raw_key_of(marker), TXN_FIN_KEY);
    assert_eq!(marker.rec_type, LogRecordType::TxnFinished);
    assert!(marker.value.is_empty());

    // One sequence number for the whole batch
    assert_eq!(seq_of(b_record), 1);
    assert_eq!(seq_of(marker), 1);
    assert_eq!(db.seq_no(), 1);

    assert_eq!(log.sync_count(), 1);
    assert!(matches!(db.get(b"a"), Err(Error::KeyNotFound)));
    assert_eq!(db.get(b"b").unwrap(), b"2");
    assert_eq!(db.list_keys(), vec![b"b".to_vec()]);
}

// =============================================================================
// Test 10: Commit resets the batch, which can then be reused
// =============================================================================
#[test]
fn commit_resets_batch_for_reuse() {
    let (db, _log) = mem_db();
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();

    wb.put(b"k1", b"v1").unwrap();
    wb.commit().unwrap();
    assert!(wb.is_empty());

    wb.put(b"k2", b"v2").unwrap();
    wb.commit().unwrap();

    assert_eq!(db.get(b"k1").unwrap(), b"v1");
    assert_eq!(db.get(b"k2").unwrap(), b"v2");
    assert_eq!(db.seq_no(), 2);
}

// =============================================================================
// Test 11: Sequence numbers increase across serial commits
// =============================================================================
#[test]
fn sequence_numbers_strictly_increase() {
    let (db, log) = mem_db();

    let wb1 = db.new_write_batch(WriteBatchOptions::default()).unwrap();
    wb1.put(b"x", b"1").unwrap();
    wb1.put(b"y", b"1").unwrap();
    wb1.commit().unwrap();

    let wb2 = db.new_write_batch(WriteBatchOptions::default()).unwrap();
    wb2.put(b"x", b"2").unwrap();
    wb2.commit().unwrap();

    let seqs: Vec<u64> = log.records().iter().map(|(r, _)| seq_of(r)).collect();
    // wb1: x, y, marker; wb2: x, marker
    assert_eq!(seqs, vec![1, 1, 1, 2, 2]);
    assert_eq!(db.get(b"x").unwrap(), b"2");
}

// =============================================================================
// Test 12: Pending writes are invisible until commit
// =============================================================================
#[test]
fn pending_writes_invisible_before_commit() {
    let (db, log) = mem_db();
    let wb = db.new_write_batch(WriteBatchOptions::default()).unwrap();

    wb.put(b"k", b"v").unwrap();
    assert!(matches!(db.get(b"k"), Err(Error::KeyNotFound)));
    assert_eq!(log.len(), 0);

    wb.commit().unwrap();
    assert_eq!(db.get(b"k").unwrap(), b"v");
}

// =============================================================================
// Test 13: sync_on_commit = false skips the sync
// =============================================================================
#[test]
fn no_sync_when_disabled() {
    let (db, log) = mem_db();
    let wb = db.new_write_batch(opts(10, false)).unwrap();

    wb.put(b"k", b"v").unwrap();
    wb.commit().unwrap();

    assert_eq!(log.sync_count(), 0);
    assert_eq!(db.get(b"k").unwrap(), b"v");
}

// =============================================================================
// Test 14: Non-batched writes use sequence 0 and don't move the counter
// =============================================================================
#[test]
fn non_batched_writes_use_sequence_zero() {
    let (db, log) = mem_db();

    db.put(b"k", b"v").unwrap();
    db.delete(b"k").unwrap();
    db.delete(b"k").unwrap(); // already gone: no-op

    let records = log.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|(r, _)| seq_of(r) == 0));
    assert_eq!(records[1].0.rec_type, LogRecordType::Deleted);
    assert_eq!(db.seq_no(), 0);
}
