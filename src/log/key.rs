//! Sequence-tagged keys.
//!
//! Every record the engine appends stores its key as
//!
//! ```text
//! ┌──────────────────────┬──────────────────┐
//! │ seq_no (LEB128, 1-10B)│ raw key (var)    │
//! └──────────────────────┴──────────────────┘
//! ```
//!
//! The varint delimits itself, so raw keys may contain any bytes. Recovery
//! groups records by the decoded sequence number.

use bytes::BufMut;
use prost::encoding::{decode_varint, encode_varint, encoded_len_varint};

use crate::error::{Error, Result};

/// Sequence number of writes made outside any batch.
pub const NON_TXN_SEQ_NO: u64 = 0;

/// Raw key carried by every completion marker.
pub const TXN_FIN_KEY: &[u8] = b"txn-fix";

/// Prefix `key` with the varint encoding of `seq_no`.
pub fn encode_key(key: &[u8], seq_no: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len_varint(seq_no) + key.len());
    encode_varint(seq_no, &mut buf);
    buf.put_slice(key);
    buf
}

/// Split a stored key into `(raw_key, seq_no)`.
pub fn decode_key(enc_key: &[u8]) -> Result<(Vec<u8>, u64)> {
    let mut buf = enc_key;
    let seq_no = decode_varint(&mut buf)
        .map_err(|e| Error::Corruption(format!("bad sequence prefix: {e}")))?;
    Ok((buf.to_vec(), seq_no))
}
