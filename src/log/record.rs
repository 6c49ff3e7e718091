use crate::error::{Error, Result};

/// Kind of record stored in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRecordType {
    /// A live key/value pair.
    Normal = 0x01,
    /// A tombstone. The value is empty.
    Deleted = 0x02,
    /// Completion marker closing a write batch. Carries the sentinel key.
    TxnFinished = 0x03,
}

impl LogRecordType {
    fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(LogRecordType::Normal),
            0x02 => Ok(LogRecordType::Deleted),
            0x03 => Ok(LogRecordType::TxnFinished),
            _ => Err(Error::Corruption(format!("invalid record type: {}", byte))),
        }
    }
}

/// A single record in a data file.
///
/// On-disk format:
/// ```text
/// ┌──────────┬────────┬──────────┬───────────┬───────────┬──────────┐
/// │ CRC (4B) │ Len(4B)│ Type(1B) │ Key Len(4B│ Key (var) │Val (var) │
/// └──────────┴────────┴──────────┴───────────┴───────────┴──────────┘
/// ```
///
/// CRC covers everything after the CRC field itself. `key` is whatever the
/// writer hands over; every record the engine appends carries a
/// sequence-prefixed key (see [`crate::log::key`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub rec_type: LogRecordType,
}

const CRC_SIZE: usize = 4;
const LEN_SIZE: usize = 4;
const TYPE_SIZE: usize = 1;
const KEY_LEN_SIZE: usize = 4;
pub const HEADER_SIZE: usize = CRC_SIZE + LEN_SIZE + TYPE_SIZE + KEY_LEN_SIZE;

impl LogRecord {
    /// Create a Normal record.
    pub fn normal(key: Vec<u8>, value: Vec<u8>) -> Self {
        LogRecord {
            key,
            value,
            rec_type: LogRecordType::Normal,
        }
    }

    /// Create a Deleted (tombstone) record.
    pub fn deleted(key: Vec<u8>) -> Self {
        LogRecord {
            key,
            value: Vec::new(),
            rec_type: LogRecordType::Deleted,
        }
    }

    /// Create a completion marker record. The key is expected to be the
    /// sequence-encoded sentinel.
    pub fn txn_finished(key: Vec<u8>) -> Self {
        LogRecord {
            key,
            value: Vec::new(),
            rec_type: LogRecordType::TxnFinished,
        }
    }

    /// Serialize this record to bytes (including CRC header).
    pub fn encode(&self) -> Vec<u8> {
        let payload_len = TYPE_SIZE + KEY_LEN_SIZE + self.key.len() + self.value.len();
        let mut buf = Vec::with_capacity(CRC_SIZE + LEN_SIZE + payload_len);

        // CRC placeholder, filled once the rest is written
        buf.extend_from_slice(&[0u8; CRC_SIZE]);
        buf.extend_from_slice(&(payload_len as u32).to_le_bytes());
        buf.push(self.rec_type as u8);
        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);

        let crc = crc32fast::hash(&buf[CRC_SIZE..]);
        buf[0..CRC_SIZE].copy_from_slice(&crc.to_le_bytes());

        buf
    }

    /// Deserialize a record from the front of `data`. Trailing bytes are
    /// ignored. Returns an error if the record is short or the CRC doesn't match.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Corruption("record too short".into()));
        }

        let stored_crc = read_u32(&data[0..4]);
        let payload_len = read_u32(&data[4..8]) as usize;

        let total_len = CRC_SIZE + LEN_SIZE + payload_len;
        if data.len() < total_len || total_len < HEADER_SIZE {
            return Err(Error::Corruption("record truncated".into()));
        }

        let computed_crc = crc32fast::hash(&data[CRC_SIZE..total_len]);
        if stored_crc != computed_crc {
            return Err(Error::Corruption("CRC mismatch".into()));
        }

        let mut offset = CRC_SIZE + LEN_SIZE;

        let rec_type = LogRecordType::from_u8(data[offset])?;
        offset += TYPE_SIZE;

        let key_len = read_u32(&data[offset..offset + KEY_LEN_SIZE]) as usize;
        offset += KEY_LEN_SIZE;

        if offset + key_len > total_len {
            return Err(Error::Corruption("key length exceeds record".into()));
        }
        let key = data[offset..offset + key_len].to_vec();
        offset += key_len;

        let value = data[offset..total_len].to_vec();

        Ok(LogRecord {
            key,
            value,
            rec_type,
        })
    }

    /// Size of this record when serialized on disk.
    pub fn encoded_size(&self) -> usize {
        HEADER_SIZE + self.key.len() + self.value.len()
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(raw)
}
