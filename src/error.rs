use std::fmt;
use std::io;

/// Unified error type for the storage engine.
#[derive(Debug)]
pub enum Error {
    /// IO error outside the commit path (open, read, rotation).
    Io(io::Error),
    /// Data corruption detected (CRC mismatch, bad record type, bad key prefix).
    Corruption(String),
    /// Key not found in the index.
    KeyNotFound,
    /// Put or Delete called with a zero-length key.
    KeyIsEmpty,
    /// Commit attempted with more pending entries than the batch allows.
    ExceedMaxBatchSize,
    /// The log store failed to append a batch record or its completion marker.
    /// Nothing from the batch reached the index.
    AppendFailure(io::Error),
    /// The log store failed to sync after the completion marker was appended.
    /// The index was not updated.
    SyncFailure(io::Error),
    /// Options rejected at open or batch creation.
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Corruption(msg) => write!(f, "Corruption: {msg}"),
            Error::KeyNotFound => write!(f, "Key not found"),
            Error::KeyIsEmpty => write!(f, "Key is empty"),
            Error::ExceedMaxBatchSize => write!(f, "Exceeded the max batch size"),
            Error::AppendFailure(e) => write!(f, "Failed to append log record: {e}"),
            Error::SyncFailure(e) => write!(f, "Failed to sync log: {e}"),
            Error::InvalidConfig(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) | Error::AppendFailure(e) | Error::SyncFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
