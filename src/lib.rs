//! # Bitcask Storage Engine
//!
//! A log-structured key-value engine in the Bitcask style.
//!
//! ## Core idea
//! Every write appends an immutable record to the end of a data file; an
//! in-memory index maps each key to its latest record. Nothing on disk is
//! ever rewritten.
//!
//! ## Atomic batches
//! A [`WriteBatch`] groups puts and deletes. On commit, all of its records
//! are appended under one sequence number followed by a completion marker,
//! and only then applied to the index. Recovery replays a sequence number
//! only if its marker made it to disk, so a batch is either fully visible
//! or not at all, without any separate transaction log.

pub mod batch;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod log;
pub mod recovery;
pub mod types;

// Public re-exports for the top-level API
pub use batch::WriteBatch;
pub use config::{Options, WriteBatchOptions};
pub use db::DB;
pub use error::{Error, Result};
pub use index::IndexType;
pub use types::RecordPos;
