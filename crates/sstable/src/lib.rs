//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk storage files for the DriftKV storage engine.
//!
//! When an in-memory [`memtable::Memtable`] is sealed, the flush worker
//! persists it as an SSTable. SSTables are *write-once, read-many* — once
//! created they are never modified, and only the compaction worker deletes
//! them.
//!
//! ## File layout
//!
//! Each table is a pair of sibling files sharing a stem
//! (`sstable_<timestamp>`):
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ <stem>.data — records in ascending key order                  │
//! │                                                               │
//! │ key_len (u32) | key | val_len (u32) | value                   │
//! │ ... repeated for each entry ...                               │
//! │                                                               │
//! │ Tombstoned keys carry the 4-byte sentinel as their value.     │
//! ├───────────────────────────────────────────────────────────────┤
//! │ <stem>.index — sparse index                                   │
//! │                                                               │
//! │ entry_count (u64)                                             │
//! │ key_len (u32) | key | data_offset (u64)                       │
//! │ ... one entry per 10th record (indices 0, 10, 20, …) ...      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. `data_offset` is the byte position of the
//! record's `key_len` field, so a point lookup binary-searches the in-memory
//! index for the greatest entry `<=` the target and then scans forward at
//! most 10 records.

mod format;
mod reader;
mod writer;

pub use format::{file_stem, parse_stem_timestamp, DATA_EXT, INDEX_EXT, KEYS_PER_INDEX_ENTRY};
pub use reader::{RecordIter, SsTable};
pub use writer::SsTableWriter;

#[cfg(test)]
mod tests;
