use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use memtable::Memtable;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::format::{record_len, write_index_entry, write_record, DATA_EXT, INDEX_EXT, KEYS_PER_INDEX_ENTRY};

/// Writes the two halves of an SSTable from an in-order entry stream.
///
/// The entry count must be known up front because the index file starts with
/// its sparse-entry count (`ceil(records / 10)`).
///
/// On failure, partial `.index` / `.data` files may be left behind; the
/// engine's startup sweep removes unmatched halves and a table whose index
/// fails to load is never registered.
pub struct SsTableWriter {}

impl SsTableWriter {
    /// Materializes a sealed memtable at `stem` (`<stem>.data` +
    /// `<stem>.index`). Entries, tombstones included, are written in the
    /// memtable's ascending key order.
    pub fn create_from_memtable(stem: &Path, mem: &Memtable) -> Result<()> {
        Self::create_from_sorted(stem, mem.len(), mem.iter())
    }

    /// Writes `count` entries, which must arrive in strictly ascending key
    /// order, as a new table at `stem`. Used by the flush path (via
    /// [`create_from_memtable`](Self::create_from_memtable)) and by
    /// compaction with a merged entry stream.
    pub fn create_from_sorted<'a, I>(stem: &Path, count: usize, entries: I) -> Result<()>
    where
        I: Iterator<Item = (&'a [u8], &'a [u8])>,
    {
        let mut index = BufWriter::new(File::create(stem.with_extension(INDEX_EXT))?);
        let mut data = BufWriter::new(File::create(stem.with_extension(DATA_EXT))?);

        let sparse_count = count.div_ceil(KEYS_PER_INDEX_ENTRY);
        index.write_u64::<LittleEndian>(sparse_count as u64)?;

        let mut offset = 0u64;
        for (i, (key, value)) in entries.enumerate() {
            if i % KEYS_PER_INDEX_ENTRY == 0 {
                write_index_entry(&mut index, key, offset)?;
            }
            write_record(&mut data, key, value)?;
            offset += record_len(key, value);
        }

        data.flush()?;
        data.get_ref().sync_all()?;
        index.flush()?;
        index.get_ref().sync_all()?;
        Ok(())
    }
}
