use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Result as IoResult, Write};

/// Extension of the sparse-index half of a table.
pub const INDEX_EXT: &str = "index";
/// Extension of the data half of a table.
pub const DATA_EXT: &str = "data";

/// One sparse-index entry is written per this many data records.
pub const KEYS_PER_INDEX_ENTRY: usize = 10;

/// Builds the shared file stem for a table created at `timestamp_ms`.
///
/// The timestamp is zero-padded so that lexicographic filename order equals
/// numeric (creation) order; the engine relies on this both at startup and
/// when placing a compacted table.
pub fn file_stem(timestamp_ms: u64) -> String {
    format!("sstable_{:020}", timestamp_ms)
}

/// Recovers the creation timestamp from a table file path, or `None` for a
/// file that does not follow the stem convention.
pub fn parse_stem_timestamp(path: &std::path::Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("sstable_")?
        .parse()
        .ok()
}

/// Appends one data record: `key_len | key | val_len | value`.
pub fn write_record<W: Write>(w: &mut W, key: &[u8], value: &[u8]) -> IoResult<()> {
    w.write_u32::<LittleEndian>(key.len() as u32)?;
    w.write_all(key)?;
    w.write_u32::<LittleEndian>(value.len() as u32)?;
    w.write_all(value)?;
    Ok(())
}

/// On-disk size of the record `write_record` produces.
pub fn record_len(key: &[u8], value: &[u8]) -> u64 {
    4 + key.len() as u64 + 4 + value.len() as u64
}

/// Appends one sparse-index entry: `key_len | key | offset`.
pub fn write_index_entry<W: Write>(w: &mut W, key: &[u8], offset: u64) -> IoResult<()> {
    w.write_u32::<LittleEndian>(key.len() as u32)?;
    w.write_all(key)?;
    w.write_u64::<LittleEndian>(offset)?;
    Ok(())
}
