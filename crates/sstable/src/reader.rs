use anyhow::{ensure, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use memtable::{Lookup, TOMBSTONE};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{DATA_EXT, INDEX_EXT};

/// Maximum key size we'll allocate during reads (64 KiB). Prevents OOM on corrupt files.
const MAX_KEY_BYTES: usize = 64 * 1024;
/// Maximum value size we'll allocate during reads (10 MiB). Prevents OOM on corrupt files.
const MAX_VALUE_BYTES: usize = 10 * 1024 * 1024;

/// Handle to one immutable on-disk table.
///
/// [`open`](SsTable::open) loads the whole sparse index into memory as a
/// sorted `Vec<(key, offset)>`. Point lookups binary-search the index for the
/// greatest entry `<=` the target key, then scan forward through at most
/// `KEYS_PER_INDEX_ENTRY` data records.
///
/// Each lookup opens its own read handle on the data file and closes it when
/// done, so any number of readers can share one `SsTable` without
/// coordination.
pub struct SsTable {
    index_path: PathBuf,
    data_path: PathBuf,
    /// Sparse index in ascending key order, one entry per 10th record.
    index: Vec<(Vec<u8>, u64)>,
}

impl SsTable {
    /// Opens the table rooted at `stem` (`<stem>.index` + `<stem>.data`) and
    /// loads its sparse index.
    pub fn open_stem(stem: &Path) -> Result<Self> {
        Self::open(stem.with_extension(INDEX_EXT), stem.with_extension(DATA_EXT))
    }

    /// Opens a table from explicit index and data paths.
    ///
    /// # Errors
    ///
    /// Fails if the index file is missing, truncated, or structurally
    /// implausible (oversized key length). The caller is expected to discard
    /// the handle in that case.
    pub fn open(index_path: PathBuf, data_path: PathBuf) -> Result<Self> {
        let index = Self::load_index(&index_path)?;
        Ok(Self {
            index_path,
            data_path,
            index,
        })
    }

    fn load_index(path: &Path) -> Result<Vec<(Vec<u8>, u64)>> {
        let mut r = BufReader::new(File::open(path)?);
        let count = r.read_u64::<LittleEndian>()?;

        let mut index = Vec::new();
        for _ in 0..count {
            let key_len = r.read_u32::<LittleEndian>()? as usize;
            ensure!(
                key_len <= MAX_KEY_BYTES,
                "corrupt index: key_len {} exceeds maximum {}",
                key_len,
                MAX_KEY_BYTES
            );
            let mut key = vec![0u8; key_len];
            r.read_exact(&mut key)?;
            let offset = r.read_u64::<LittleEndian>()?;
            index.push((key, offset));
        }
        // Records were written in ascending key order, so the index is
        // already sorted.
        Ok(index)
    }

    /// Data-file offset to start scanning from for `key`, or `None` when the
    /// table is empty.
    fn find_start_offset(&self, key: &[u8]) -> Option<u64> {
        let first = self.index.first()?;
        if key < first.0.as_slice() {
            return Some(first.1);
        }
        let pos = self.index.partition_point(|(k, _)| k.as_slice() <= key);
        Some(self.index[pos - 1].1)
    }

    /// Point lookup for a single key.
    ///
    /// Seeks to the sparse-index position and scans forward: an equal stored
    /// key resolves to `Found` (or `Deleted` for the tombstone sentinel), a
    /// greater stored key or end-of-file proves absence. The sparsity bound
    /// keeps the scan at 10 records or fewer.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or an implausible record length. The
    /// engine treats either as "not in this table" and moves on to older
    /// layers.
    pub fn get(&self, key: &[u8]) -> Result<Lookup> {
        let start = match self.find_start_offset(key) {
            Some(offset) => offset,
            None => return Ok(Lookup::Absent),
        };

        let mut r = BufReader::new(File::open(&self.data_path)?);
        r.seek(SeekFrom::Start(start))?;

        loop {
            let key_len = match r.read_u32::<LittleEndian>() {
                Ok(n) => n as usize,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(Lookup::Absent),
                Err(e) => return Err(e.into()),
            };
            ensure!(
                key_len <= MAX_KEY_BYTES,
                "corrupt data file: key_len {} exceeds maximum {}",
                key_len,
                MAX_KEY_BYTES
            );
            let mut stored_key = vec![0u8; key_len];
            r.read_exact(&mut stored_key)?;

            // Records are sorted: once past the target, the key isn't here.
            if stored_key.as_slice() > key {
                return Ok(Lookup::Absent);
            }

            let val_len = r.read_u32::<LittleEndian>()? as usize;
            ensure!(
                val_len <= MAX_VALUE_BYTES,
                "corrupt data file: val_len {} exceeds maximum {}",
                val_len,
                MAX_VALUE_BYTES
            );

            if stored_key.as_slice() == key {
                let mut value = vec![0u8; val_len];
                r.read_exact(&mut value)?;
                if value == TOMBSTONE {
                    return Ok(Lookup::Deleted);
                }
                return Ok(Lookup::Found(value));
            }

            r.seek_relative(val_len as i64)?;
        }
    }

    /// Sequential scan over every record in the data file, tombstones
    /// included, in ascending key order. Compaction drains source tables
    /// through this.
    pub fn scan(&self) -> Result<RecordIter> {
        let file = File::open(&self.data_path)?;
        Ok(RecordIter {
            reader: BufReader::new(file),
            done: false,
        })
    }

    /// Path of the sparse-index half. Filename order is creation order.
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Path of the data half.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Number of loaded sparse-index entries (`ceil(records / 10)`).
    pub fn index_len(&self) -> usize {
        self.index.len()
    }
}

/// Streaming iterator over the `(key, value)` records of one data file.
pub struct RecordIter {
    reader: BufReader<File>,
    done: bool,
}

impl Iterator for RecordIter {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl RecordIter {
    fn read_record(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let key_len = match self.reader.read_u32::<LittleEndian>() {
            Ok(n) => n as usize,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        ensure!(
            key_len <= MAX_KEY_BYTES,
            "corrupt data file: key_len {} exceeds maximum {}",
            key_len,
            MAX_KEY_BYTES
        );
        let mut key = vec![0u8; key_len];
        self.reader.read_exact(&mut key)?;

        let val_len = self.reader.read_u32::<LittleEndian>()? as usize;
        ensure!(
            val_len <= MAX_VALUE_BYTES,
            "corrupt data file: val_len {} exceeds maximum {}",
            val_len,
            MAX_VALUE_BYTES
        );
        let mut value = vec![0u8; val_len];
        self.reader.read_exact(&mut value)?;

        Ok(Some((key, value)))
    }
}
