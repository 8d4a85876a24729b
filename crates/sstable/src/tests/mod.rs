
use memtable::Memtable;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a memtable with `n` entries `keyNNNN -> valueNNNN`.
pub fn sample_memtable(n: usize) -> Memtable {
    let mut mem = Memtable::new();
    for i in 0..n {
        mem.put(
            format!("key{:04}", i).into_bytes(),
            format!("value{:04}", i).into_bytes(),
        );
    }
    mem
}

/// Writes `mem` as a table under a fresh tempdir; returns the dir (keep it
/// alive) and the stem.
pub fn write_table(mem: &Memtable) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("sstable_00000000000000000001");
    super::SsTableWriter::create_from_memtable(&stem, mem).unwrap();
    (dir, stem)
}

pub fn data_path(stem: &Path) -> PathBuf {
    stem.with_extension(super::DATA_EXT)
}

pub fn index_path(stem: &Path) -> PathBuf {
    stem.with_extension(super::INDEX_EXT)
}
