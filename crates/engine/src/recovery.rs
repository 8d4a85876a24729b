//! Startup: orphan sweep and table loading.
//!
//! A table is only real when both halves exist and its index loads. Halves
//! without a sibling are leftovers from an interrupted flush or compaction
//! and are deleted; a table whose index fails to load is skipped (its files
//! stay put for inspection).

use anyhow::Result;
use sstable::{parse_stem_timestamp, SsTable, DATA_EXT, INDEX_EXT};
use std::fs;
use std::path::Path;

/// Deletes `.index` / `.data` files whose sibling half is missing.
pub(crate) fn sweep_orphans(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext,
            None => continue,
        };
        let sibling = if ext == INDEX_EXT {
            path.with_extension(DATA_EXT)
        } else if ext == DATA_EXT {
            path.with_extension(INDEX_EXT)
        } else {
            continue;
        };
        if !sibling.exists() {
            log::warn!("sweeping orphaned table file {}", path.display());
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("failed to sweep {}: {}", path.display(), e);
            }
        }
    }
    Ok(())
}

/// Loads every table in the directory, oldest first (filename order).
pub(crate) fn load_tables(dir: &Path) -> Result<Vec<SsTable>> {
    let mut tables = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(INDEX_EXT) {
            continue;
        }
        let data_path = path.with_extension(DATA_EXT);
        match SsTable::open(path.clone(), data_path) {
            Ok(table) => tables.push(table),
            Err(e) => log::warn!("skipping unreadable table {}: {:#}", path.display(), e),
        }
    }
    tables.sort_by(|a, b| a.index_path().cmp(b.index_path()));
    Ok(tables)
}

/// Highest creation timestamp among the loaded tables; seeds the stamp
/// clamp so new stems keep sorting after recovered ones even if the clock
/// stepped backwards across the restart.
pub(crate) fn newest_timestamp(tables: &[SsTable]) -> u64 {
    tables
        .iter()
        .filter_map(|t| parse_stem_timestamp(t.index_path()))
        .max()
        .unwrap_or(0)
}
