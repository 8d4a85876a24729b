//! Background compaction worker.
//!
//! When the table count reaches the threshold, the oldest batch is merged
//! into a single new table: every record of every source is streamed into an
//! ordered map with later (newer) tables overwriting earlier ones, so the
//! newest surviving value per key wins — the same precedence the read path
//! applies. Tombstones whose keys have no newer shadowed value left are
//! dropped entirely.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use memtable::TOMBSTONE;
use sstable::{file_stem, SsTable, SsTableWriter};

use crate::{Shared, COMPACTION_PAUSE};

pub(crate) fn compaction_worker(shared: Arc<Shared>) {
    let mut guard = shared.compaction_mtx.lock().unwrap();
    loop {
        guard = shared
            .compaction_cv
            .wait_while(guard, |_| {
                shared.is_running()
                    && shared.sstables.lock().unwrap().len()
                        < shared.opts.sstable_compaction_threshold
            })
            .unwrap();
        if !shared.is_running() {
            return;
        }
        if let Err(e) = compact_once(&shared) {
            log::warn!("compaction pass failed, sources retained: {:#}", e);
        }
        thread::sleep(COMPACTION_PAUSE);
    }
}

/// One compaction pass: drain the oldest `threshold` tables, merge, swap.
///
/// Source files are only deleted after every record was merged and the
/// replacement table is durable and re-opened; any failure before that point
/// re-queues the sources in their original positions. Partial output files
/// are left for the startup sweep.
pub(crate) fn compact_once(shared: &Shared) -> Result<()> {
    let threshold = shared.opts.sstable_compaction_threshold;

    let mut batch: Vec<SsTable> = {
        let mut tables = shared.sstables.lock().unwrap();
        if tables.len() < threshold {
            return Ok(());
        }
        tables.drain(..threshold).collect()
    };

    // The list is maintained oldest-first already; the filename sort is a
    // defensive tie-breaker.
    batch.sort_by(|a, b| a.index_path().cmp(b.index_path()));

    match merge_batch(&batch) {
        Ok(merged) => match write_merged(shared, merged) {
            Ok(table) => {
                for old in &batch {
                    remove_table_files(old);
                }
                let new_stem = table.index_path().display().to_string();
                let mut tables = shared.sstables.lock().unwrap();
                tables.push(table);
                log::info!("compacted {} tables into {}", batch.len(), new_stem);
                Ok(())
            }
            Err(e) => {
                requeue(shared, batch);
                Err(e)
            }
        },
        Err(e) => {
            requeue(shared, batch);
            Err(e)
        }
    }
}

/// Streams every record of every source into one ordered map. The batch is
/// oldest-first and `insert` overwrites, so the newest value per key
/// survives. Tombstones are dropped after the merge.
fn merge_batch(batch: &[SsTable]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
    let mut merged = BTreeMap::new();
    for table in batch {
        let records = table
            .scan()
            .with_context(|| format!("opening {}", table.data_path().display()))?;
        for record in records {
            let (key, value) =
                record.with_context(|| format!("reading {}", table.data_path().display()))?;
            merged.insert(key, value);
        }
    }
    merged.retain(|_, value| value != TOMBSTONE);
    Ok(merged)
}

/// Writes the merge result as a new table whose timestamp is strictly
/// greater than every source's, and opens a handle on it.
fn write_merged(shared: &Shared, merged: BTreeMap<Vec<u8>, Vec<u8>>) -> Result<SsTable> {
    let stem = shared.dir.join(file_stem(shared.next_table_timestamp()));
    SsTableWriter::create_from_sorted(
        &stem,
        merged.len(),
        merged.iter().map(|(k, v)| (k.as_slice(), v.as_slice())),
    )?;
    SsTable::open_stem(&stem)
}

fn remove_table_files(table: &SsTable) {
    if let Err(e) = fs::remove_file(table.index_path()) {
        log::warn!("failed to delete {}: {}", table.index_path().display(), e);
    }
    if let Err(e) = fs::remove_file(table.data_path()) {
        log::warn!("failed to delete {}: {}", table.data_path().display(), e);
    }
}

/// Puts a drained batch back at the front of the list, preserving order.
fn requeue(shared: &Shared, batch: Vec<SsTable>) {
    let mut tables = shared.sstables.lock().unwrap();
    for table in batch.into_iter().rev() {
        tables.insert(0, table);
    }
}
