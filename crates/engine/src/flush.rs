//! Background flush worker.
//!
//! Waits on the sealed-memtable queue and materializes each sealed memtable
//! as an SSTable, oldest first. On shutdown the queue is drained before the
//! worker exits, so only the active memtable can lose data.

use std::sync::Arc;

use sstable::{file_stem, SsTable, SsTableWriter};

use crate::Shared;

pub(crate) fn flush_worker(shared: Arc<Shared>) {
    loop {
        let sealed = {
            let mut queue = shared.immutables.lock().unwrap();
            loop {
                if let Some(memtable) = queue.pop_front() {
                    break memtable;
                }
                if !shared.is_running() {
                    return;
                }
                queue = shared.flush_cv.wait(queue).unwrap();
            }
        };
        // The write happens outside the queue lock so writers can keep
        // rotating while this memtable goes to disk.
        flush_memtable(&shared, sealed);
    }
}

/// Writes one sealed memtable as a new table and registers it.
///
/// A failed write drops the memtable — acknowledged data loss, logged. A
/// table that was written but cannot be re-opened is likewise skipped; the
/// startup sweep or a later open decides its fate.
fn flush_memtable(shared: &Shared, memtable: memtable::Memtable) {
    let stem = shared.dir.join(file_stem(shared.next_table_timestamp()));

    if let Err(e) = SsTableWriter::create_from_memtable(&stem, &memtable) {
        log::warn!(
            "flush of {} entries to {} failed, dropping memtable: {:#}",
            memtable.len(),
            stem.display(),
            e
        );
        return;
    }

    match SsTable::open_stem(&stem) {
        Ok(table) => {
            let should_compact = {
                let mut tables = shared.sstables.lock().unwrap();
                tables.push(table);
                log::debug!(
                    "flushed {} entries to {} ({} tables)",
                    memtable.len(),
                    stem.display(),
                    tables.len()
                );
                tables.len() >= shared.opts.sstable_compaction_threshold
            };
            // Signal outside the SSTables lock; the compaction worker's wait
            // predicate takes it the other way around.
            if should_compact {
                shared.signal_compaction();
            }
        }
        Err(e) => {
            log::warn!("flushed table {} failed to open: {:#}", stem.display(), e);
        }
    }
}
