use crate::{LsmTree, Options};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Threshold high enough that compaction never fires during a test.
pub const NO_COMPACTION: usize = usize::MAX;

pub fn open_store(dir: &Path, memtable_max_bytes: usize, threshold: usize) -> LsmTree {
    LsmTree::open_with(
        dir,
        Options {
            memtable_max_bytes,
            sstable_compaction_threshold: threshold,
        },
    )
    .unwrap()
}

/// Polls `cond` every few milliseconds until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return cond();
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Waits for the flush queue to drain and exactly `count` tables to be
/// registered. Only meaningful while compaction is disabled.
pub fn wait_for_tables(store: &LsmTree, count: usize) {
    let ok = wait_until(Duration::from_secs(10), || {
        store.pending_flushes() == 0 && store.sstable_count() == count
    });
    assert!(
        ok,
        "expected {} tables, have {} ({} flushes pending)",
        count,
        store.sstable_count(),
        store.pending_flushes()
    );
}

pub fn count_table_files(dir: &Path, ext: &str) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|x| x == ext)
                .unwrap_or(false)
        })
        .count()
}
