//! # Engine - DriftKV LSM coordinator
//!
//! Ties the [`memtable`] and [`sstable`] crates together into a complete
//! LSM-tree key-value store with two background workers.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                  LSM TREE                     │
//! │                                               │
//! │ write.rs → active memtable insert             │
//! │              |                                │
//! │              |  (size threshold crossed?)     │
//! │              |            yes                 │
//! │              v                                │
//! │        rotate → sealed queue → flush worker   │
//! │              |                                │
//! │              |  (table count >= threshold?)   │
//! │              |            yes                 │
//! │              v                                │
//! │        compaction worker → merged SSTable     │
//! │                                               │
//! │ read.rs → active → sealed (newest first)      │
//! │            → SSTables (newest first)          │
//! │           (first definitive answer wins)      │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module          | Purpose                                            |
//! |-----------------|----------------------------------------------------|
//! | [`lib.rs`]      | `LsmTree` struct, open, accessors, `Debug`, `Drop` |
//! | [`write`]       | `put()`, `remove()`, `flush()`, rotation           |
//! | [`read`]        | layered `get()`                                    |
//! | [`flush`]       | background flush worker                            |
//! | [`compaction`]  | background compaction worker + merge pass          |
//! | [`recovery`]    | startup sweep + table loading                      |
//!
//! ## Concurrency
//!
//! Four independent locks: the active memtable, the sealed-memtable queue
//! (paired with the flush condvar), the table list, and the compaction mutex
//! (paired with its condvar). Readers take them in layer order and release
//! each before the next; the only nestings are rotation pushing into the
//! queue under the active lock, and the compaction wait predicate peeking
//! the table count — neither can form a cycle.
//!
//! ## Durability
//!
//! Only flushed SSTables survive a restart. The flush worker drains the
//! sealed queue on shutdown, but whatever is still in the active memtable
//! when the process exits is lost. There is no write-ahead log.

mod compaction;
mod flush;
mod read;
mod recovery;
mod write;

use anyhow::Result;
use memtable::Memtable;
use sstable::SsTable;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default active-memtable size threshold that triggers rotation (32 MiB).
pub const MEMTABLE_MAX_BYTES: usize = 32 * 1024 * 1024;

/// Default SSTable count that triggers compaction.
pub const SSTABLE_COMPACTION_THRESHOLD: usize = 100;

/// Pause between compaction passes.
const COMPACTION_PAUSE: Duration = Duration::from_secs(2);

/// Runtime tunables. The defaults match the production constants; tests and
/// the binaries override them.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Rotate the active memtable when its size estimate reaches this.
    pub memtable_max_bytes: usize,
    /// Compact the oldest batch once this many SSTables accumulate.
    pub sstable_compaction_threshold: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            memtable_max_bytes: MEMTABLE_MAX_BYTES,
            sstable_compaction_threshold: SSTABLE_COMPACTION_THRESHOLD,
        }
    }
}

/// State shared between callers and the background workers.
pub(crate) struct Shared {
    pub(crate) dir: PathBuf,
    pub(crate) opts: Options,
    /// The one mutable memtable. Guards mutation, reads, and rotation.
    pub(crate) active: Mutex<Memtable>,
    /// Sealed memtables awaiting flush, oldest first.
    pub(crate) immutables: Mutex<VecDeque<Memtable>>,
    pub(crate) flush_cv: Condvar,
    /// On-disk tables, oldest first. Newer tables shadow older ones.
    pub(crate) sstables: Mutex<Vec<SsTable>>,
    pub(crate) compaction_mtx: Mutex<()>,
    pub(crate) compaction_cv: Condvar,
    pub(crate) running: AtomicBool,
    /// Last issued table timestamp; clamped so stems are strictly
    /// increasing even for back-to-back flushes.
    last_stamp: AtomicU64,
}

impl Shared {
    /// Millisecond timestamp for the next table, strictly greater than any
    /// previously issued (or recovered) one.
    pub(crate) fn next_table_timestamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let mut prev = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self.last_stamp.compare_exchange_weak(
                prev,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wakes the compaction worker. The mutex is taken so the signal cannot
    /// fall into the gap between the worker's predicate check and its wait.
    /// Callers must not hold the SSTables lock (the worker's predicate takes
    /// it while holding the compaction mutex).
    pub(crate) fn signal_compaction(&self) {
        let _guard = self.compaction_mtx.lock().unwrap();
        self.compaction_cv.notify_one();
    }
}

/// The LSM-tree store: one active memtable, a queue of sealed memtables, an
/// ordered list of SSTables, and two background workers (flush, compaction).
///
/// All operations take `&self`; the internal locks make the store safe to
/// share across threads behind an `Arc`.
pub struct LsmTree {
    shared: Arc<Shared>,
    flush_worker: Option<JoinHandle<()>>,
    compaction_worker: Option<JoinHandle<()>>,
}

impl LsmTree {
    /// Opens (or creates) a store on `dir` with default [`Options`].
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open_with(dir, Options::default())
    }

    /// Opens (or creates) a store on `dir`.
    ///
    /// Startup sweeps orphaned table halves, loads every surviving table in
    /// filename (creation) order, then starts the workers. If the loaded
    /// count already meets the compaction threshold the compaction worker is
    /// signalled immediately.
    pub fn open_with<P: AsRef<Path>>(dir: P, opts: Options) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        recovery::sweep_orphans(&dir)?;
        let tables = recovery::load_tables(&dir)?;
        let loaded = tables.len();
        let newest = recovery::newest_timestamp(&tables);

        let shared = Arc::new(Shared {
            dir,
            opts,
            active: Mutex::new(Memtable::new()),
            immutables: Mutex::new(VecDeque::new()),
            flush_cv: Condvar::new(),
            sstables: Mutex::new(tables),
            compaction_mtx: Mutex::new(()),
            compaction_cv: Condvar::new(),
            running: AtomicBool::new(true),
            last_stamp: AtomicU64::new(newest),
        });

        let flush_worker = thread::Builder::new().name("driftkv-flush".into()).spawn({
            let shared = Arc::clone(&shared);
            move || flush::flush_worker(shared)
        })?;
        let compaction_worker = thread::Builder::new()
            .name("driftkv-compaction".into())
            .spawn({
                let shared = Arc::clone(&shared);
                move || compaction::compaction_worker(shared)
            })?;

        log::info!(
            "store opened at {} ({} tables loaded)",
            shared.dir.display(),
            loaded
        );
        if loaded >= shared.opts.sstable_compaction_threshold {
            shared.signal_compaction();
        }

        Ok(LsmTree {
            shared,
            flush_worker: Some(flush_worker),
            compaction_worker: Some(compaction_worker),
        })
    }

    /// Current size estimate of the active memtable.
    pub fn memtable_bytes(&self) -> usize {
        self.shared.active.lock().unwrap().approx_size()
    }

    /// Sealed memtables not yet flushed to disk.
    pub fn pending_flushes(&self) -> usize {
        self.shared.immutables.lock().unwrap().len()
    }

    /// Number of on-disk tables currently registered.
    pub fn sstable_count(&self) -> usize {
        self.shared.sstables.lock().unwrap().len()
    }

    /// Data directory this store is rooted at.
    pub fn dir(&self) -> &Path {
        &self.shared.dir
    }
}

impl std::fmt::Debug for LsmTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LsmTree")
            .field("dir", &self.shared.dir)
            .field("memtable_bytes", &self.memtable_bytes())
            .field("pending_flushes", &self.pending_flushes())
            .field("sstable_count", &self.sstable_count())
            .field("memtable_max_bytes", &self.shared.opts.memtable_max_bytes)
            .field(
                "sstable_compaction_threshold",
                &self.shared.opts.sstable_compaction_threshold,
            )
            .finish()
    }
}

/// Cooperative shutdown: stop the workers and join them.
///
/// The flush worker drains the sealed queue before exiting; the active
/// memtable is dropped without flushing (the documented loss window).
impl Drop for LsmTree {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        // Take each worker's mutex before notifying so the wakeup cannot
        // slip between a worker's predicate check and its wait.
        {
            let _queue = self.shared.immutables.lock().unwrap();
            self.shared.flush_cv.notify_all();
        }
        {
            let _guard = self.shared.compaction_mtx.lock().unwrap();
            self.shared.compaction_cv.notify_all();
        }
        if let Some(handle) = self.flush_worker.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.compaction_worker.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests;
