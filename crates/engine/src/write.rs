//! Write path: `put()`, `remove()`, `flush()`, and rotation.
//!
//! All mutations go to the active memtable under its lock. Rotation seals
//! the active memtable into the flush queue and installs a fresh one; the
//! flush worker takes it from there.

use memtable::Memtable;

use crate::{LsmTree, Shared};

impl LsmTree {
    /// Inserts or overwrites a key-value pair.
    ///
    /// If the active memtable's size estimate reaches the configured
    /// threshold, it is sealed and replaced before the lock is released.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        let mut active = self.shared.active.lock().unwrap();
        active.put(key, value);
        if active.approx_size() >= self.shared.opts.memtable_max_bytes {
            self.shared.rotate(&mut active);
        }
    }

    /// Marks a key deleted by writing a tombstone into the active memtable.
    ///
    /// Older layers are not consulted; a later read finds the tombstone
    /// first.
    pub fn remove(&self, key: Vec<u8>) {
        let mut active = self.shared.active.lock().unwrap();
        active.remove(key);
    }

    /// Seals the active memtable on demand (a no-op when it is empty).
    ///
    /// The flush itself still happens on the background worker; callers that
    /// need the data on disk should watch [`pending_flushes`] and
    /// [`sstable_count`].
    ///
    /// [`pending_flushes`]: LsmTree::pending_flushes
    /// [`sstable_count`]: LsmTree::sstable_count
    pub fn flush(&self) {
        let mut active = self.shared.active.lock().unwrap();
        if !active.is_empty() {
            self.shared.rotate(&mut active);
        }
    }
}

impl Shared {
    /// Replaces the active memtable with a fresh one and queues the sealed
    /// one for flushing. Called with the active lock held.
    pub(crate) fn rotate(&self, active: &mut Memtable) {
        let sealed = std::mem::take(active);
        let mut queue = self.immutables.lock().unwrap();
        queue.push_back(sealed);
        self.flush_cv.notify_one();
    }
}
