//! Read path: layered `get()`.
//!
//! Layers are consulted newest to oldest — active memtable, sealed
//! memtables in reverse queue order, SSTables in reverse list order — and
//! the search stops at the first definitive answer. A tombstone is
//! definitive: it must not be skipped to resurrect an older value.

use memtable::Lookup;

use crate::LsmTree;

impl LsmTree {
    /// Three-valued point lookup across every layer of the store.
    ///
    /// Each layer's lock is released before the next is taken. An I/O error
    /// from one SSTable is logged and treated as absence in that table, and
    /// the search continues into older tables.
    pub fn get(&self, key: &[u8]) -> Lookup {
        {
            let active = self.shared.active.lock().unwrap();
            match active.get(key) {
                Lookup::Absent => {}
                definitive => return definitive,
            }
        }

        {
            let immutables = self.shared.immutables.lock().unwrap();
            for sealed in immutables.iter().rev() {
                match sealed.get(key) {
                    Lookup::Absent => {}
                    definitive => return definitive,
                }
            }
        }

        {
            let tables = self.shared.sstables.lock().unwrap();
            for table in tables.iter().rev() {
                match table.get(key) {
                    Ok(Lookup::Absent) => {}
                    Ok(definitive) => return definitive,
                    Err(e) => {
                        log::warn!(
                            "lookup in {} failed, treating as absent: {:#}",
                            table.data_path().display(),
                            e
                        );
                    }
                }
            }
        }

        Lookup::Absent
    }
}
