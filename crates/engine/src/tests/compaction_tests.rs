use super::helpers::*;
use memtable::Lookup;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::tempdir;

// --------------------- Merge correctness ---------------------

#[test]
fn compaction_keeps_newest_value_per_key() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path(), 1 << 20, 3);

    // Three overlapping batches; the oracle tracks the newest write per key.
    let mut oracle: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();
    let batches: [(&[u32], &str); 3] = [
        (&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], "v1"),
        (&[5, 6, 7, 8, 9, 10, 11, 12, 13, 14], "v2"),
        (&[0, 1, 2, 3, 4], "v3"),
    ];

    for (batch, (keys, version)) in batches.into_iter().enumerate() {
        for &i in keys {
            let key = format!("k{:03}", i).into_bytes();
            let value = format!("{}-{}", version, i).into_bytes();
            oracle.insert(key.clone(), value.clone());
            store.put(key, value);
        }
        store.flush();
        if batch < 2 {
            wait_for_tables(&store, batch + 1);
        }
    }

    // The third flush crosses the threshold; the pass replaces 3 tables
    // with 1.
    let ok = wait_until(Duration::from_secs(10), || {
        store.pending_flushes() == 0 && store.sstable_count() == 1
    });
    assert!(
        ok,
        "compaction never settled, {} tables",
        store.sstable_count()
    );

    for (key, value) in &oracle {
        assert_eq!(
            store.get(key),
            Lookup::Found(value.clone()),
            "key {:?} must match the newest write",
            String::from_utf8_lossy(key)
        );
    }
}

#[test]
fn compaction_purges_tombstoned_keys() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path(), 1 << 20, 2);

    store.put(b"keep".to_vec(), b"v".to_vec());
    store.put(b"dead".to_vec(), b"soon".to_vec());
    store.flush();
    wait_for_tables(&store, 1);

    // Tombstone in a second table; its flush reaches the threshold.
    store.remove(b"dead".to_vec());
    store.flush();

    // Before the pass the tombstone answers Deleted; once the merged table
    // replaces the sources the key is simply gone. Wait for the merged table
    // to be registered, not just for the sources to leave the list.
    let ok = wait_until(Duration::from_secs(10), || {
        store.sstable_count() == 1
            && count_table_files(dir.path(), "index") == 1
            && store.get(b"dead") == Lookup::Absent
    });
    assert!(ok, "tombstone was never purged");
    assert_eq!(store.get(b"keep"), Lookup::Found(b"v".to_vec()));
}

#[test]
fn compaction_deletes_source_files() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path(), 1 << 20, 3);

    for round in 0..3u32 {
        store.put(format!("r{}", round).into_bytes(), b"v".to_vec());
        store.flush();
        if round < 2 {
            wait_for_tables(&store, (round + 1) as usize);
        }
    }

    let ok = wait_until(Duration::from_secs(10), || {
        store.pending_flushes() == 0
            && store.sstable_count() == 1
            && count_table_files(dir.path(), "index") == 1
            && count_table_files(dir.path(), "data") == 1
    });
    assert!(
        ok,
        "expected one table pair on disk, have {} index / {} data",
        count_table_files(dir.path(), "index"),
        count_table_files(dir.path(), "data")
    );

    for round in 0..3u32 {
        assert_eq!(
            store.get(format!("r{}", round).as_bytes()),
            Lookup::Found(b"v".to_vec())
        );
    }
}

#[test]
fn no_compaction_below_threshold() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path(), 1 << 20, 3);

    for round in 0..2u32 {
        store.put(format!("r{}", round).into_bytes(), b"v".to_vec());
        store.flush();
        wait_for_tables(&store, (round + 1) as usize);
    }

    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(store.sstable_count(), 2);
    assert_eq!(count_table_files(dir.path(), "index"), 2);
}

#[test]
fn reads_are_unchanged_by_compaction() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path(), 1 << 20, 3);

    for round in 0..3u32 {
        for i in 0..20u32 {
            store.put(
                format!("k{:03}", i).into_bytes(),
                format!("round{}", round).into_bytes(),
            );
        }
        store.flush();
        if round < 2 {
            wait_for_tables(&store, (round + 1) as usize);
        }
    }

    let ok = wait_until(Duration::from_secs(10), || {
        store.pending_flushes() == 0 && store.sstable_count() == 1
    });
    assert!(ok);

    for i in 0..20u32 {
        assert_eq!(
            store.get(format!("k{:03}", i).as_bytes()),
            Lookup::Found(b"round2".to_vec())
        );
    }
}

#[test]
fn writes_keep_flowing_after_compaction() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path(), 1 << 20, 2);

    store.put(b"a".to_vec(), b"1".to_vec());
    store.flush();
    wait_for_tables(&store, 1);
    store.put(b"b".to_vec(), b"2".to_vec());
    store.flush();

    let ok = wait_until(Duration::from_secs(10), || {
        store.pending_flushes() == 0 && store.sstable_count() == 1
    });
    assert!(ok);

    store.put(b"c".to_vec(), b"3".to_vec());
    assert_eq!(store.get(b"a"), Lookup::Found(b"1".to_vec()));
    assert_eq!(store.get(b"b"), Lookup::Found(b"2".to_vec()));
    assert_eq!(store.get(b"c"), Lookup::Found(b"3".to_vec()));
}
