use super::*;

// -------------------- SkipList --------------------

#[test]
fn empty_list_finds_nothing() {
    let list = SkipList::new();
    assert!(list.get(b"anything").is_none());
    assert!(list.is_empty());
    assert_eq!(list.approx_size(), 0);
}

#[test]
fn insert_and_get_single_key() {
    let mut list = SkipList::new();
    list.insert(b"k1".to_vec(), b"v1".to_vec());
    assert_eq!(list.get(b"k1"), Some(b"v1".as_slice()));
    assert_eq!(list.len(), 1);
}

#[test]
fn insert_overwrites_existing_key() {
    let mut list = SkipList::new();
    list.insert(b"k".to_vec(), b"first".to_vec());
    list.insert(b"k".to_vec(), b"second".to_vec());
    assert_eq!(list.get(b"k"), Some(b"second".as_slice()));
    assert_eq!(list.len(), 1);
}

#[test]
fn get_misses_between_keys() {
    let mut list = SkipList::new();
    list.insert(b"a".to_vec(), b"1".to_vec());
    list.insert(b"c".to_vec(), b"3".to_vec());
    assert!(list.get(b"b").is_none());
    assert!(list.get(b"0").is_none());
    assert!(list.get(b"d").is_none());
}

#[test]
fn iteration_is_sorted_regardless_of_insert_order() {
    let mut list = SkipList::new();
    for key in ["pear", "apple", "zucchini", "mango", "banana"] {
        list.insert(key.as_bytes().to_vec(), b"x".to_vec());
    }
    let keys: Vec<&[u8]> = list.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![
            b"apple".as_slice(),
            b"banana".as_slice(),
            b"mango".as_slice(),
            b"pear".as_slice(),
            b"zucchini".as_slice(),
        ]
    );
}

#[test]
fn iteration_yields_every_entry_once() {
    let mut list = SkipList::new();
    for i in 0..1_000u32 {
        // Insert in a scrambled order to exercise mid-list splices.
        let k = (i * 7919) % 1_000;
        list.insert(format!("key{:04}", k).into_bytes(), format!("v{}", k).into_bytes());
    }
    let collected: Vec<(Vec<u8>, Vec<u8>)> = list
        .iter()
        .map(|(k, v)| (k.to_vec(), v.to_vec()))
        .collect();
    assert_eq!(collected.len(), 1_000);
    for (i, (k, v)) in collected.iter().enumerate() {
        assert_eq!(k, &format!("key{:04}", i).into_bytes());
        assert_eq!(v, &format!("v{}", i).into_bytes());
    }
}

#[test]
fn size_accrues_on_first_insert_only() {
    let mut list = SkipList::new();
    list.insert(b"key".to_vec(), b"value".to_vec());
    assert_eq!(list.approx_size(), 8);

    // Overwrite does not re-accrue, even with a larger value.
    list.insert(b"key".to_vec(), b"a-much-longer-value".to_vec());
    assert_eq!(list.approx_size(), 8);

    list.insert(b"k2".to_vec(), b"v2".to_vec());
    assert_eq!(list.approx_size(), 12);
}

#[test]
fn empty_key_is_an_ordinary_key() {
    let mut list = SkipList::new();
    assert!(list.get(b"").is_none());
    list.insert(b"".to_vec(), b"empty".to_vec());
    assert_eq!(list.get(b""), Some(b"empty".as_slice()));
    list.insert(b"a".to_vec(), b"1".to_vec());
    let keys: Vec<&[u8]> = list.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"".as_slice(), b"a".as_slice()]);
}

#[test]
fn large_insert_load_stays_consistent() {
    let mut list = SkipList::new();
    for i in 0..10_000u64 {
        list.insert(format!("key{:06}", i).into_bytes(), b"payload".to_vec());
    }
    assert_eq!(list.len(), 10_000);
    assert_eq!(list.get(b"key005000"), Some(b"payload".as_slice()));
    assert!(list.get(b"key010000").is_none());
}

// -------------------- Memtable --------------------

#[test]
fn put_get_remove_round_trip() {
    let mut m = Memtable::new();
    m.put(b"foo".to_vec(), b"bar".to_vec());
    assert_eq!(m.get(b"foo"), Lookup::Found(b"bar".to_vec()));

    m.remove(b"foo".to_vec());
    assert_eq!(m.get(b"foo"), Lookup::Deleted);

    m.put(b"foo".to_vec(), b"baz".to_vec());
    assert_eq!(m.get(b"foo"), Lookup::Found(b"baz".to_vec()));
}

#[test]
fn missing_key_is_absent_not_deleted() {
    let m = Memtable::new();
    assert_eq!(m.get(b"ghost"), Lookup::Absent);
}

#[test]
fn remove_of_unseen_key_records_tombstone() {
    let mut m = Memtable::new();
    m.remove(b"never-written".to_vec());
    assert_eq!(m.get(b"never-written"), Lookup::Deleted);
    assert_eq!(m.len(), 1);
}

#[test]
fn value_equal_to_tombstone_reads_as_deleted() {
    // The sentinel is in-band: a caller storing those exact bytes is
    // indistinguishable from a deletion.
    let mut m = Memtable::new();
    m.put(b"k".to_vec(), TOMBSTONE.to_vec());
    assert_eq!(m.get(b"k"), Lookup::Deleted);
}

#[test]
fn iteration_includes_tombstones() {
    let mut m = Memtable::new();
    m.put(b"a".to_vec(), b"1".to_vec());
    m.remove(b"b".to_vec());
    m.put(b"c".to_vec(), b"3".to_vec());

    let entries: Vec<(Vec<u8>, Vec<u8>)> =
        m.iter().map(|(k, v)| (k.to_vec(), v.to_vec())).collect();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1], (b"b".to_vec(), TOMBSTONE.to_vec()));
}

#[test]
fn tombstone_accrues_size_for_fresh_key() {
    let mut m = Memtable::new();
    m.remove(b"gone".to_vec());
    assert_eq!(m.approx_size(), 4 + TOMBSTONE.len());

    // Tombstoning an existing key is an overwrite: no re-accrual.
    m.put(b"kept".to_vec(), b"value".to_vec());
    let before = m.approx_size();
    m.remove(b"kept".to_vec());
    assert_eq!(m.approx_size(), before);
}

#[test]
fn lookup_into_value() {
    assert_eq!(Lookup::Found(b"v".to_vec()).into_value(), Some(b"v".to_vec()));
    assert_eq!(Lookup::Deleted.into_value(), None);
    assert_eq!(Lookup::Absent.into_value(), None);
}
