use rustydb::storage::trie::{Trie, TrieStore};

#[test]
fn trie_snapshots_are_independent() {
    let v0 = Trie::new();
    let v1 = v0.put("name", "ada".to_string());
    let v2 = v1.put("name", "lovelace".to_string());
    let v3 = v2.remove("name");

    assert_eq!(v0.get::<String>("name"), None);
    assert_eq!(v1.get::<String>("name"), Some(&"ada".to_string()));
    assert_eq!(v2.get::<String>("name"), Some(&"lovelace".to_string()));
    assert_eq!(v3.get::<String>("name"), None);
}

#[test]
fn deep_shared_prefix_structural_sharing() {
    let base = Trie::new().put("database", 1i32).put("datagram", 2i32);
    let extended = base.put("datastore", 3i32);

    assert_eq!(base.get::<i32>("datastore"), None);
    assert_eq!(extended.get::<i32>("database"), Some(&1));
    assert_eq!(extended.get::<i32>("datagram"), Some(&2));
    assert_eq!(extended.get::<i32>("datastore"), Some(&3));
}

#[test]
fn store_guard_stays_valid_across_unrelated_writes() {
    let store = TrieStore::new();
    store.put("x", 1i32);
    store.put("y", 100i32);

    let guard = store.get::<i32>("x").unwrap();
    store.put("y", 200i32);
    store.remove("y");

    assert_eq!(*guard, 1);
    assert!(store.get::<i32>("y").is_none());
}
