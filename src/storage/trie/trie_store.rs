//! A thread-safe wrapper around [`Trie`] coordinating readers and writers
//! so that concurrent `Get`s never block on, or observe a half-applied,
//! `Put`/`Remove`.
//!
//! Two locks: `root` is held only long enough to clone out the current
//! snapshot (an `Arc` bump, not a deep copy) or swap in a new one, so
//! readers never contend with a writer's (potentially large) trie
//! traversal. `write_lock` serializes writers against each other so a
//! `Put` always builds its new root on top of the latest one, not a
//! stale one a concurrent writer already superseded.

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Mutex;

use log::trace;

use super::trie::Trie;

/// A snapshot of a single value read from a [`TrieStore`], together with
/// the trie snapshot it came from so the reference stays valid for as
/// long as the guard is alive.
pub struct ValueGuard<T> {
    trie: Trie,
    key: String,
    _marker: PhantomData<T>,
}

impl<T: Send + Sync + 'static> ValueGuard<T> {
    fn new(trie: Trie, key: String) -> Self {
        ValueGuard {
            trie,
            key,
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> Deref for ValueGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.trie
            .get::<T>(&self.key)
            .expect("key was present in the snapshot this guard was built from")
    }
}

/// Thread-safe, reader/writer-coordinated handle over a persistent
/// [`Trie`]. `Get` never blocks a concurrent `Put`/`Remove` for longer
/// than it takes to clone the root pointer; `Put`/`Remove` serialize
/// against each other but never against readers.
#[derive(Default)]
pub struct TrieStore {
    root: Mutex<Trie>,
    write_lock: Mutex<()>,
}

impl TrieStore {
    pub fn new() -> TrieStore {
        TrieStore {
            root: Mutex::new(Trie::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns a guard over the value at `key` if one of type `T` exists.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<ValueGuard<T>> {
        let snapshot = self.root.lock().unwrap().clone();
        if snapshot.get::<T>(key).is_some() {
            Some(ValueGuard::new(snapshot, key.to_string()))
        } else {
            None
        }
    }

    /// Stores `value` at `key`, replacing whatever was there. Serializes
    /// with other writers; never blocks a concurrent `get`.
    pub fn put<T: Send + Sync + 'static>(&self, key: &str, value: T) {
        let _writer = self.write_lock.lock().unwrap();
        let current = self.root.lock().unwrap().clone();
        let updated = current.put(key, value);
        *self.root.lock().unwrap() = updated;
        trace!("put key {key:?}");
    }

    /// Removes the value at `key`, if any.
    pub fn remove(&self, key: &str) {
        let _writer = self.write_lock.lock().unwrap();
        let current = self.root.lock().unwrap().clone();
        let updated = current.remove(key);
        *self.root.lock().unwrap() = updated;
        trace!("removed key {key:?}");
    }
}
