pub mod trie;
pub mod trie_store;

pub use trie::Trie;
pub use trie_store::{TrieStore, ValueGuard};
