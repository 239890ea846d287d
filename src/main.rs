use log::info;

use rustydb::config::Config;
use rustydb::storage::buffer::BufferPoolManager;
use rustydb::storage::disk::DiskManager;
use rustydb::storage::trie::TrieStore;

/// Brings up the storage core: loads configuration, opens the disk-backed
/// page store, and constructs the buffer pool and trie store on top of
/// it. This binary is a smoke-test scaffold, not a shell -- there is no
/// query language or client protocol here.
fn main() -> rustydb::common::Result<()> {
    let config = Config::load("rustydb")?;
    rustydb::logging::init(&config.log_level);

    info!(
        "starting rustydb storage core: pool_size={} replacer_k={} db_path={}",
        config.pool_size,
        config.replacer_k,
        config.db_path.display()
    );

    let disk_manager = DiskManager::new(&config.db_path)?;
    let pool = BufferPoolManager::new(config.pool_size, config.replacer_k, disk_manager);
    let trie_store = TrieStore::new();

    let page_id = pool.new_page().ok_or_else(|| rustydb::errinput!("buffer pool exhausted on startup"))?;
    pool.unpin_page(page_id, false);
    trie_store.put("boot_page_id", page_id);

    let stats = pool.stats();
    info!(
        "ready: allocated page {page_id}, cache_hits={} cache_misses={} evictions={}",
        stats.cache_hits, stats.cache_misses, stats.evictions
    );

    Ok(())
}
