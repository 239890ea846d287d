pub mod buffer_pool_manager;
pub mod lru_k_replacer;

pub use buffer_pool_manager::{BufferPoolManager, BufferPoolManagerBuilder, BufferPoolStats};
pub use lru_k_replacer::{AccessType, LRUKReplacer};
