//! Scoped RAII handles over a pinned, resident page.
//!
//! All three guards pin their page for as long as they're alive and unpin
//! it exactly once, on drop. `ReadPageGuard`/`WritePageGuard` additionally
//! hold the frame's content latch for their whole lifetime, acquired only
//! after the pin is already in place; `BasicPageGuard` holds no content
//! latch and leaves locking of individual reads/writes to the caller.

use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::constants::PAGE_SIZE;
use crate::storage::buffer::buffer_pool_manager::BufferPoolManager;
use crate::storage::disk::PageId;
use crate::storage::page::FrameId;

/// A pinned page with no held content latch. Reads and writes to the bytes
/// go through [`BasicPageGuard::read`]/[`BasicPageGuard::write`], each of
/// which locks the frame's content only for the duration of the closure.
pub struct BasicPageGuard<'a> {
    pool: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    is_dirty: bool,
}

impl<'a> BasicPageGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPoolManager, frame_id: FrameId, page_id: PageId) -> Self {
        BasicPageGuard {
            pool,
            frame_id,
            page_id,
            is_dirty: false,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Marks the page dirty so it's written back when the guard (or
    /// whichever guard it's upgraded/downgraded into) is eventually
    /// unpinned.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn read<R>(&self, f: impl FnOnce(&[u8; PAGE_SIZE]) -> R) -> R {
        let content = self.pool.frame_content(self.frame_id).read().unwrap();
        f(&content)
    }

    pub fn write<R>(&mut self, f: impl FnOnce(&mut [u8; PAGE_SIZE]) -> R) -> R {
        self.is_dirty = true;
        let mut content = self.pool.frame_content(self.frame_id).write().unwrap();
        f(&mut content)
    }

    /// Consumes this guard and returns a [`ReadPageGuard`] latched for
    /// reading, preserving the pin across the swap.
    pub fn upgrade_read(self) -> ReadPageGuard<'a> {
        let content = self.pool.frame_content(self.frame_id).read().unwrap();
        let (pool, frame_id, page_id) = (self.pool, self.frame_id, self.page_id);
        std::mem::forget(self);
        ReadPageGuard {
            pool,
            frame_id,
            page_id,
            content: Some(content),
        }
    }

    /// Consumes this guard and returns a [`WritePageGuard`] latched for
    /// writing, preserving the pin across the swap.
    pub fn upgrade_write(self) -> WritePageGuard<'a> {
        let content = self.pool.frame_content(self.frame_id).write().unwrap();
        let (pool, frame_id, page_id) = (self.pool, self.frame_id, self.page_id);
        std::mem::forget(self);
        WritePageGuard {
            pool,
            frame_id,
            page_id,
            content: Some(content),
        }
    }
}

impl Drop for BasicPageGuard<'_> {
    fn drop(&mut self) {
        self.pool.unpin_page(self.page_id, self.is_dirty);
    }
}

/// A pinned page latched for reading for the guard's whole lifetime.
pub struct ReadPageGuard<'a> {
    pool: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    content: Option<RwLockReadGuard<'a, [u8; PAGE_SIZE]>>,
}

impl<'a> ReadPageGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPoolManager, frame_id: FrameId, page_id: PageId) -> Self {
        let content = pool.frame_content(frame_id).read().unwrap();
        ReadPageGuard {
            pool,
            frame_id,
            page_id,
            content: Some(content),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        self.content.as_ref().unwrap()
    }

    #[allow(dead_code)]
    pub(crate) fn frame_id(&self) -> FrameId {
        self.frame_id
    }
}

impl Drop for ReadPageGuard<'_> {
    fn drop(&mut self) {
        // Release the content latch before unpinning, matching the
        // "latch released strictly before the pin drops" contract.
        self.content.take();
        self.pool.unpin_page(self.page_id, false);
    }
}

/// A pinned page latched for writing for the guard's whole lifetime.
/// Always unpins dirty on drop -- a write guard having existed is itself
/// grounds to assume the page may have changed.
pub struct WritePageGuard<'a> {
    pool: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    content: Option<RwLockWriteGuard<'a, [u8; PAGE_SIZE]>>,
}

impl<'a> WritePageGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPoolManager, frame_id: FrameId, page_id: PageId) -> Self {
        let content = pool.frame_content(frame_id).write().unwrap();
        WritePageGuard {
            pool,
            frame_id,
            page_id,
            content: Some(content),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        self.content.as_ref().unwrap()
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        self.content.as_mut().unwrap()
    }

    #[allow(dead_code)]
    pub(crate) fn frame_id(&self) -> FrameId {
        self.frame_id
    }
}

impl Drop for WritePageGuard<'_> {
    fn drop(&mut self) {
        self.content.take();
        self.pool.unpin_page(self.page_id, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::buffer::buffer_pool_manager::BufferPoolManager;
    use crate::storage::disk::DiskManager;
    use tempfile::TempDir;

    fn test_pool(pool_size: usize, k: usize) -> (BufferPoolManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let dm = DiskManager::new(dir.path().join("test.db")).unwrap();
        (BufferPoolManager::new(pool_size, k, dm), dir)
    }

    #[test]
    fn basic_guard_unpins_on_drop() {
        let (pool, _dir) = test_pool(2, 2);
        let page_id = {
            let mut guard = pool.new_page_guarded().unwrap();
            guard.write(|data| data[0] = 9);
            guard.page_id()
        };
        assert_eq!(pool.pin_count(page_id), Some(0));
    }

    #[test]
    fn write_guard_persists_bytes_and_unpins_dirty() {
        let (pool, _dir) = test_pool(2, 2);
        let page_id = pool.new_page().unwrap();
        pool.unpin_page(page_id, false);

        {
            let mut guard = pool.fetch_page_write(page_id).unwrap();
            guard.data_mut()[0] = 77;
        }
        assert_eq!(pool.pin_count(page_id), Some(0));

        let guard = pool.fetch_page_read(page_id).unwrap();
        assert_eq!(guard.data()[0], 77);
    }

    #[test]
    fn upgrade_read_preserves_pin_and_data() {
        let (pool, _dir) = test_pool(2, 2);
        let mut basic = pool.new_page_guarded().unwrap();
        basic.write(|data| data[1] = 5);
        let page_id = basic.page_id();
        let read_guard = basic.upgrade_read();
        assert_eq!(read_guard.data()[1], 5);
        drop(read_guard);
        assert_eq!(pool.pin_count(page_id), Some(0));
    }
}
