use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Instant;

use hdrhistogram::Histogram;
use log::{debug, warn};

use crate::common::constants::PAGE_SIZE;
use crate::storage::buffer::lru_k_replacer::{AccessType, LRUKReplacer};
use crate::storage::disk::{DiskManager, PageId};
use crate::storage::page::{BasicPageGuard, Frame, FrameId, FrameMeta, ReadPageGuard, WritePageGuard};

/// Bookkeeping protected by the pool's single internal latch: which page
/// occupies each frame, its pin count and dirty bit, the page table, and
/// the free list. Frame *content* lives outside this struct, each in its
/// own `RwLock` (see [`Frame`]), so guards can latch it independently.
struct Inner {
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    metas: Vec<FrameMeta>,
}

#[derive(Debug, Default)]
pub struct BufferPoolStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    /// 99th-percentile disk-read latency in microseconds, observed on the
    /// miss path. `None` until at least one miss has been served.
    pub disk_read_latency_us_p99: Option<u64>,
}

struct Stats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    disk_read_latency_us: Mutex<Histogram<u64>>,
}

impl Stats {
    fn new() -> Self {
        Stats {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            // 3 significant figures is more than enough resolution for a
            // microsecond-scale latency distribution.
            disk_read_latency_us: Mutex::new(Histogram::new(3).unwrap()),
        }
    }
}

/// Fixed-size pool of in-memory frames mediating reads and writes between
/// callers and a [`DiskManager`]. A single internal latch (`inner`)
/// serializes the pool's bookkeeping, including the disk I/O performed
/// while servicing a miss; per-frame content lives in its own lock so
/// page guards can hold a content latch independently, acquired only
/// after a frame has already been pinned.
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<Frame>,
    inner: Mutex<Inner>,
    replacer: Mutex<LRUKReplacer>,
    disk_manager: Mutex<DiskManager>,
    stats: Stats,
}

#[derive(Default)]
pub struct BufferPoolManagerBuilder {
    pool_size: Option<usize>,
    replacer_k: Option<usize>,
    disk_manager: Option<DiskManager>,
}

impl BufferPoolManagerBuilder {
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    pub fn replacer_k(mut self, replacer_k: usize) -> Self {
        self.replacer_k = Some(replacer_k);
        self
    }

    pub fn disk_manager(mut self, disk_manager: DiskManager) -> Self {
        self.disk_manager = Some(disk_manager);
        self
    }

    pub fn build(self) -> BufferPoolManager {
        let pool_size = self.pool_size.expect("`pool_size` not initialized before build.");
        let replacer_k = self.replacer_k.expect("`replacer_k` not initialized before build.");
        let disk_manager = self.disk_manager.expect("`disk_manager` not initialized before build.");

        BufferPoolManager::new(pool_size, replacer_k, disk_manager)
    }
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, replacer_k: usize, disk_manager: DiskManager) -> Self {
        assert!(pool_size > 0, "pool_size must be positive");

        let frames = (0..pool_size).map(|_| Frame::new()).collect();
        let metas = vec![FrameMeta::empty(); pool_size];
        let free_list = (0..pool_size).collect();

        BufferPoolManager {
            pool_size,
            frames,
            inner: Mutex::new(Inner {
                page_table: HashMap::new(),
                free_list,
                metas,
            }),
            replacer: Mutex::new(LRUKReplacer::new(pool_size, replacer_k)),
            disk_manager: Mutex::new(disk_manager),
            stats: Stats::new(),
        }
    }

    pub fn builder() -> BufferPoolManagerBuilder {
        BufferPoolManagerBuilder::default()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub(crate) fn frame_content(&self, frame_id: FrameId) -> &RwLock<[u8; PAGE_SIZE]> {
        &self.frames[frame_id].data
    }

    /// Finds a frame to hold a page, taking one from the free list first
    /// and falling back to evicting. Flushes the victim if it was dirty.
    /// `inner` must already be locked; the victim's old page table entry
    /// is removed here, but the caller installs the new mapping.
    fn obtain_frame_locked(&self, inner: &mut Inner) -> Option<FrameId> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            return Some(frame_id);
        }

        let mut replacer = self.replacer.lock().unwrap();
        let frame_id = replacer.evict()?;
        drop(replacer);
        self.stats.evictions.fetch_add(1, Ordering::Relaxed);

        let victim = inner.metas[frame_id];
        inner.page_table.remove(&victim.page_id);
        if victim.is_dirty {
            let data = *self.frames[frame_id].data.read().unwrap();
            self.disk_manager.lock().unwrap().write_page(victim.page_id, &data);
        }
        debug!("reclaimed frame {frame_id} (was page {})", victim.page_id);
        Some(frame_id)
    }

    /// Allocates a brand-new page, pins it once, and returns its id.
    pub fn new_page(&self) -> Option<PageId> {
        let mut inner = self.inner.lock().unwrap();
        let frame_id = self.obtain_frame_locked(&mut inner)?;

        let page_id = self.disk_manager.lock().unwrap().allocate_new_page();
        self.frames[frame_id].reset();
        inner.metas[frame_id] = FrameMeta {
            page_id,
            pin_count: 1,
            is_dirty: false,
        };
        inner.page_table.insert(page_id, frame_id);

        let mut replacer = self.replacer.lock().unwrap();
        replacer.record_access(&frame_id, AccessType::Lookup);
        replacer.set_evictable(&frame_id, false);

        Some(page_id)
    }

    /// Pins `page_id`, bringing it in from disk if it isn't already
    /// resident. Returns `None` if every frame is pinned.
    fn pin(&self, page_id: PageId) -> Option<FrameId> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(&frame_id) = inner.page_table.get(&page_id) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            inner.metas[frame_id].pin_count += 1;

            let mut replacer = self.replacer.lock().unwrap();
            replacer.record_access(&frame_id, AccessType::Lookup);
            replacer.set_evictable(&frame_id, false);
            return Some(frame_id);
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let frame_id = self.obtain_frame_locked(&mut inner)?;

        let started = Instant::now();
        let data = self.disk_manager.lock().unwrap().read_page(page_id);
        let elapsed_us = started.elapsed().as_micros().min(u64::MAX as u128) as u64;
        if let Ok(mut hist) = self.stats.disk_read_latency_us.lock() {
            let _ = hist.record(elapsed_us);
        }

        *self.frames[frame_id].data.write().unwrap() = data;
        inner.metas[frame_id] = FrameMeta {
            page_id,
            pin_count: 1,
            is_dirty: false,
        };
        inner.page_table.insert(page_id, frame_id);

        let mut replacer = self.replacer.lock().unwrap();
        replacer.record_access(&frame_id, AccessType::Lookup);
        replacer.set_evictable(&frame_id, false);

        Some(frame_id)
    }

    /// Unpins `page_id`. Once the pin count reaches zero the frame becomes
    /// a candidate for eviction. Returns `false` if `page_id` is not
    /// resident or already has a zero pin count -- a reported precondition
    /// violation, not a fatal one.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let frame_id = match inner.page_table.get(&page_id) {
            Some(&f) => f,
            None => return false,
        };

        let meta = &mut inner.metas[frame_id];
        if meta.pin_count == 0 {
            return false;
        }
        meta.pin_count -= 1;
        meta.is_dirty = meta.is_dirty || is_dirty;

        if meta.pin_count == 0 {
            let mut replacer = self.replacer.lock().unwrap();
            replacer.set_evictable(&frame_id, true);
        }
        true
    }

    /// Writes `page_id` to disk unconditionally and clears its dirty bit.
    /// Returns `false` if `page_id` is not resident.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let data = {
            let inner = self.inner.lock().unwrap();
            let frame_id = match inner.page_table.get(&page_id) {
                Some(&f) => f,
                None => return false,
            };
            *self.frames[frame_id].data.read().unwrap()
        };

        self.disk_manager.lock().unwrap().write_page(page_id, &data);

        let mut inner = self.inner.lock().unwrap();
        if let Some(&frame_id) = inner.page_table.get(&page_id) {
            inner.metas[frame_id].is_dirty = false;
        }
        true
    }

    /// Flushes every resident page to disk.
    pub fn flush_all_pages(&self) {
        let page_ids: Vec<PageId> = self.inner.lock().unwrap().page_table.keys().copied().collect();
        for page_id in page_ids {
            self.flush_page(page_id);
        }
    }

    /// Deletes `page_id` from the pool and deallocates it on disk. A no-op
    /// (returns `true`) if the page was never resident. Returns `false`
    /// without deleting anything if the page is currently pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let frame_id = match inner.page_table.get(&page_id).copied() {
            Some(f) => f,
            None => return true,
        };
        if inner.metas[frame_id].pin_count > 0 {
            return false;
        }

        inner.page_table.remove(&page_id);
        inner.metas[frame_id] = FrameMeta::empty();
        self.frames[frame_id].reset();

        let mut replacer = self.replacer.lock().unwrap();
        replacer.set_evictable(&frame_id, false);
        replacer.remove(&frame_id);
        drop(replacer);

        inner.free_list.push_back(frame_id);
        drop(inner);

        // `page_id` is captured above, before anything could rebind it to
        // a sentinel -- deallocation always targets the page actually
        // being deleted.
        self.disk_manager.lock().unwrap().deallocate_page(page_id);
        true
    }

    pub fn pin_count(&self, page_id: PageId) -> Option<usize> {
        let inner = self.inner.lock().unwrap();
        inner.page_table.get(&page_id).map(|&f| inner.metas[f].pin_count)
    }

    pub fn stats(&self) -> BufferPoolStats {
        let hist = self.stats.disk_read_latency_us.lock().unwrap();
        let p99 = if hist.len() > 0 {
            Some(hist.value_at_quantile(0.99))
        } else {
            None
        };
        if self.stats.misses.load(Ordering::Relaxed) > 0 && p99.is_none() {
            warn!("buffer pool recorded misses but no latency samples");
        }
        BufferPoolStats {
            cache_hits: self.stats.hits.load(Ordering::Relaxed),
            cache_misses: self.stats.misses.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
            disk_read_latency_us_p99: p99,
        }
    }

    /// Allocates a new page and returns it wrapped in a [`BasicPageGuard`].
    pub fn new_page_guarded(&self) -> Option<BasicPageGuard<'_>> {
        let page_id = self.new_page()?;
        let frame_id = *self.inner.lock().unwrap().page_table.get(&page_id).unwrap();
        Some(BasicPageGuard::new(self, frame_id, page_id))
    }

    pub fn fetch_page_basic(&self, page_id: PageId) -> Option<BasicPageGuard<'_>> {
        let frame_id = self.pin(page_id)?;
        Some(BasicPageGuard::new(self, frame_id, page_id))
    }

    pub fn fetch_page_read(&self, page_id: PageId) -> Option<ReadPageGuard<'_>> {
        let frame_id = self.pin(page_id)?;
        Some(ReadPageGuard::new(self, frame_id, page_id))
    }

    pub fn fetch_page_write(&self, page_id: PageId) -> Option<WritePageGuard<'_>> {
        let frame_id = self.pin(page_id)?;
        Some(WritePageGuard::new(self, frame_id, page_id))
    }
}
