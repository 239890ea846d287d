use std::collections::{HashMap, VecDeque};

use log::{debug, trace};

use crate::storage::page::FrameId;

/// Advisory access-type tag, carried through `record_access` for interface
/// parity with callers that distinguish access patterns. It never affects
/// eviction order -- only the timestamp does.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AccessType {
    Unknown = 0,
    Lookup,
    Scan,
    Index,
}

#[derive(Debug)]
struct LRUKNode {
    /// Last (up to) `k` access timestamps, oldest first.
    history: VecDeque<usize>,
    is_evictable: bool,
}

impl LRUKNode {
    fn new() -> Self {
        Self {
            history: VecDeque::new(),
            is_evictable: false,
        }
    }

    /// `None` means infinite backward k-distance (fewer than `k` accesses
    /// recorded yet).
    fn backward_k_distance(&self, k: usize, current_timestamp: usize) -> Option<usize> {
        if self.history.len() < k {
            None
        } else {
            Some(current_timestamp - self.history.front().unwrap())
        }
    }

    fn most_recent_access(&self) -> usize {
        *self.history.back().unwrap()
    }
}

/// LRU-K replacement policy: evicts the evictable frame with the largest
/// backward k-distance. Frames with fewer than `k` recorded accesses have
/// infinite distance and are preferred for eviction over any frame with a
/// finite distance; ties among infinite-distance frames are broken by
/// classic LRU (oldest most-recent access first).
#[derive(Debug)]
pub struct LRUKReplacer {
    node_store: HashMap<FrameId, LRUKNode>,
    current_timestamp: usize,
    /// Number of evictable frames. Not necessarily `node_store.len()`.
    curr_size: usize,
    max_size: usize,
    k: usize,
}

impl LRUKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "k must be positive");
        Self {
            node_store: HashMap::new(),
            current_timestamp: 0,
            curr_size: 0,
            max_size: num_frames,
            k,
        }
    }

    pub fn builder() -> LRUKReplacerBuilder {
        LRUKReplacerBuilder::default()
    }

    /// Evicts the evictable frame with the largest backward k-distance,
    /// clearing its history and marking it non-evictable. Returns `None`
    /// when no frame is currently evictable.
    pub fn evict(&mut self) -> Option<FrameId> {
        // Ordering key: infinite-distance candidates always beat finite
        // ones; among infinite candidates the smaller (older) most-recent
        // timestamp wins; among finite candidates the larger distance wins.
        let mut victim: Option<(FrameId, bool, usize)> = None;

        for (&frame_id, node) in &self.node_store {
            if !node.is_evictable {
                continue;
            }
            let candidate = match node.backward_k_distance(self.k, self.current_timestamp) {
                None => (frame_id, true, node.most_recent_access()),
                Some(dist) => (frame_id, false, dist),
            };

            victim = Some(match victim {
                None => candidate,
                Some(best) => pick_victim(best, candidate),
            });
        }

        let (frame_id, ..) = victim?;
        debug!("evicting frame {frame_id}");
        // Reclaim inline rather than calling `remove`: `remove`'s
        // precondition is "the frame must already be non-evictable" (its
        // public contract, §4.1), but the victim selected above is
        // evictable by construction (the loop skips non-evictable nodes).
        // Drop its history and adjust `curr_size` directly here instead.
        self.node_store.remove(&frame_id);
        self.curr_size -= 1;
        Some(frame_id)
    }

    /// Records an access to `frame_id` at the current timestamp, then
    /// advances the clock. Creates the frame's history on first sight.
    /// `frame_id` must be within `[0, num_frames)`; out-of-range ids are a
    /// programmer error and abort the process.
    pub fn record_access(&mut self, frame_id: &FrameId, _access_type: AccessType) {
        assert!(*frame_id < self.max_size, "frame_id out of bounds: {frame_id}");

        let node = self.node_store.entry(*frame_id).or_insert_with(LRUKNode::new);
        if node.history.len() >= self.k {
            node.history.pop_front();
        }
        node.history.push_back(self.current_timestamp);
        trace!("recorded access for frame {frame_id} at t={}", self.current_timestamp);
        self.current_timestamp += 1;
    }

    /// Toggles whether `frame_id` is a candidate for eviction. A no-op for
    /// frames the replacer has never seen.
    pub fn set_evictable(&mut self, frame_id: &FrameId, set_evictable: bool) {
        assert!(*frame_id < self.max_size, "frame_id out of bounds: {frame_id}");

        if let Some(node) = self.node_store.get_mut(frame_id) {
            if node.is_evictable != set_evictable {
                node.is_evictable = set_evictable;
                if set_evictable {
                    self.curr_size += 1;
                } else {
                    self.curr_size -= 1;
                }
            }
        }
    }

    /// Forgets `frame_id`'s access history entirely. Calling this on a
    /// still-evictable frame is a programmer error (the caller should have
    /// evicted it, not removed it out from under the replacer) and aborts
    /// the process. A no-op if `frame_id` is unknown.
    pub fn remove(&mut self, frame_id: &FrameId) {
        if let Some(node) = self.node_store.get(frame_id) {
            assert!(!node.is_evictable, "cannot remove an evictable frame: {frame_id}");
            self.node_store.remove(frame_id);
        }
    }

    /// Number of currently evictable frames.
    pub fn size(&self) -> usize {
        self.curr_size
    }
}

fn pick_victim(a: (FrameId, bool, usize), b: (FrameId, bool, usize)) -> (FrameId, bool, usize) {
    match (a.1, b.1) {
        (true, false) => a,
        (false, true) => b,
        (true, true) => {
            if a.2 <= b.2 {
                a
            } else {
                b
            }
        }
        (false, false) => {
            if a.2 >= b.2 {
                a
            } else {
                b
            }
        }
    }
}

#[derive(Default)]
pub struct LRUKReplacerBuilder {
    max_size: Option<usize>,
    k: Option<usize>,
}

impl LRUKReplacerBuilder {
    pub fn max_size(mut self, num_frames: usize) -> Self {
        assert!(num_frames > 0);
        self.max_size = Some(num_frames);
        self
    }

    pub fn k(mut self, k: usize) -> Self {
        assert!(k > 0);
        self.k = Some(k);
        self
    }

    pub fn build(self) -> LRUKReplacer {
        LRUKReplacer::new(
            self.max_size.expect("Replacer size was not specified before build."),
            self.k.expect("k was not specified before build."),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The canonical CMU 15-445 LRU-K walkthrough, replayed end to end.
    #[test]
    fn cmu_sample_walkthrough() {
        let mut replacer = LRUKReplacer::new(7, 2);

        replacer.record_access(&1, AccessType::Unknown);
        replacer.record_access(&2, AccessType::Unknown);
        replacer.record_access(&3, AccessType::Unknown);
        replacer.record_access(&4, AccessType::Unknown);
        replacer.record_access(&5, AccessType::Unknown);
        replacer.record_access(&6, AccessType::Unknown);
        replacer.set_evictable(&1, true);
        replacer.set_evictable(&2, true);
        replacer.set_evictable(&3, true);
        replacer.set_evictable(&4, true);
        replacer.set_evictable(&5, true);
        replacer.set_evictable(&6, false);
        assert_eq!(replacer.size(), 5);

        replacer.record_access(&1, AccessType::Unknown);

        assert_eq!(replacer.evict(), Some(2));
        assert_eq!(replacer.evict(), Some(3));
        assert_eq!(replacer.evict(), Some(4));
        assert_eq!(replacer.size(), 2);

        replacer.record_access(&3, AccessType::Unknown);
        replacer.record_access(&4, AccessType::Unknown);
        replacer.record_access(&5, AccessType::Unknown);
        replacer.record_access(&4, AccessType::Unknown);
        replacer.set_evictable(&3, true);
        replacer.set_evictable(&4, true);
        assert_eq!(replacer.size(), 4);

        assert_eq!(replacer.evict(), Some(3));
        assert_eq!(replacer.size(), 3);

        replacer.set_evictable(&6, true);
        assert_eq!(replacer.size(), 4);
        assert_eq!(replacer.evict(), Some(6));
        assert_eq!(replacer.size(), 3);

        replacer.set_evictable(&1, false);
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.evict(), Some(5));
        assert_eq!(replacer.size(), 1);

        replacer.record_access(&1, AccessType::Unknown);
        replacer.record_access(&1, AccessType::Unknown);
        replacer.set_evictable(&1, true);
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.evict(), Some(4));

        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(1));
        assert_eq!(replacer.size(), 0);

        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn tie_break_among_finite_distances() {
        let mut replacer = LRUKReplacer::new(3, 2);
        for frame in [1, 2, 3, 1, 2, 1, 3] {
            replacer.record_access(&frame, AccessType::Unknown);
        }
        replacer.set_evictable(&1, true);
        replacer.set_evictable(&2, true);
        replacer.set_evictable(&3, true);

        // At t=7: frame1 last-2=[4,6] dist=3, frame2 last-2=[2,5] dist=5,
        // frame3 last-2=[3,7] dist=4. Largest distance evicts first.
        assert_eq!(replacer.evict(), Some(2));
        assert_eq!(replacer.evict(), Some(1));
        assert_eq!(replacer.evict(), Some(3));
    }

    #[test]
    fn infinite_distance_ties_broken_by_oldest_access() {
        let mut replacer = LRUKReplacer::new(3, 2);
        replacer.record_access(&1, AccessType::Unknown); // t=0
        replacer.record_access(&2, AccessType::Unknown); // t=1
        replacer.record_access(&3, AccessType::Unknown); // t=2
        replacer.record_access(&3, AccessType::Unknown); // t=3, frame3 now finite

        replacer.set_evictable(&1, true);
        replacer.set_evictable(&2, true);
        replacer.set_evictable(&3, true);

        assert_eq!(replacer.evict(), Some(1));
        assert_eq!(replacer.evict(), Some(2));
        assert_eq!(replacer.evict(), Some(3));
    }

    #[test]
    #[should_panic]
    fn record_access_out_of_range_is_fatal() {
        let mut replacer = LRUKReplacer::new(2, 2);
        replacer.record_access(&5, AccessType::Unknown);
    }

    #[test]
    #[should_panic]
    fn remove_evictable_frame_is_fatal() {
        let mut replacer = LRUKReplacer::new(2, 2);
        replacer.record_access(&0, AccessType::Unknown);
        replacer.set_evictable(&0, true);
        replacer.remove(&0);
    }

    #[test]
    fn remove_unknown_frame_is_a_no_op() {
        let mut replacer = LRUKReplacer::new(2, 2);
        replacer.remove(&1);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn set_evictable_unknown_frame_is_a_no_op() {
        let mut replacer = LRUKReplacer::new(2, 2);
        replacer.set_evictable(&0, true);
        assert_eq!(replacer.size(), 0);
    }
}
