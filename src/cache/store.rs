//! Cache Store Module
//!
//! Main cache engine: a fixed array of independently locked slots with
//! recency-stamped LRU eviction.

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::cache::lru::{select_victim, RecencyClock, SlotView};
use crate::cache::{normalize_key, CacheEntry, CacheStats, StatsRecorder};
use crate::config::Config;

// == Admission Outcome ==
/// Result of offering a response to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Payload stored in `slot`, replacing `evicted` if it held another key
    Stored { slot: usize, evicted: Option<String> },
    /// Payload larger than the per-object limit; cache left untouched
    Rejected { size: usize },
    /// Cache was built with zero slots
    NoCapacity,
}

// == Cache Store ==
/// Fixed-capacity response cache shared by all connections.
///
/// Each slot sits behind its own readers-writer lock, so lookups on different
/// slots never contend and an admission only excludes readers of the slot it
/// is overwriting.
#[derive(Debug)]
pub struct CacheStore {
    /// Slot array, never resized after construction
    pub(super) slots: Box<[RwLock<CacheEntry>]>,
    /// Source of recency stamps shared by every slot
    clock: RecencyClock,
    /// Serializes victim selection and overwrite between admissions
    admission: Mutex<()>,
    /// Activity counters
    stats: StatsRecorder,
    /// Largest payload admitted, in bytes
    max_object_size: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a cache with `slot_count` empty slots.
    ///
    /// # Arguments
    /// * `slot_count` - Number of slots, fixed for the cache's lifetime
    /// * `max_object_size` - Per-object admission limit in bytes
    pub fn new(slot_count: usize, max_object_size: usize) -> Self {
        Self {
            slots: (0..slot_count)
                .map(|_| RwLock::new(CacheEntry::empty()))
                .collect(),
            clock: RecencyClock::new(),
            admission: Mutex::new(()),
            stats: StatsRecorder::new(),
            max_object_size,
        }
    }

    /// Creates a cache sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_slots, config.max_object_size)
    }

    // == Lookup ==
    /// Returns a copy of the payload cached for `target`, promoting the entry
    /// to most recently used.
    ///
    /// Slots that are not being written are checked first without waiting.
    /// Only if the key is not among them does the lookup wait on slots that
    /// an admission currently holds.
    pub async fn lookup(&self, target: &str) -> Option<Vec<u8>> {
        let key = normalize_key(target);
        let mut busy = Vec::new();

        for (index, slot) in self.slots.iter().enumerate() {
            match slot.try_read() {
                Ok(entry) => {
                    if let Some(payload) = self.hit(index, &entry, key) {
                        return Some(payload);
                    }
                }
                Err(_) => busy.push(index),
            }
        }

        for index in busy {
            let entry = self.slots[index].read().await;
            if let Some(payload) = self.hit(index, &entry, key) {
                return Some(payload);
            }
        }

        self.stats.record_miss();
        debug!(key, "Cache miss");
        None
    }

    fn hit(&self, index: usize, entry: &CacheEntry, key: &str) -> Option<Vec<u8>> {
        if !entry.matches(key) {
            return None;
        }
        // Stamp taken while the read guard is held
        let recency = self.clock.tick();
        entry.touch(recency);
        self.stats.record_hit();
        debug!(key, slot = index, recency, size = entry.size(), "Cache hit");
        Some(entry.payload.clone())
    }

    // == Admit ==
    /// Stores `payload` under the normalized `target`.
    ///
    /// Payloads over the object size limit are rejected without touching any
    /// slot. Otherwise the key's existing slot, an empty slot, or the least
    /// recently used slot is overwritten, in that order of preference.
    pub async fn admit(&self, target: &str, payload: Vec<u8>) -> Admission {
        let size = payload.len();
        if size > self.max_object_size {
            self.stats.record_rejection();
            debug!(
                request = target,
                size,
                limit = self.max_object_size,
                "Response too large to cache"
            );
            return Admission::Rejected { size };
        }

        let key = normalize_key(target);
        let _admission = self.admission.lock().await;

        // Victim choice is rechecked under the write guard: a hit holding the
        // slot's read guard may promote it while the admission waits.
        let (index, mut entry) = loop {
            let views = self.slot_views(key).await;
            let Some(index) = select_victim(&views) else {
                return Admission::NoCapacity;
            };

            let entry = self.slots[index].write().await;
            match views[index] {
                SlotView::Occupied(seen) if entry.recency() != seen => {
                    debug!(key, slot = index, "Victim promoted while waiting, reselecting");
                }
                _ => break (index, entry),
            }
        };

        let recency = self.clock.tick();
        let evicted = entry.fill(key.to_string(), payload, recency);

        self.stats.record_admission();
        if let Some(old) = &evicted {
            self.stats.record_eviction();
            debug!(key, slot = index, evicted = %old, "Evicted least recently used entry");
        }
        debug!(key, slot = index, recency, size, "Cached response");

        Admission::Stored {
            slot: index,
            evicted,
        }
    }

    async fn slot_views(&self, key: &str) -> Vec<SlotView> {
        let mut views = Vec::with_capacity(self.slots.len());
        for slot in self.slots.iter() {
            let entry = slot.read().await;
            views.push(if !entry.occupied {
                SlotView::Empty
            } else if entry.key == key {
                SlotView::SameKey
            } else {
                SlotView::Occupied(entry.recency())
            });
        }
        views
    }

    // == Recency ==
    /// Current recency stamp of the entry cached for `target`, without
    /// promoting it.
    pub async fn recency_of(&self, target: &str) -> Option<u64> {
        let key = normalize_key(target);
        for slot in self.slots.iter() {
            let entry = slot.read().await;
            if entry.matches(key) {
                return Some(entry.recency());
            }
        }
        None
    }

    // == Length ==
    /// Returns the number of occupied slots.
    pub async fn len(&self) -> usize {
        let mut occupied = 0;
        for slot in self.slots.iter() {
            if slot.read().await.occupied {
                occupied += 1;
            }
        }
        occupied
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Fixed slot count.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let occupied = self.len().await;
        self.stats.snapshot(occupied, self.capacity())
    }
}
