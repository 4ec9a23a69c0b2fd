//! Cache Entry Module
//!
//! Defines the contents of a single cache slot.

use std::sync::atomic::{AtomicU64, Ordering};

// == Cache Entry ==
/// Contents of one cache slot.
///
/// `recency` is atomic so a lookup holding only the slot's read guard can
/// promote the entry. Everything else changes under the write guard.
#[derive(Debug, Default)]
pub struct CacheEntry {
    /// Normalized request key
    pub key: String,
    /// Raw response bytes as relayed to the client
    pub payload: Vec<u8>,
    /// Last-use stamp from the shared recency clock
    recency: AtomicU64,
    /// Whether the slot currently holds a response
    pub occupied: bool,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an empty slot.
    pub fn empty() -> Self {
        Self::default()
    }

    // == Fill ==
    /// Overwrites the slot with a new response.
    ///
    /// Returns the key that was evicted, if the slot held a different key.
    pub fn fill(&mut self, key: String, payload: Vec<u8>, recency: u64) -> Option<String> {
        let evicted = if self.occupied && self.key != key {
            Some(std::mem::take(&mut self.key))
        } else {
            None
        };

        self.key = key;
        self.payload = payload;
        *self.recency.get_mut() = recency;
        self.occupied = true;

        evicted
    }

    // == Matches ==
    /// True if the slot is occupied by `key`.
    pub fn matches(&self, key: &str) -> bool {
        self.occupied && self.key == key
    }

    /// Byte length of the cached payload.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn recency(&self) -> u64 {
        self.recency.load(Ordering::Acquire)
    }

    // == Touch ==
    /// Records a use of this entry. Recency never moves backwards, so a hit
    /// that finishes after a later one keeps the later stamp.
    pub fn touch(&self, recency: u64) {
        self.recency.fetch_max(recency, Ordering::AcqRel);
    }
}
