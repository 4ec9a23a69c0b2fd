//! LRU Module
//!
//! Approximate least-recently-used bookkeeping for the slot array.
//!
//! Instead of reordering a list on every access, each slot carries a stamp
//! from a shared, strictly increasing clock. The slot with the lowest stamp is
//! the least recently used.

use std::sync::atomic::{AtomicU64, Ordering};

// == Recency Clock ==
/// Shared source of recency stamps.
///
/// Every stamp handed out is unique and larger than all previous ones.
#[derive(Debug, Default)]
pub struct RecencyClock {
    last: AtomicU64,
}

impl RecencyClock {
    /// Creates a clock whose first stamp is 1.
    pub fn new() -> Self {
        Self::default()
    }

    // == Tick ==
    /// Returns the next stamp.
    pub fn tick(&self) -> u64 {
        self.last.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Most recently issued stamp (0 if none).
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}

// == Slot View ==
/// What victim selection needs to know about one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotView {
    /// Slot holds nothing
    Empty,
    /// Slot already holds the key being admitted
    SameKey,
    /// Slot holds another key, last used at the given stamp
    Occupied(u64),
}

// == Select Victim ==
/// Picks the slot an admission should overwrite.
///
/// Preference order: the slot already holding the key, then the first empty
/// slot, then the occupied slot with the lowest recency. Returns None only
/// when there are no slots at all.
pub fn select_victim(views: &[SlotView]) -> Option<usize> {
    if let Some(index) = views.iter().position(|v| *v == SlotView::SameKey) {
        return Some(index);
    }
    if let Some(index) = views.iter().position(|v| *v == SlotView::Empty) {
        return Some(index);
    }

    views
        .iter()
        .enumerate()
        .filter_map(|(index, view)| match view {
            SlotView::Occupied(recency) => Some((index, *recency)),
            _ => None,
        })
        .min_by_key(|(_, recency)| *recency)
        .map(|(index, _)| index)
}
