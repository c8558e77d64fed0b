//! Reverse lookup from event id to its timeline position and owning segment.

use segue_core::{EventId, SegmentIndex};
use std::collections::HashMap;

/// Where an event lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Position in the time-ordered interval list.
    pub position: usize,
    /// Owning segment.
    pub segment: SegmentIndex,
}

/// Dictionary-backed index over every ingested event id.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    entries: HashMap<EventId, IndexEntry>,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) lookup by id.
    pub fn get(&self, id: &str) -> Option<IndexEntry> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn insert(&mut self, id: EventId, entry: IndexEntry) {
        self.entries.insert(id, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
