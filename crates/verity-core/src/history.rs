//! Bounded most-recent-first history of completed requests.
//!
//! This is session state only; nothing here is persisted.

use std::collections::VecDeque;

/// How many detection results a session keeps around.
pub const DETECTION_HISTORY_CAPACITY: usize = 5;

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the front; once full, the oldest entry is evicted.
    pub fn push(&mut self, entry: T) {
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
