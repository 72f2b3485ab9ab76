//! Shuffle history tracking
//!
//! Records the playlist indices visited while traversing, so "previous"
//! during a shuffle replays the earlier pick instead of re-rolling.

use crate::types::DEFAULT_HISTORY_CAPACITY;
use std::collections::VecDeque;

/// Bounded traversal history with a cursor
///
/// The cursor always points at an existing entry when the history is
/// non-empty, and is `None` ("no history yet") when it is empty.
#[derive(Debug, Clone)]
pub struct History {
    /// Visited indices, oldest at the front
    entries: VecDeque<usize>,

    /// Position of the entry currently being replayed
    cursor: Option<usize>,

    /// Maximum number of entries
    capacity: usize,
}

impl History {
    /// Create a history holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
        }
    }

    /// Record a newly chosen index and move the cursor onto it
    ///
    /// Entries ahead of the cursor are discarded first. When the history
    /// overflows, the oldest entries are evicted and the cursor shifts down
    /// by the same amount, floored at the first entry.
    pub fn record(&mut self, index: usize) {
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        self.entries.push_back(index);
        let mut cursor = self.entries.len() - 1;

        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
            cursor = cursor.saturating_sub(excess);
        }

        self.cursor = Some(cursor);
    }

    /// Move forward into already-visited territory
    ///
    /// Returns `None` when the cursor is at the newest entry.
    pub fn step_forward(&mut self) -> Option<usize> {
        let next = self.cursor? + 1;
        let index = *self.entries.get(next)?;
        self.cursor = Some(next);
        Some(index)
    }

    /// Move back to the previous pick
    ///
    /// Returns `None` when there is nothing earlier to replay.
    pub fn step_backward(&mut self) -> Option<usize> {
        let cursor = self.cursor?.checked_sub(1)?;
        self.cursor = Some(cursor);
        self.entries.get(cursor).copied()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Cursor position, `None` when empty
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Index under the cursor
    pub fn current(&self) -> Option<usize> {
        self.entries.get(self.cursor?).copied()
    }

    /// All recorded indices (oldest first)
    pub fn entries(&self) -> Vec<usize> {
        self.entries.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
