use std::collections::VecDeque;

use crate::engine::RunOptions;

use super::HistoryEntry;

/// Most-recent-first record of past invocations. In-memory only.
///
/// Unbounded by default. [`HistoryLog::with_capacity`] keeps only the newest
/// `capacity` entries; a capacity of `0` means unbounded.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: Option<usize>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: (capacity > 0).then_some(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        if let Some(capacity) = self.capacity {
            self.entries.truncate(capacity);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Options to adopt for replay. Does not re-run anything.
    pub fn restore(&self, entry: &HistoryEntry) -> RunOptions {
        entry.snapshot_options.clone()
    }

    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
