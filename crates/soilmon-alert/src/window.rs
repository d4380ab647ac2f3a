use soilmon_common::types::Reading;
use std::collections::VecDeque;

/// Bounded FIFO of the most recent readings of one stream.
pub struct HistoryWindow {
    capacity: usize,
    data: VecDeque<Reading>,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends a reading, returning the evicted oldest one when full.
    pub fn push(&mut self, reading: Reading) -> Option<Reading> {
        self.data.push_back(reading);
        if self.data.len() > self.capacity {
            self.data.pop_front()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.data.iter()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }
}

impl Extend<Reading> for HistoryWindow {
    fn extend<T: IntoIterator<Item = Reading>>(&mut self, iter: T) {
        for reading in iter {
            self.push(reading);
        }
    }
}
