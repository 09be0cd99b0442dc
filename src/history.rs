//! History Buffer
//!
//! Fixed-capacity ring of the most recently published events. New
//! dashboard subscribers are replayed the buffer contents before they
//! receive live traffic.

use std::collections::VecDeque;

/// Ordered ring of the last `capacity` entries, oldest evicted first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> HistoryBuffer<T> {
    /// Create an empty buffer holding at most `capacity` entries.
    ///
    /// A capacity of zero is allowed and retains nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, overwriting the oldest one when full.
    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// All retained entries in arrival order.
    pub fn get_all(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    /// Iterate retained entries in arrival order without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let buffer: HistoryBuffer<String> = HistoryBuffer::new(4);
        assert!(buffer.is_empty());
        assert!(buffer.get_all().is_empty());
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn test_below_capacity_keeps_order() {
        let mut buffer = HistoryBuffer::new(5);
        for i in 0..3 {
            buffer.push(i);
        }
        assert_eq!(buffer.get_all(), vec![0, 1, 2]);
    }

    #[test]
    fn test_overwrites_oldest() {
        let mut buffer = HistoryBuffer::new(3);
        for i in 0..10 {
            buffer.push(i);
            assert!(buffer.len() <= 3);
        }
        assert_eq!(buffer.get_all(), vec![7, 8, 9]);
    }

    #[test]
    fn test_last_min_n_c_for_many_shapes() {
        for capacity in 1..6usize {
            for n in 0..15usize {
                let mut buffer = HistoryBuffer::new(capacity);
                for i in 0..n {
                    buffer.push(i);
                }
                let expected: Vec<usize> = (n.saturating_sub(capacity)..n).collect();
                assert_eq!(buffer.get_all(), expected, "capacity={capacity} n={n}");
            }
        }
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut buffer = HistoryBuffer::new(0);
        buffer.push("a");
        assert!(buffer.is_empty());
    }
}
