//! Max-priority queue of scored conflicts

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rift_core::domain::Conflict;

/// A conflict paired with the score it was queued under
#[derive(Debug, Clone)]
pub struct ConflictWithScore {
    pub conflict: Conflict,
    pub score: f64,
}

impl PartialEq for ConflictWithScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ConflictWithScore {}

impl PartialOrd for ConflictWithScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConflictWithScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score)
    }
}

/// Highest score first; ties pop in unspecified order
#[derive(Debug, Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<ConflictWithScore>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, conflict: Conflict, score: f64) {
        self.heap.push(ConflictWithScore { conflict, score });
    }

    /// Removes and returns the highest-scored conflict
    pub fn pop(&mut self) -> Option<ConflictWithScore> {
        self.heap.pop()
    }

    /// The highest-scored conflict, without removing it
    pub fn peek(&self) -> Option<&ConflictWithScore> {
        self.heap.peek()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drains the queue, highest score first
    pub fn into_sorted_vec(self) -> Vec<ConflictWithScore> {
        let mut items = self.heap.into_sorted_vec();
        items.reverse();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rift_core::domain::ConflictType;

    fn conflict() -> Conflict {
        Conflict::new(ConflictType::Path, 1)
    }

    #[test]
    fn test_peek_tracks_maximum() {
        let mut queue = PriorityQueue::new();
        assert!(queue.peek().is_none());

        queue.push(conflict(), 5.0);
        assert_eq!(queue.peek().map(|c| c.score), Some(5.0));

        queue.push(conflict(), 10.0);
        assert_eq!(queue.peek().map(|c| c.score), Some(10.0));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_pop_order() {
        let mut queue = PriorityQueue::new();
        for score in [3.0, 9.0, 1.0, 7.0] {
            queue.push(conflict(), score);
        }

        let popped: Vec<f64> = std::iter::from_fn(|| queue.pop()).map(|c| c.score).collect();
        assert_eq!(popped, [9.0, 7.0, 3.0, 1.0]);
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_into_sorted_vec_descending() {
        let mut queue = PriorityQueue::new();
        let top = conflict();
        let top_id = *top.id();
        queue.push(conflict(), 2.0);
        queue.push(top, 8.0);
        queue.push(conflict(), 4.0);

        let items = queue.into_sorted_vec();
        let scores: Vec<f64> = items.iter().map(|c| c.score).collect();
        assert_eq!(scores, [8.0, 4.0, 2.0]);
        assert_eq!(*items[0].conflict.id(), top_id);
    }
}
