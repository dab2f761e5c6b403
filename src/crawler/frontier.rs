//! Breadth-first crawl frontier
//!
//! The frontier is a FIFO queue of pending URLs plus the set of URLs that have
//! already been visited. It is owned by the coordinator's dispatch loop and is
//! never shared with worker tasks, so `pop`, `mark_visited` and `offer` are
//! atomic with respect to each other.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// Ordered, deduplicated queue of URLs still to visit
#[derive(Debug, Default)]
pub struct Frontier {
    /// Pending URLs in discovery order
    queue: VecDeque<Url>,

    /// Mirror of `queue` for O(1) membership checks
    pending: HashSet<String>,

    /// URLs that have been handed to a worker
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier holding only the seed URL
    pub fn seed(url: Url) -> Self {
        let mut frontier = Self::default();
        frontier.pending.insert(url.as_str().to_string());
        frontier.queue.push_back(url);
        frontier
    }

    /// Removes and returns the earliest-inserted pending URL
    pub fn pop(&mut self) -> Option<Url> {
        let url = self.queue.pop_front()?;
        self.pending.remove(url.as_str());
        Some(url)
    }

    /// Records a URL as visited. Idempotent.
    pub fn mark_visited(&mut self, url: &Url) {
        self.visited.insert(url.as_str().to_string());
    }

    /// Enqueues `url` unless it is already visited or already pending
    ///
    /// # Returns
    ///
    /// `true` if the URL was added to the queue
    pub fn offer(&mut self, url: Url) -> bool {
        let key = url.as_str();
        if self.visited.contains(key) || self.pending.contains(key) {
            return false;
        }

        self.pending.insert(key.to_string());
        self.queue.push_back(url);
        true
    }

    /// True when nothing is left to pop
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Pending URLs in the order they will be popped
    pub fn pending(&self) -> impl Iterator<Item = &Url> {
        self.queue.iter()
    }
}
