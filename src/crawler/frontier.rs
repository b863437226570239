//! Crawl frontier: per-task FIFO queue plus the process-wide visited set
//!
//! This module handles:
//! - FIFO queueing of discovered-but-not-yet-visited URLs per task
//! - Cross-task URL deduplication through a shared visited set
//! - Atomic first-wins visitation claims

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Process-wide set of URLs already claimed for fetching
///
/// Shared by every task for the lifetime of the process; an entry, once
/// added, is never removed. Membership is raw string equality: scheme case,
/// trailing slashes, default ports, and query-parameter order all produce
/// distinct entries. This set is the sole deduplication authority for
/// fetching.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    /// Creates an empty visited set
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims a URL for fetching
    ///
    /// Checks membership and inserts in one locked step. Returns true for
    /// exactly one caller per URL across any number of concurrent
    /// invocations; every later call with the same string returns false.
    pub fn try_visit(&self, url: &str) -> bool {
        self.inner.lock().unwrap().insert(url.to_string())
    }

    /// Non-claiming membership probe
    pub fn contains(&self, url: &str) -> bool {
        self.inner.lock().unwrap().contains(url)
    }

    /// Number of URLs claimed so far
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Returns true if no URL has been claimed yet
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

/// Per-task queue of URLs waiting to be visited
///
/// Entries are consumed in FIFO order and never outlive the in-memory
/// queue. The frontier carries a handle to the shared visited set so the
/// crawl loop can gate each popped URL and pre-filter discovered links.
pub struct Frontier {
    queue: VecDeque<String>,
    visited: Arc<VisitedSet>,
}

impl Frontier {
    /// Creates an empty frontier backed by the given visited set
    pub fn new(visited: Arc<VisitedSet>) -> Self {
        Self {
            queue: VecDeque::new(),
            visited,
        }
    }

    /// Appends a URL to the back of the queue
    pub fn push(&mut self, url: String) {
        self.queue.push_back(url);
    }

    /// Removes and returns the oldest queued URL, or `None` when drained
    pub fn pop(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Claims `url` in the shared visited set (first-wins)
    pub fn try_visit(&self, url: &str) -> bool {
        self.visited.try_visit(url)
    }

    /// Returns true if `url` has already been claimed by any task
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of queued URLs
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true when the queue is drained
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_try_visit_first_wins() {
        let visited = VisitedSet::new();

        assert!(visited.try_visit("http://example.com/"));
        assert!(!visited.try_visit("http://example.com/"));
        assert!(visited.contains("http://example.com/"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_no_normalization() {
        let visited = VisitedSet::new();

        // Byte-different URLs are distinct entries
        assert!(visited.try_visit("http://example.com/page"));
        assert!(visited.try_visit("http://example.com/page/"));
        assert!(visited.try_visit("HTTP://example.com/page"));
        assert!(visited.try_visit("http://example.com/page?a=1&b=2"));
        assert!(visited.try_visit("http://example.com/page?b=2&a=1"));
        assert_eq!(visited.len(), 5);
    }

    #[test]
    fn test_try_visit_concurrent_first_wins() {
        let visited = Arc::new(VisitedSet::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let visited = Arc::clone(&visited);
            handles.push(thread::spawn(move || {
                visited.try_visit("http://example.com/contested") as usize
            }));
        }

        let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(wins, 1, "exactly one thread may claim a URL");
    }

    #[test]
    fn test_frontier_fifo_order() {
        let mut frontier = Frontier::new(Arc::new(VisitedSet::new()));

        frontier.push("http://example.com/a".to_string());
        frontier.push("http://example.com/b".to_string());
        frontier.push("http://example.com/c".to_string());

        assert_eq!(frontier.len(), 3);
        assert_eq!(frontier.pop().as_deref(), Some("http://example.com/a"));
        assert_eq!(frontier.pop().as_deref(), Some("http://example.com/b"));
        assert_eq!(frontier.pop().as_deref(), Some("http://example.com/c"));
        assert_eq!(frontier.pop(), None);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_frontiers_share_visited_set() {
        let visited = Arc::new(VisitedSet::new());
        let first = Frontier::new(Arc::clone(&visited));
        let second = Frontier::new(Arc::clone(&visited));

        assert!(first.try_visit("http://example.com/"));
        assert!(!second.try_visit("http://example.com/"));
        assert!(second.is_visited("http://example.com/"));
    }
}
