//! Bounded recent-message history.

use std::collections::VecDeque;
use std::sync::Arc;

/// A fixed-capacity ring of the most recent messages.
///
/// Once full, pushing evicts the oldest entry. Capacity is fixed at
/// construction; a capacity of `0` disables the backlog entirely (pushes
/// are dropped and snapshots are empty).
///
/// Messages are stored as `Arc<String>` so a snapshot shares storage with
/// the live fan-out path instead of cloning line bodies per subscriber.
#[derive(Debug)]
pub struct Backlog {
    entries: VecDeque<Arc<String>>,
    capacity: usize,
}

impl Backlog {
    /// Create a backlog holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest entry when at capacity.
    pub fn push(&mut self, message: Arc<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// Read-only snapshot, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<String>> {
        self.entries.iter().cloned().collect()
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the backlog holds no messages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_str(backlog: &mut Backlog, s: &str) {
        backlog.push(Arc::new(s.to_owned()));
    }

    fn contents(backlog: &Backlog) -> Vec<String> {
        backlog.snapshot().iter().map(|m| (**m).clone()).collect()
    }

    #[test]
    fn empty_backlog() {
        let backlog = Backlog::new(3);
        assert!(backlog.is_empty());
        assert_eq!(backlog.len(), 0);
        assert!(backlog.snapshot().is_empty());
    }

    #[test]
    fn push_below_capacity() {
        let mut backlog = Backlog::new(3);
        push_str(&mut backlog, "a");
        push_str(&mut backlog, "b");
        assert_eq!(contents(&backlog), vec!["a", "b"]);
    }

    #[test]
    fn push_at_capacity_evicts_oldest() {
        let mut backlog = Backlog::new(3);
        for s in ["a", "b", "c", "d"] {
            push_str(&mut backlog, s);
        }
        assert_eq!(backlog.len(), 3);
        assert_eq!(contents(&backlog), vec!["b", "c", "d"]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut backlog = Backlog::new(5);
        for i in 0..100 {
            push_str(&mut backlog, &format!("msg {i}"));
        }
        assert_eq!(backlog.len(), 5);
        assert_eq!(contents(&backlog)[0], "msg 95");
        assert_eq!(contents(&backlog)[4], "msg 99");
    }

    #[test]
    fn zero_capacity_disables_backlog() {
        let mut backlog = Backlog::new(0);
        push_str(&mut backlog, "a");
        push_str(&mut backlog, "b");
        assert!(backlog.is_empty());
        assert!(backlog.snapshot().is_empty());
    }

    #[test]
    fn snapshot_is_oldest_first() {
        let mut backlog = Backlog::new(10);
        for s in ["first", "second", "third"] {
            push_str(&mut backlog, s);
        }
        assert_eq!(contents(&backlog), vec!["first", "second", "third"]);
    }

    #[test]
    fn snapshot_is_detached_from_later_pushes() {
        let mut backlog = Backlog::new(3);
        push_str(&mut backlog, "a");
        let snap = backlog.snapshot();
        push_str(&mut backlog, "b");
        assert_eq!(snap.len(), 1);
        assert_eq!(backlog.len(), 2);
    }

    #[test]
    fn snapshot_shares_storage() {
        let mut backlog = Backlog::new(3);
        let msg = Arc::new(String::from("shared"));
        backlog.push(Arc::clone(&msg));
        let snap = backlog.snapshot();
        assert!(Arc::ptr_eq(&snap[0], &msg));
    }

    #[test]
    fn capacity_reported() {
        assert_eq!(Backlog::new(20).capacity(), 20);
        assert_eq!(Backlog::new(0).capacity(), 0);
    }
}
