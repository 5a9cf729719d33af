//! Bounded, newest-first event window

use super::normalizer::Event;

/// Default window capacity
pub const DEFAULT_WINDOW_CAPACITY: usize = 600;

/// Fixed-capacity store of the most recent events.
///
/// Ordered newest-first. `insert` is the only mutation; once full, each
/// insert drops the oldest (tail) event.
#[derive(Debug, Clone)]
pub struct EventWindow {
    events: Vec<Event>,
    capacity: usize,
}

impl EventWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepend an event, evicting the oldest if over capacity.
    ///
    /// Returns the evicted event, if any, and leaves the new ordering
    /// readable through `snapshot`.
    pub fn insert(&mut self, event: Event) -> Option<Event> {
        self.events.insert(0, event);

        if self.events.len() > self.capacity {
            self.events.pop()
        } else {
            None
        }
    }

    /// Current contents, newest first
    pub fn snapshot(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_test_event(n: usize) -> Event {
        Event {
            id: format!("ev-{}", n),
            lat: n as f64,
            lon: 0.0,
            accident: n % 7 == 0,
            score: 1.0,
            timestamp: Utc.timestamp_opt(1_700_000_000 + n as i64, 0).unwrap(),
        }
    }

    #[test]
    fn test_length_is_min_of_inserts_and_capacity() {
        for n in [0usize, 1, 599, 600, 601, 1500] {
            let mut window = EventWindow::default();
            for i in 0..n {
                window.insert(create_test_event(i));
            }
            assert_eq!(window.len(), n.min(DEFAULT_WINDOW_CAPACITY));
        }
    }

    #[test]
    fn test_newest_first_order() {
        let mut window = EventWindow::new(10);
        for i in 0..25 {
            window.insert(create_test_event(i));
        }

        let ids: Vec<&str> = window.snapshot().iter().map(|e| e.id.as_str()).collect();
        let expected: Vec<String> = (15..25).rev().map(|i| format!("ev-{}", i)).collect();
        assert_eq!(ids, expected);
        assert_eq!(window.snapshot()[0].id, "ev-24");
    }

    #[test]
    fn test_601st_insert_evicts_oldest() {
        let mut window = EventWindow::default();
        for i in 0..600 {
            assert!(window.insert(create_test_event(i)).is_none());
        }
        assert!(window.snapshot().iter().any(|e| e.id == "ev-0"));

        let evicted = window.insert(create_test_event(600));
        assert_eq!(evicted.map(|e| e.id), Some("ev-0".to_string()));
        assert_eq!(window.len(), 600);
        assert!(!window.snapshot().iter().any(|e| e.id == "ev-0"));
        assert_eq!(window.snapshot().last().map(|e| e.id.as_str()), Some("ev-1"));
    }
}
