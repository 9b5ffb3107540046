// src/pipeline/tracker.rs

//! Source state tracker.
//!
//! Holds the last confirmed count per source. `set` only accepts a concrete
//! value, so a source can move from unknown to known but never back.

use std::collections::HashMap;

/// Last-known count per monitored source, in configured order.
#[derive(Debug, Clone, Default)]
pub struct SourceStateTracker {
    order: Vec<String>,
    counts: HashMap<String, Option<u64>>,
}

impl SourceStateTracker {
    /// Seed one empty entry per configured source. Duplicates are ignored.
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tracker = Self::default();
        for source in sources {
            let source = source.into();
            if !tracker.counts.contains_key(&source) {
                tracker.counts.insert(source.clone(), None);
                tracker.order.push(source);
            }
        }
        tracker
    }

    /// Last confirmed count, `None` until the first successful observation.
    pub fn get(&self, source: &str) -> Option<u64> {
        self.counts.get(source).copied().flatten()
    }

    /// Record a successful observation.
    pub fn set(&mut self, source: &str, value: u64) {
        match self.counts.get_mut(source) {
            Some(slot) => *slot = Some(value),
            None => {
                log::warn!("Tracking unconfigured source {}", source);
                self.order.push(source.to_string());
                self.counts.insert(source.to_string(), Some(value));
            }
        }
    }

    /// Sources in configured order.
    pub fn sources(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(source, count)` pairs in configured order.
    pub fn snapshot(&self) -> Vec<(String, Option<u64>)> {
        self.order
            .iter()
            .map(|s| (s.clone(), self.get(s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_none() {
        let tracker = SourceStateTracker::new(["a", "b"]);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.get("a"), None);
        assert_eq!(tracker.get("b"), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut tracker = SourceStateTracker::new(["a"]);
        tracker.set("a", 5);
        assert_eq!(tracker.get("a"), Some(5));
        tracker.set("a", 7);
        assert_eq!(tracker.get("a"), Some(7));
    }

    #[test]
    fn test_order_is_preserved_and_deduplicated() {
        let tracker = SourceStateTracker::new(["z", "a", "z", "m"]);
        assert_eq!(tracker.sources(), ["z", "a", "m"]);
    }

    #[test]
    fn test_snapshot() {
        let mut tracker = SourceStateTracker::new(["s1", "s2"]);
        tracker.set("s2", 10);
        assert_eq!(
            tracker.snapshot(),
            vec![("s1".to_string(), None), ("s2".to_string(), Some(10))]
        );
    }

    #[test]
    fn test_unknown_source_is_adopted() {
        let mut tracker = SourceStateTracker::new(["a"]);
        tracker.set("b", 3);
        assert_eq!(tracker.get("b"), Some(3));
        assert_eq!(tracker.sources(), ["a", "b"]);
    }
}
