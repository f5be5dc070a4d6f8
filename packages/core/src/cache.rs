use chrono::{DateTime, Utc};
use tokio::time::{Duration, Instant};

use crate::event::Event;

/// Single-slot TTL cache for the aggregated event collection.
///
/// Shared as `Arc<RwLock<EventCache>>`: one writer replaces the whole entry,
/// readers always get their own copy.
#[derive(Debug, Default)]
pub struct EventCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    events: Vec<Event>,
    stored_at: Instant,
    refreshed_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() <= self.ttl
    }
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached events only while still within their TTL.
    pub fn get(&self) -> Option<Vec<Event>> {
        self.entry
            .as_ref()
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.events.clone())
    }

    /// Returns the last stored events regardless of age.
    pub fn get_stale(&self) -> Option<Vec<Event>> {
        self.entry.as_ref().map(|entry| entry.events.clone())
    }

    pub fn set(&mut self, events: Vec<Event>, ttl: Duration) {
        self.entry = Some(CacheEntry {
            events,
            stored_at: Instant::now(),
            refreshed_at: Utc::now(),
            ttl,
        });
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_fresh(&self) -> bool {
        self.entry.as_ref().is_some_and(CacheEntry::is_fresh)
    }

    /// Wall-clock time of the last `set`.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|entry| entry.refreshed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn events(ids: &[&str]) -> Vec<Event> {
        ids.iter().map(|id| Event::new(*id)).collect()
    }

    #[test]
    fn get_returns_none_when_cache_is_empty() {
        let cache = EventCache::new();
        assert!(cache.get().is_none());
        assert!(cache.get_stale().is_none());
        assert!(cache.refreshed_at().is_none());
    }

    #[test]
    fn get_returns_value_immediately_after_set() {
        let mut cache = EventCache::new();
        cache.set(events(&["fh-1", "tz-2"]), Duration::from_secs(1));

        assert_eq!(cache.get(), Some(events(&["fh-1", "tz-2"])));
        assert!(cache.is_fresh());
        assert!(cache.refreshed_at().is_some());
    }

    #[test]
    fn get_returns_none_after_ttl_expires() {
        let mut cache = EventCache::new();
        cache.set(events(&["fh-1"]), Duration::from_millis(10));
        thread::sleep(std::time::Duration::from_millis(20));

        assert!(cache.get().is_none());
        assert!(!cache.is_fresh());
        assert_eq!(cache.get_stale(), Some(events(&["fh-1"])));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_follows_the_tokio_clock() {
        let mut cache = EventCache::new();
        cache.set(events(&["fh-1"]), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get().is_none());
    }

    #[test]
    fn set_replaces_previous_entry() {
        let mut cache = EventCache::new();
        cache.set(events(&["fh-1"]), Duration::from_secs(5));
        cache.set(events(&["tz-7"]), Duration::from_secs(5));

        assert_eq!(cache.get(), Some(events(&["tz-7"])));
    }

    #[test]
    fn invalidate_clears_cached_value() {
        let mut cache = EventCache::new();
        cache.set(events(&["fh-1"]), Duration::from_secs(5));
        cache.invalidate();

        assert!(cache.get().is_none());
        assert!(cache.get_stale().is_none());
        assert!(!cache.is_fresh());
    }
}
