use std::time::{Duration, Instant};

use dashmap::DashMap;
use relay_core::CompletionResponse;
use serde::Serialize;

#[derive(Debug, Clone)]
struct CachedEntry {
    response: CompletionResponse,
    stored_at: Instant
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CompletionResponse),
    Miss,
    /// An entry existed but was older than the TTL and has been evicted.
    Expired
}

impl CacheLookup {
    pub fn label(&self) -> &'static str {
        match self {
            CacheLookup::Hit(_) => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Expired => "expired"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryStats {
    pub key: String,
    pub age_ms: u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub entries: Vec<CacheEntryStats>
}

/// Response cache keyed by `utils::cache_key`. Entries are evicted lazily
/// when a lookup finds them older than the TTL; nothing else removes them
/// except [`ResponseCache::clear`].
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CachedEntry>
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &str, ttl: Duration) -> CacheLookup {
        if self
            .entries
            .remove_if(key, |_, entry| entry.stored_at.elapsed() > ttl)
            .is_some()
        {
            return CacheLookup::Expired;
        }

        match self.entries.get(key) {
            Some(entry) => CacheLookup::Hit(entry.response.clone()),
            None => CacheLookup::Miss
        }
    }

    pub fn insert(&self, key: String, response: CompletionResponse) {
        self.entries.insert(
            key,
            CachedEntry {
                response,
                stored_at: Instant::now()
            }
        );
    }

    pub fn stats(&self) -> CacheStats {
        let mut entries: Vec<CacheEntryStats> = self
            .entries
            .iter()
            .map(|entry| CacheEntryStats {
                key: entry.key().clone(),
                age_ms: entry.stored_at.elapsed().as_millis() as u64
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            size: entries.len(),
            entries
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn response(text: &str) -> CompletionResponse {
        CompletionResponse {
            id: "cmpl-1".to_string(),
            text: text.to_string(),
            model: "m".to_string(),
            usage: None,
            timestamp: Utc::now()
        }
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = ResponseCache::new();
        assert_eq!(cache.lookup("m:a", Duration::from_secs(60)), CacheLookup::Miss);

        cache.insert("m:a".to_string(), response("cached"));
        match cache.lookup("m:a", Duration::from_secs(60)) {
            CacheLookup::Hit(hit) => assert_eq!(hit.text, "cached"),
            other => panic!("expected hit, got {other:?}")
        }
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let cache = ResponseCache::new();
        cache.insert("m:a".to_string(), response("old"));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(cache.lookup("m:a", Duration::from_millis(1)), CacheLookup::Expired);
        assert!(cache.is_empty());
        assert_eq!(cache.lookup("m:a", Duration::from_secs(60)), CacheLookup::Miss);
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = ResponseCache::new();
        cache.insert("m:b".to_string(), response("b"));
        cache.insert("m:a".to_string(), response("a"));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.entries[0].key, "m:a");
        assert!(stats.entries[0].age_ms < 1_000);

        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }
}
