use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    body: String,
    stored_at: Instant,
}

/// TTL-bounded cache of fetched response bodies, keyed by canonical URL.
///
/// Expiry is enforced lazily on `get` and in bulk by `sweep_expired`,
/// which the session manager's background sweep drives.
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Look up a cached body, evicting it if past its TTL.
    pub fn get(&mut self, url: &str) -> Option<String> {
        match self.entries.get(url) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => Some(entry.body.clone()),
            Some(_) => {
                self.entries.remove(url);
                None
            }
            None => None,
        }
    }

    /// Store a response body, replacing any previous entry for the URL.
    pub fn store(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(
            url.into(),
            CacheEntry {
                body: body.into(),
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove all expired entries, returning how many were evicted.
    pub fn sweep_expired(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() <= ttl);
        before - self.entries.len()
    }

    /// Drop every entry regardless of age.
    pub fn clear(&mut self) {
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

    #[test]
    fn test_store_and_get() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        cache.store("https://example.com/jobs", "<html>jobs</html>");
        assert_eq!(
            cache.get("https://example.com/jobs"),
            Some("<html>jobs</html>".to_string())
        );
        assert_eq!(cache.get("https://example.com/other"), None);
    }

    #[test]
    fn test_expired_entry_evicted_on_get() {
        let mut cache = ResponseCache::new(Duration::from_millis(0));
        cache.store("https://example.com/jobs", "<html></html>");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("https://example.com/jobs"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_expired() {
        let mut cache = ResponseCache::new(Duration::from_millis(0));
        cache.store("https://example.com/a", "a");
        cache.store("https://example.com/b", "b");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.sweep_expired(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_replaces() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        cache.store("https://example.com/jobs", "old");
        cache.store("https://example.com/jobs", "new");
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get("https://example.com/jobs"),
            Some("new".to_string())
        );
    }
}
