use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use log::debug;
use parking_lot::RwLock;
use tokio::time::Instant;

/// Default lifetime of a cached report.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

// Longest lifetime an entry gets, whatever the configured TTL.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Cache key for one pipeline of one repository, rendered as `"{repo_id}:{pipeline_number}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(repo_id: &str, pipeline_number: &str) -> Self {
        Self(format!("{repo_id}:{pipeline_number}"))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory cache of rendered reports for finished pipelines.
///
/// Entries expire a fixed TTL after they were written. Expiry is lazy:
/// an expired entry reads as absent and is dropped on the next write or
/// `purge_expired` call. Nothing survives the process.
pub struct ReportCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: ttl.min(MAX_TTL),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn has(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;

        if Instant::now() > entry.expires_at {
            debug!("Cache entry {key} expired");
            return None;
        }

        Some(entry.value.clone())
    }

    /// Stores `value`, replacing any previous entry and restarting its TTL.
    pub fn set(&self, key: CacheKey, value: String) {
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, entry| now <= entry.expires_at);

        debug!("Caching report for {key}");
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now.checked_add(self.ttl).unwrap_or(now + MAX_TTL),
            },
        );
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expires_at);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_key_format() {
        assert_eq!(CacheKey::new("42", "7").to_string(), "42:7");
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_within_ttl() {
        let cache = ReportCache::default();
        let key = CacheKey::new("42", "7");

        assert!(!cache.has(&key));
        cache.set(key.clone(), "report".to_string());

        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        assert!(cache.has(&key));
        assert_eq!(cache.get(&key).as_deref(), Some("report"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ReportCache::default();
        let key = CacheKey::new("42", "7");
        cache.set(key.clone(), "report".to_string());

        tokio::time::advance(DEFAULT_TTL + Duration::from_secs(1)).await;

        assert!(!cache.has(&key));
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_does_not_overflow() {
        let cache = ReportCache::new(Duration::from_secs(u64::MAX));
        let key = CacheKey::new("42", "7");

        cache.set(key.clone(), "report".to_string());
        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;

        assert_eq!(cache.get(&key).as_deref(), Some("report"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_resets_ttl() {
        let cache = ReportCache::new(Duration::from_secs(100));
        let key = CacheKey::new("1", "1");

        cache.set(key.clone(), "old".to_string());
        tokio::time::advance(Duration::from_secs(80)).await;
        cache.set(key.clone(), "new".to_string());
        tokio::time::advance(Duration::from_secs(80)).await;

        assert_eq!(cache.get(&key).as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_drops_expired_neighbours() {
        let cache = ReportCache::new(Duration::from_secs(10));
        cache.set(CacheKey::new("1", "1"), "a".to_string());
        tokio::time::advance(Duration::from_secs(11)).await;
        cache.set(CacheKey::new("1", "2"), "b".to_string());

        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writers_same_key() {
        let cache = Arc::new(ReportCache::default());
        let key = CacheKey::new("9", "9");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let key = key.clone();
                tokio::spawn(async move { cache.set(key, format!("report {i}")) })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key).unwrap().starts_with("report "));
    }
}
