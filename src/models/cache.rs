use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

/// Keyed snapshot store. Entries never expire on their own: freshness is
/// decided by the reader so that stale entries stay available as a fallback.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Overwrites any previous snapshot for `key` (last writer wins).
    pub fn set(&self, key: &str, value: T) {
        self.entries.insert(key.to_string(), CacheEntry::new(value));
    }

    pub fn get_fresh(&self, key: &str, ttl: Duration) -> Option<T> {
        self.entries
            .get(key)
            .filter(|e| e.is_fresh(ttl))
            .map(|e| e.value.clone())
    }
}

#[cfg(test)]
impl<T: Clone> TtlCache<T> {
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Backdates a snapshot.
    pub fn set_at(&self, key: &str, value: T, stored_at: DateTime<Utc>) {
        self.entries
            .insert(key.to_string(), CacheEntry { value, stored_at });
    }

    pub fn is_fresh(&self, key: &str, ttl: Duration) -> bool {
        self.entries
            .get(key)
            .map(|e| e.is_fresh(ttl))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips_within_ttl() {
        let cache = TtlCache::new();
        cache.set("news:All", vec!["a".to_string(), "b".to_string()]);

        assert!(cache.is_fresh("news:All", Duration::minutes(5)));
        assert_eq!(
            cache.get_fresh("news:All", Duration::minutes(5)),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn expired_entries_stay_readable() {
        let cache = TtlCache::new();
        cache.set_at("sentiment", 42u8, Utc::now() - Duration::hours(2));

        assert!(!cache.is_fresh("sentiment", Duration::hours(1)));
        assert_eq!(cache.get_fresh("sentiment", Duration::hours(1)), None);
        assert_eq!(cache.get("sentiment"), Some(42));
    }

    #[test]
    fn missing_key_is_never_fresh() {
        let cache: TtlCache<u8> = TtlCache::new();
        assert!(!cache.is_fresh("nope", Duration::minutes(5)));
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn set_overwrites_previous_snapshot() {
        let cache = TtlCache::new();
        cache.set_at("long_short", 1.0f64, Utc::now() - Duration::hours(1));
        cache.set("long_short", 2.5f64);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_fresh("long_short", Duration::minutes(5)), Some(2.5));
    }
}
