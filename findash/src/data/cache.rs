//! Snapshot cache with TTL.
//!
//! Memoizes source lookups per ticker so that a ticker is fetched at most once
//! per TTL window, however many callers ask for it concurrently.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

use findash_common::config::CacheConfig;

use super::provider::{MarketDataSource, SourceError};
use crate::snapshot::FinancialSnapshot;

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: FinancialSnapshot,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(snapshot: FinancialSnapshot, ttl: Duration) -> Self {
        let fetched_at = Utc::now();
        Self {
            snapshot,
            fetched_at,
            expires_at: fetched_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Lookup state for a ticker.
enum Lookup {
    Fresh(FinancialSnapshot),
    Stale(FinancialSnapshot),
    Missing,
}

/// Ticker → snapshot cache.
///
/// Refreshes are serialized per ticker. A caller that finds an expired entry
/// while another caller is already refreshing it gets the expired snapshot
/// instead of waiting; a caller with nothing cached waits for the refresh.
/// Failed fetches leave the cache untouched.
pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    refresh_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    ttl: Duration,
}

impl ResultCache {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            refresh_locks: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::try_seconds(config.ttl_secs).unwrap_or(Duration::MAX))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached snapshot, fetching it from `source` when absent or
    /// expired.
    pub async fn get_or_fetch(
        &self,
        ticker: &str,
        source: &dyn MarketDataSource,
    ) -> Result<FinancialSnapshot, SourceError> {
        let stale = match self.lookup(ticker) {
            Lookup::Fresh(snapshot) => {
                debug!(ticker = %ticker, "Cache hit");
                return Ok(snapshot);
            }
            Lookup::Stale(snapshot) => Some(snapshot),
            Lookup::Missing => None,
        };

        let lock = self.refresh_lock(ticker);
        let result = self.refresh(ticker, source, &lock, stale).await;
        self.release_refresh_lock(ticker, lock);
        result
    }

    async fn refresh(
        &self,
        ticker: &str,
        source: &dyn MarketDataSource,
        lock: &tokio::sync::Mutex<()>,
        stale: Option<FinancialSnapshot>,
    ) -> Result<FinancialSnapshot, SourceError> {
        let _guard = match stale {
            Some(snapshot) => match lock.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!(ticker = %ticker, "Refresh in flight, serving stale snapshot");
                    return Ok(snapshot);
                }
            },
            None => lock.lock().await,
        };

        // Another caller may have refreshed while we waited
        if let Lookup::Fresh(snapshot) = self.lookup(ticker) {
            debug!(ticker = %ticker, "Cache filled by concurrent refresh");
            return Ok(snapshot);
        }

        debug!(ticker = %ticker, source = %source.name(), "Cache miss, fetching");
        let snapshot = source.fetch_snapshot(ticker).await?;
        self.insert(ticker, snapshot.clone());

        info!(
            ticker = %ticker,
            source = %source.name(),
            ttl_secs = self.ttl.num_seconds(),
            "Cached snapshot"
        );
        Ok(snapshot)
    }

    /// Get a cached snapshot if not expired.
    pub fn get(&self, ticker: &str) -> Option<FinancialSnapshot> {
        match self.lookup(ticker) {
            Lookup::Fresh(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// When the cached snapshot for a ticker was fetched, expired or not.
    pub fn fetched_at(&self, ticker: &str) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().ok()?;
        entries.get(ticker).map(|e| e.fetched_at)
    }

    /// Cache a snapshot under `ticker`, replacing any previous entry.
    pub fn insert(&self, ticker: &str, snapshot: FinancialSnapshot) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(ticker.to_string(), CacheEntry::new(snapshot, self.ttl));
        }
    }

    /// Drop the cached snapshot for a ticker.
    pub fn invalidate(&self, ticker: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(ticker);
        }
    }

    /// Clear all expired entries
    pub fn clear_expired(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Clear all cache
    pub fn clear_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        if let Ok(mut locks) = self.refresh_locks.lock() {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let (total, expired) = self
            .entries
            .read()
            .map(|entries| {
                let expired = entries.values().filter(|e| e.is_expired()).count();
                (entries.len(), expired)
            })
            .unwrap_or((0, 0));

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }

    fn lookup(&self, ticker: &str) -> Lookup {
        let Ok(entries) = self.entries.read() else {
            return Lookup::Missing;
        };
        match entries.get(ticker) {
            Some(entry) if entry.is_expired() => Lookup::Stale(entry.snapshot.clone()),
            Some(entry) => Lookup::Fresh(entry.snapshot.clone()),
            None => Lookup::Missing,
        }
    }

    fn refresh_lock(&self, ticker: &str) -> Arc<tokio::sync::Mutex<()>> {
        match self.refresh_locks.lock() {
            Ok(mut locks) => locks
                .entry(ticker.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone(),
            // Poisoned map: fall back to an unshared lock
            Err(_) => Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Drop a ticker's refresh lock once no other caller holds it.
    ///
    /// Clones are only taken under the map lock, so the count is stable here.
    fn release_refresh_lock(&self, ticker: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        if let Ok(mut locks) = self.refresh_locks.lock() {
            let shared_only_with_map = locks
                .get(ticker)
                .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
            if shared_only_with_map {
                locks.remove(ticker);
            }
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticSource;

    fn source() -> StaticSource {
        StaticSource::new()
            .with_snapshot(FinancialSnapshot::new("AAPL"))
            .with_snapshot(FinancialSnapshot::new("MSFT"))
    }

    #[tokio::test]
    async fn test_second_lookup_is_a_hit() {
        let cache = ResultCache::new(Duration::seconds(60));
        let source = source();

        cache.get_or_fetch("AAPL", &source).await.unwrap();
        cache.get_or_fetch("AAPL", &source).await.unwrap();

        assert_eq!(source.fetch_count(), 1);
        assert!(cache.get("AAPL").is_some());
        assert!(cache.fetched_at("AAPL").is_some());
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let cache = ResultCache::new(Duration::zero());
        let source = source();

        cache.get_or_fetch("AAPL", &source).await.unwrap();
        assert!(cache.get("AAPL").is_none());

        cache.get_or_fetch("AAPL", &source).await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ResultCache::new(Duration::seconds(60));
        let source = source();

        let result = cache.get_or_fetch("ZZZZ", &source).await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
        assert_eq!(cache.stats().total_entries, 0);

        let _ = cache.get_or_fetch("ZZZZ", &source).await;
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = ResultCache::new(Duration::seconds(60));
        let source = source();

        cache.get_or_fetch("AAPL", &source).await.unwrap();
        cache.get_or_fetch("MSFT", &source).await.unwrap();
        cache.invalidate("AAPL");

        assert!(cache.get("AAPL").is_none());
        assert!(cache.get("MSFT").is_some());
    }

    #[test]
    fn test_stats_and_clear_expired() {
        let cache = ResultCache::new(Duration::zero());
        cache.insert("AAPL", FinancialSnapshot::new("AAPL"));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.active_entries, 0);

        cache.clear_expired();
        assert_eq!(cache.stats().total_entries, 0);
    }

    fn refresh_lock_count(cache: &ResultCache) -> usize {
        cache.refresh_locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_refresh_locks_are_released() {
        let cache = ResultCache::new(Duration::seconds(60));
        let source = source();

        cache.get_or_fetch("AAPL", &source).await.unwrap();
        for i in 0..20 {
            let _ = cache.get_or_fetch(&format!("GONE{}", i), &source).await;
        }

        assert_eq!(refresh_lock_count(&cache), 0);
        assert!(cache.get("AAPL").is_some());
    }

    #[tokio::test]
    async fn test_oversized_ttl_never_expires() {
        let cache = ResultCache::from_config(&CacheConfig {
            ttl_secs: 10_000_000_000_000,
        });
        let source = source();

        cache.get_or_fetch("AAPL", &source).await.unwrap();
        assert!(cache.get("AAPL").is_some());
        assert_eq!(cache.stats().expired_entries, 0);
    }

    #[test]
    fn test_from_config() {
        let cache = ResultCache::from_config(&CacheConfig { ttl_secs: 120 });
        assert_eq!(cache.ttl(), Duration::seconds(120));
    }
}
