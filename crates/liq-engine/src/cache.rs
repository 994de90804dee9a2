//! Keyed result cache with TTL and single-flight computation

use cached::{Cached, TimedCache};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{HeadlineItem, MarketSnapshot, Prediction, SentimentReport, TechnicalReport};

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// One in-flight computation per key
///
/// `completed` counts finished producer runs. A caller that saw a lower count
/// before queueing on `outcome` was waiting on that run and reuses its result.
struct Flight<T> {
    completed: AtomicU64,
    outcome: Mutex<Option<Result<T>>>,
}

impl<T> Default for Flight<T> {
    fn default() -> Self {
        Self {
            completed: AtomicU64::new(0),
            outcome: Mutex::new(None),
        }
    }
}

fn share<T: Clone>(outcome: &Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => Ok(value.clone()),
        Err(e) => Err(e.replicate()),
    }
}

/// Thread-safe result cache
///
/// Entries are fresh for their own TTL and kept for the retention window
/// afterwards, so a failed recomputation can still serve the last value.
/// Concurrent callers for the same key share a single producer call and
/// its outcome, failures included.
pub struct ResultCache<T> {
    entries: Arc<RwLock<TimedCache<String, CacheEntry<T>>>>,
    in_flight: Arc<Mutex<HashMap<String, Arc<Flight<T>>>>>,
}

impl<T: Clone> ResultCache<T> {
    /// Create a cache that retains entries for `retention`
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(TimedCache::with_lifespan(retention))),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fresh value for `key`, if any
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write().await;
        entries
            .cache_get(key)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone())
    }

    async fn get_stale(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write().await;
        entries.cache_get(key).map(|entry| entry.value.clone())
    }

    /// Store `value` as fresh for `ttl`, replacing any previous entry
    pub async fn insert(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.write().await;
        let _ = entries.cache_set(key.into(), entry);
    }

    /// Return the fresh value for `key`, or run `producer` to compute it
    ///
    /// Only one producer runs per key at a time; callers arriving meanwhile
    /// wait and receive its outcome, error or not. If the producer fails and
    /// an expired entry is still retained, that entry is returned instead of
    /// the error. A caller dropped mid-computation leaves the key free for
    /// the next one.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key, "Cache hit");
            return Ok(value);
        }

        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(key.to_string()).or_default())
        };
        let seen = flight.completed.load(Ordering::SeqCst);
        let mut slot = flight.outcome.lock().await;

        let finished_while_waiting = flight.completed.load(Ordering::SeqCst) != seen;
        if let Some(outcome) = slot.as_ref().filter(|_| finished_while_waiting) {
            debug!(key, "Sharing outcome of concurrent caller");
            let shared = share(outcome);
            drop(slot);
            self.release(key, &flight).await;
            return shared;
        }

        if let Some(value) = self.get(key).await {
            debug!(key, "Cache filled by concurrent caller");
            drop(slot);
            self.release(key, &flight).await;
            return Ok(value);
        }

        debug!(key, "Cache miss");
        let outcome = match producer().await {
            Ok(value) => {
                self.insert(key, value.clone(), ttl).await;
                Ok(value)
            }
            Err(e) => match self.get_stale(key).await {
                Some(value) => {
                    warn!(key, error = %e, "Producer failed, serving stale entry");
                    Ok(value)
                }
                None => Err(e),
            },
        };

        *slot = Some(share(&outcome));
        flight.completed.fetch_add(1, Ordering::SeqCst);
        drop(slot);
        self.release(key, &flight).await;
        outcome
    }

    /// Drop the in-flight entry once no other caller holds it
    async fn release(&self, key: &str, flight: &Arc<Flight<T>>) {
        let mut in_flight = self.in_flight.lock().await;
        // one reference in the map, one held by the caller
        if Arc::strong_count(flight) <= 2 {
            in_flight.remove(key);
        }
    }

    /// Invalidate a specific entry
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        let _ = entries.cache_remove(key);
    }

    /// Clear all entries
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.cache_clear();
    }

    /// Number of retained entries, fresh or stale
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<T> Clone for ResultCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// One cache per produced result type
pub struct CacheManager {
    pub snapshots: ResultCache<MarketSnapshot>,
    pub headlines: ResultCache<Arc<Vec<HeadlineItem>>>,
    pub technical: ResultCache<Arc<TechnicalReport>>,
    pub sentiment: ResultCache<Arc<SentimentReport>>,
    pub predictions: ResultCache<Arc<Prediction>>,
}

impl CacheManager {
    /// Create caches sharing one retention window
    pub fn new(retention: Duration) -> Self {
        Self {
            snapshots: ResultCache::new(retention),
            headlines: ResultCache::new(retention),
            technical: ResultCache::new(retention),
            sentiment: ResultCache::new(retention),
            predictions: ResultCache::new(retention),
        }
    }

    /// Clear all caches
    pub async fn clear_all(&self) {
        self.snapshots.clear().await;
        self.headlines.clear().await;
        self.technical.clear().await;
        self.sentiment.clear().await;
        self.predictions.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = ResultCache::new(MINUTE);
        cache.insert("eth:usd:technical", 42_u32, MINUTE).await;

        assert_eq!(cache.get("eth:usd:technical").await, Some(42));
        assert_eq!(cache.get("btc:usd:technical").await, None);
    }

    #[tokio::test]
    async fn test_get_or_compute_caches() {
        let cache = ResultCache::new(MINUTE);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_compute("key", MINUTE, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("value".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "value");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_flight() {
        let cache = ResultCache::new(MINUTE);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let callers = (0..16).map(|_| {
            cache.get_or_compute("snapshot", MINUTE, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(2000.0_f64)
            })
        });
        let results = futures::future::join_all(callers).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| matches!(r, Ok(v) if *v == 2000.0)));
        assert!(cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_single_flight_shares_failure() {
        let cache: ResultCache<f64> = ResultCache::new(MINUTE);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let callers = (0..8).map(|_| {
            cache.get_or_compute("snapshot", MINUTE, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(EngineError::upstream("coingecko", "HTTP 429"))
            })
        });
        let results = futures::future::join_all(callers).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| matches!(r, Err(e) if e.is_upstream())));
        assert!(cache.in_flight.lock().await.is_empty());

        // a later caller starts a fresh computation
        let value = cache
            .get_or_compute("snapshot", MINUTE, || async { Ok(2000.0) })
            .await
            .unwrap();
        assert_eq!(value, 2000.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abandoned_computation_does_not_wedge_key() {
        let cache = ResultCache::new(MINUTE);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cache.get_or_compute("key", MINUTE, || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1_u32)
            }),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(cache.is_empty().await);

        let value = cache
            .get_or_compute("key", MINUTE, || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
        assert_eq!(cache.get("key").await, Some(2));
        assert!(cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entry_recomputed() {
        let cache = ResultCache::new(MINUTE);
        cache.insert("key", 1_u32, Duration::ZERO).await;
        assert_eq!(cache.get("key").await, None);

        let value = cache
            .get_or_compute("key", MINUTE, || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_stale_entry_served_on_failure() {
        let cache = ResultCache::new(MINUTE);
        cache.insert("key", 1_u32, Duration::ZERO).await;

        let value = cache
            .get_or_compute("key", MINUTE, || async {
                Err(EngineError::upstream("coingecko", "HTTP 503"))
            })
            .await
            .unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_failure_without_entry_propagates() {
        let cache: ResultCache<u32> = ResultCache::new(MINUTE);

        let result = cache
            .get_or_compute("key", MINUTE, || async {
                Err(EngineError::upstream("finnhub", "HTTP 429"))
            })
            .await;
        assert!(matches!(result, Err(EngineError::Upstream { .. })));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = ResultCache::new(MINUTE);
        for i in 0..5_u32 {
            cache.insert(format!("key{i}"), i, MINUTE).await;
        }
        assert_eq!(cache.len().await, 5);

        cache.invalidate("key0").await;
        assert_eq!(cache.get("key0").await, None);
        assert_eq!(cache.len().await, 4);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_manager() {
        let manager = CacheManager::new(MINUTE);

        manager
            .snapshots
            .insert("eth:usd:snapshot", MarketSnapshot::new(1.0, 1.0, 0.0, 0.0), MINUTE)
            .await;
        manager
            .headlines
            .insert("eth:usd:headlines", Arc::new(Vec::new()), MINUTE)
            .await;
        assert_eq!(manager.snapshots.len().await, 1);
        assert_eq!(manager.headlines.len().await, 1);

        manager.clear_all().await;

        assert!(manager.snapshots.is_empty().await);
        assert!(manager.headlines.is_empty().await);
    }
}
