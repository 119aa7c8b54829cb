//! Response Cache - prior replies keyed by (question, context)
//!
//! Information Hiding:
//! - Persisted JSON layout hidden behind lookup/store/clear
//! - Storage failures degrade to cache misses and never reach callers
//! - Usage totals live here because only a cache clear may reset them

pub mod usage;

use crate::config::UsageConfig;
use crate::core::{CacheKey, TokenUsage};
use crate::error::{ChatError, Result};
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub use usage::{UsageAccumulator, UsageTotals};

/// Storage key holding the JSON object of all entries
pub const CACHE_STORE_KEY: &str = "chatCache";
/// Storage key holding the persisted usage totals
pub const USAGE_STORE_KEY: &str = "usageTotals";
/// Entries written with any other version are ignored
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// A cached reply and the tokens it cost when first fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub version: u32,
    pub reply: String,
    pub tokens: TokenUsage,
    /// Unix epoch milliseconds of the last store
    pub timestamp: u64,
}

pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
    enabled: bool,
    usage: UsageAccumulator,
}

impl ResponseCache {
    /// Create a cache with zeroed usage totals
    pub fn new(store: Arc<dyn KeyValueStore>, enabled: bool, rates: UsageConfig) -> Self {
        Self {
            store,
            enabled,
            usage: UsageAccumulator::new(rates),
        }
    }

    /// Create a cache and restore the usage totals persisted by a previous run
    pub async fn open(store: Arc<dyn KeyValueStore>, enabled: bool, rates: UsageConfig) -> Self {
        let mut cache = Self::new(store, enabled, rates);

        match cache.read_usage().await {
            Ok(Some(totals)) => {
                tracing::debug!("[ResponseCache] Restored usage totals: {:?}", totals);
                cache.usage = UsageAccumulator::with_totals(rates, totals);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("[ResponseCache] Ignoring stored usage totals: {}", e),
        }

        cache
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling hides entries from `lookup` but keeps them stored
    pub fn set_enabled(&mut self, enabled: bool) {
        tracing::info!("[ResponseCache] Caching {}", if enabled { "enabled" } else { "disabled" });
        self.enabled = enabled;
    }

    /// Returns the entry for `key`, or `None` when disabled, missing or unreadable
    pub async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }

        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("[ResponseCache] Lookup treated as miss: {}", e);
                return None;
            }
        };

        let raw = entries.remove(key.as_str())?;
        match serde_json::from_value::<CacheEntry>(raw) {
            Ok(entry) if entry.version == CACHE_SCHEMA_VERSION => {
                tracing::debug!("[ResponseCache] Hit for {}", key);
                Some(entry)
            }
            Ok(entry) => {
                tracing::debug!(
                    "[ResponseCache] Ignoring entry with schema version {}",
                    entry.version
                );
                None
            }
            Err(e) => {
                tracing::warn!("[ResponseCache] Malformed entry treated as miss: {}", e);
                None
            }
        }
    }

    /// Insert or overwrite the entry for `key`, refreshing its timestamp
    pub async fn store(&self, key: &CacheKey, reply: &str, tokens: TokenUsage) {
        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            Err(ChatError::CacheCorrupt(e)) => {
                tracing::warn!("[ResponseCache] Replacing corrupt cache: {}", e);
                Map::new()
            }
            Err(e) => {
                tracing::warn!("[ResponseCache] Skipping store: {}", e);
                return;
            }
        };

        let entry = CacheEntry {
            version: CACHE_SCHEMA_VERSION,
            reply: reply.to_string(),
            tokens,
            timestamp: now_millis(),
        };

        let result = match serde_json::to_value(&entry) {
            Ok(value) => {
                entries.insert(key.as_str().to_string(), value);
                self.write_entries(&entries).await
            }
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => tracing::debug!("[ResponseCache] Stored {} entries", entries.len()),
            Err(e) => tracing::warn!("[ResponseCache] Failed to persist cache: {}", e),
        }
    }

    /// Remove every entry and reset usage totals to zero
    pub async fn clear(&mut self) {
        if let Err(e) = self.store.delete(CACHE_STORE_KEY).await {
            tracing::warn!("[ResponseCache] Failed to delete cache: {}", e);
        }

        self.usage.reset();
        if let Err(e) = self.store.delete(USAGE_STORE_KEY).await {
            tracing::warn!("[ResponseCache] Failed to delete usage totals: {}", e);
        }

        tracing::info!("[ResponseCache] Cleared cache and usage totals");
    }

    /// Number of readable entries, regardless of the enabled flag
    pub async fn len(&self) -> usize {
        match self.read_entries().await {
            Ok(entries) => entries
                .values()
                .filter(|raw| {
                    serde_json::from_value::<CacheEntry>((*raw).clone())
                        .map(|e| e.version == CACHE_SCHEMA_VERSION)
                        .unwrap_or(false)
                })
                .count(),
            Err(e) => {
                tracing::warn!("[ResponseCache] Cannot count entries: {}", e);
                0
            }
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Add a non-cached exchange to the totals and persist them
    pub async fn record_usage(&mut self, tokens: TokenUsage) {
        self.usage.record(tokens);

        let result = match serde_json::to_string(&self.usage.totals()) {
            Ok(json) => self.store.put(USAGE_STORE_KEY, &json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!("[ResponseCache] Failed to persist usage totals: {}", e);
        }
    }

    pub fn usage(&self) -> UsageTotals {
        self.usage.totals()
    }

    pub fn rates(&self) -> UsageConfig {
        self.usage.rates()
    }

    async fn read_entries(&self) -> Result<Map<String, Value>> {
        match self.store.get(CACHE_STORE_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Map::new()),
        }
    }

    async fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.store.put(CACHE_STORE_KEY, &json).await
    }

    async fn read_usage(&self) -> Result<Option<UsageTotals>> {
        match self.store.get(USAGE_STORE_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use async_trait::async_trait;

    const RATES: UsageConfig = UsageConfig {
        input_rate: 0.001,
        output_rate: 0.002,
    };

    fn test_cache() -> (ResponseCache, InMemoryStore) {
        let store = InMemoryStore::new();
        let cache = ResponseCache::new(Arc::new(store.clone()), true, RATES);
        (cache, store)
    }

    /// Backend whose every operation fails
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(ChatError::StorageUnavailable("disk on fire".to_string()))
        }
        async fn put(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ChatError::StorageUnavailable("disk on fire".to_string()))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(ChatError::StorageUnavailable("disk on fire".to_string()))
        }
        async fn keys(&self) -> Result<Vec<String>> {
            Err(ChatError::StorageUnavailable("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let (cache, _) = test_cache();
        let key = CacheKey::encode("hi", "");
        assert!(cache.lookup(&key).await.is_none());

        cache.store(&key, "hello", TokenUsage::new(3, 2)).await;

        let entry = cache.lookup(&key).await.unwrap();
        assert_eq!(entry.reply, "hello");
        assert_eq!(entry.tokens, TokenUsage::new(3, 2));
        assert_eq!(entry.version, CACHE_SCHEMA_VERSION);
        assert!(entry.timestamp > 0);
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let (cache, _) = test_cache();
        let key = CacheKey::encode("hi", "");

        cache.store(&key, "first", TokenUsage::default()).await;
        cache.store(&key, "second", TokenUsage::new(1, 1)).await;

        assert_eq!(cache.lookup(&key).await.unwrap().reply, "second");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_disable_hides_but_keeps_entries() {
        let (mut cache, _) = test_cache();
        let key = CacheKey::encode("hi", "");
        cache.store(&key, "hello", TokenUsage::default()).await;

        cache.set_enabled(false);
        assert!(cache.lookup(&key).await.is_none());

        // Stores still land while disabled
        let other = CacheKey::encode("other", "");
        cache.store(&other, "stored while off", TokenUsage::default()).await;
        assert!(cache.lookup(&other).await.is_none());

        cache.set_enabled(true);
        assert_eq!(cache.lookup(&key).await.unwrap().reply, "hello");
        assert_eq!(cache.lookup(&other).await.unwrap().reply, "stored while off");
    }

    #[tokio::test]
    async fn test_clear_removes_entries_and_resets_usage() {
        let (mut cache, _) = test_cache();
        let key = CacheKey::encode("hi", "ctx");
        cache.store(&key, "hello", TokenUsage::new(10, 5)).await;
        cache.record_usage(TokenUsage::new(10, 5)).await;
        assert_ne!(cache.usage(), UsageTotals::default());

        cache.clear().await;

        assert!(cache.lookup(&key).await.is_none());
        assert!(cache.is_empty().await);
        assert_eq!(cache.usage().tokens, TokenUsage::default());
        assert_eq!(cache.usage().total_cost, 0.0);
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_a_miss_and_replaced_on_store() {
        let (cache, store) = test_cache();
        store.put(CACHE_STORE_KEY, "{not json").await.unwrap();

        let key = CacheKey::encode("hi", "");
        assert!(cache.lookup(&key).await.is_none());
        assert_eq!(cache.len().await, 0);

        cache.store(&key, "hello", TokenUsage::default()).await;
        assert_eq!(cache.lookup(&key).await.unwrap().reply, "hello");
    }

    #[tokio::test]
    async fn test_unknown_schema_version_is_a_miss() {
        let (cache, store) = test_cache();
        let key = CacheKey::encode("hi", "");
        let blob = serde_json::json!({
            (key.as_str()): {
                "version": 99,
                "reply": "from the future",
                "tokens": {"promptTokens": 0, "completionTokens": 0, "totalTokens": 0},
                "timestamp": 1
            }
        });
        store.put(CACHE_STORE_KEY, &blob.to_string()).await.unwrap();

        assert!(cache.lookup(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_persisted_layout_is_camel_case() {
        let (cache, store) = test_cache();
        let key = CacheKey::encode("hi", "");
        cache.store(&key, "hello", TokenUsage::new(1, 2)).await;

        let raw = store.get(CACHE_STORE_KEY).await.unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        let entry = &value[key.as_str()];
        assert_eq!(entry["reply"], "hello");
        assert_eq!(entry["tokens"]["promptTokens"], 1);
        assert_eq!(entry["tokens"]["totalTokens"], 3);
    }

    #[tokio::test]
    async fn test_broken_backend_never_fails() {
        let mut cache = ResponseCache::open(Arc::new(BrokenStore), true, RATES).await;
        let key = CacheKey::encode("hi", "");

        cache.store(&key, "hello", TokenUsage::default()).await;
        assert!(cache.lookup(&key).await.is_none());
        assert_eq!(cache.len().await, 0);

        cache.record_usage(TokenUsage::new(1, 1)).await;
        assert_eq!(cache.usage().tokens, TokenUsage::new(1, 1));

        cache.clear().await;
        assert_eq!(cache.usage(), UsageTotals::default());
    }

    #[tokio::test]
    async fn test_usage_restored_on_open() {
        let store = InMemoryStore::new();
        {
            let mut cache = ResponseCache::open(Arc::new(store.clone()), true, RATES).await;
            cache.record_usage(TokenUsage::new(10, 5)).await;
            cache.record_usage(TokenUsage::new(20, 10)).await;
        }

        let cache = ResponseCache::open(Arc::new(store), true, RATES).await;
        let totals = cache.usage();
        assert_eq!(totals.tokens, TokenUsage::new(30, 15));
        assert!((totals.total_cost - (30.0 * 0.001 + 15.0 * 0.002)).abs() < 1e-12);
    }
}
