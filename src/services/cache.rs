// src/services/cache.rs
//
// Process-local cache of raw API documents, keyed `"{symbol}_{document}"`.
// Entries optionally expire; statement documents are kept for the process
// lifetime while fast-moving entries (logo, stats) get a TTL from the
// caller.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde_json::Value;
use tokio::sync::RwLock;

struct CacheEntry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CacheStore {
    pub fn new() -> Self {
        CacheStore {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) => {
                if let Some(expires_at) = entry.expires_at {
                    if expires_at < Utc::now() {
                        debug!("cache entry {} expired", key);
                        return None;
                    }
                }
                debug!("cache hit for {}", key);
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    pub async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: ttl.map(|ttl| Utc::now() + ttl),
            },
        );
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn stores_and_returns_values() {
        let cache = CacheStore::new();
        assert!(cache.get("AAPL_income").await.is_none());
        cache.set("AAPL_income", json!({"symbol": "AAPL"}), None).await;
        assert_eq!(
            cache.get("AAPL_income").await,
            Some(json!({"symbol": "AAPL"}))
        );
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = CacheStore::new();
        cache
            .set("AAPL_logo", json!({"url": "x"}), Some(Duration::seconds(-1)))
            .await;
        assert!(cache.get("AAPL_logo").await.is_none());
    }
}
