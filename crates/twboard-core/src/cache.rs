//! Per-resource-type TTL cache shared across concurrent requests.
//!
//! Entries are replaced atomically as whole values; two concurrent misses
//! may both fetch and store (last writer wins), which costs at most a
//! bounded amount of duplicate upstream work and never a stale read.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::SourceError;

/// Every resource type shares the same freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache key: per-symbol resources are keyed additionally by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    GlobalIndices,
    Industries,
    EtfList,
    StockInfo(String),
    StockFinance(String),
}

impl ResourceKey {
    pub fn label(&self) -> String {
        match self {
            Self::GlobalIndices => String::from("global-indices"),
            Self::Industries => String::from("industries"),
            Self::EtfList => String::from("etf-list"),
            Self::StockInfo(symbol) => format!("stock-info:{symbol}"),
            Self::StockFinance(symbol) => format!("stock-finance:{symbol}"),
        }
    }
}

/// How a cached value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Fresh entry served without an upstream call.
    Hit,
    /// Fetched from upstream and stored.
    Fetched,
    /// Upstream failed; an expired entry was served as a degraded fallback.
    StaleFallback,
}

impl CacheOutcome {
    pub const fn from_cache(self) -> bool {
        !matches!(self, Self::Fetched)
    }
}

/// A resolved cache read: the payload plus provenance for the response
/// envelope (`fromCache`, `lastUpdated`).
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub outcome: CacheOutcome,
    pub fetched_at: OffsetDateTime,
}

struct CacheEntry {
    payload: serde_json::Value,
    stored_at: Instant,
    fetched_at: OffsetDateTime,
}

/// Handle to the process-wide resource cache; clones share one store.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<RwLock<HashMap<ResourceKey, CacheEntry>>>,
    ttl: Duration,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Serve a fresh entry, or invoke `fetcher` and store its result.
    /// Fetcher failures propagate; see
    /// [`get_or_fetch_with_stale_fallback`](Self::get_or_fetch_with_stale_fallback)
    /// for the degraded path.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: ResourceKey,
        fetcher: F,
    ) -> Result<Cached<T>, SourceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        if let Some(cached) = self.read_fresh(&key).await? {
            return Ok(cached);
        }

        // Fetch without holding the lock; concurrent misses are allowed to
        // race and the later write wins.
        let value = fetcher().await?;
        let fetched_at = OffsetDateTime::now_utc();
        let payload = serde_json::to_value(&value)
            .map_err(|error| SourceError::internal(format!("cache encode failed: {error}")))?;

        let mut store = self.inner.write().await;
        store.insert(
            key,
            CacheEntry {
                payload,
                stored_at: Instant::now(),
                fetched_at,
            },
        );

        Ok(Cached {
            value,
            outcome: CacheOutcome::Fetched,
            fetched_at,
        })
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), but when the fetcher
    /// fails and an expired entry is still present, the stale payload is
    /// served as a degraded fallback instead of surfacing the error.
    pub async fn get_or_fetch_with_stale_fallback<T, F, Fut>(
        &self,
        key: ResourceKey,
        fetcher: F,
    ) -> Result<Cached<T>, SourceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let label = key.label();
        match self.get_or_fetch(key.clone(), fetcher).await {
            Ok(cached) => Ok(cached),
            Err(error) => {
                let store = self.inner.read().await;
                let Some(entry) = store.get(&key) else {
                    return Err(error);
                };
                warn!(
                    resource = %label,
                    error = %error,
                    "serving stale cache entry after fetch failure"
                );
                let value = decode_entry(entry)?;
                Ok(Cached {
                    value,
                    outcome: CacheOutcome::StaleFallback,
                    fetched_at: entry.fetched_at,
                })
            }
        }
    }

    async fn read_fresh<T: DeserializeOwned>(
        &self,
        key: &ResourceKey,
    ) -> Result<Option<Cached<T>>, SourceError> {
        let store = self.inner.read().await;
        let Some(entry) = store.get(key) else {
            return Ok(None);
        };
        if entry.stored_at.elapsed() >= self.ttl {
            return Ok(None);
        }
        Ok(Some(Cached {
            value: decode_entry(entry)?,
            outcome: CacheOutcome::Hit,
            fetched_at: entry.fetched_at,
        }))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

fn decode_entry<T: DeserializeOwned>(entry: &CacheEntry) -> Result<T, SourceError> {
    serde_json::from_value(entry.payload.clone())
        .map_err(|error| SourceError::internal(format!("cache decode failed: {error}")))
}
