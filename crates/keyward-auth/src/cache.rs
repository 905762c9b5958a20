//! JWKS fetching and caching.
//!
//! The cache holds one slot per JWKS URL. Entries are immutable once stored;
//! a refresh replaces the whole entry. Refreshes happen lazily on the first
//! read after expiry. Each slot has its own refresh lock, held across the
//! fetch, so concurrent readers of a cold or stale URL collapse onto a single
//! request while other URLs stay readable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use keyward_core::{Clock, SystemClock};
use tokio::sync::{Mutex, RwLock};

use crate::error::{AuthError, Result};
use crate::jwks::JwkSet;
use crate::AuthConfig;

/// Default time-to-live for a fetched key set.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default upper bound on a single upstream fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetched key set and its absolute expiry.
#[derive(Debug, Clone)]
struct CacheEntry {
    keys: Arc<JwkSet>,
    expires_at: i64,
}

/// Cache state for one URL.
#[derive(Debug, Default)]
struct Slot {
    entry: RwLock<Option<CacheEntry>>,
    refresh: Mutex<()>,
}

impl Slot {
    async fn fresh(&self, now: i64) -> Option<Arc<JwkSet>> {
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|entry| now < entry.expires_at)
            .map(|entry| Arc::clone(&entry.keys))
    }
}

/// Time-boxed cache of remote key sets, keyed by URL.
pub struct JwksCache {
    client: reqwest::Client,
    ttl_seconds: i64,
    clock: Arc<dyn Clock>,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
}

impl JwksCache {
    /// Create a cache with the given TTL and per-fetch timeout.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::JwksUnavailable` if the HTTP client cannot be built.
    pub fn new(ttl: Duration, fetch_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| AuthError::JwksUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            ttl_seconds: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            clock: Arc::new(SystemClock),
            slots: RwLock::new(HashMap::new()),
        })
    }

    /// Create a cache from an `AuthConfig`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::JwksUnavailable` if the HTTP client cannot be built.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.jwks_cache_ttl_seconds),
            Duration::from_secs(config.fetch_timeout_seconds),
        )
    }

    /// Replace the clock used to stamp and check expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the key set for `url`, fetching it if absent or expired.
    ///
    /// If a refresh fails and an older entry exists, the older entry is
    /// returned and left in place so the next read retries the fetch.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::JwksUnavailable` if the fetch fails and nothing is cached.
    pub async fn get(&self, url: &str) -> Result<Arc<JwkSet>> {
        let slot = self.slot(url).await;

        // Fast path: shared lock, fresh entry.
        if let Some(keys) = slot.fresh(self.clock.now()).await {
            return Ok(keys);
        }

        // Slow path: this URL's refresh lock, re-check, fetch.
        let _refresh = slot.refresh.lock().await;
        if let Some(keys) = slot.fresh(self.clock.now()).await {
            return Ok(keys);
        }

        match self.fetch(url).await {
            Ok(keys) => {
                let keys = Arc::new(keys);
                *slot.entry.write().await = Some(CacheEntry {
                    keys: Arc::clone(&keys),
                    expires_at: self.clock.now().saturating_add(self.ttl_seconds),
                });
                tracing::debug!(url = %url, count = keys.keys.len(), "Cached JWKS keys");
                Ok(keys)
            }
            Err(err) => match slot.entry.read().await.clone() {
                Some(stale) => {
                    tracing::warn!(url = %url, error = %err, "JWKS refresh failed, serving stale key set");
                    Ok(stale.keys)
                }
                None => Err(err),
            },
        }
    }

    /// Drop the cached entry for `url`, forcing the next read to fetch.
    pub async fn invalidate(&self, url: &str) {
        self.slots.write().await.remove(url);
    }

    async fn slot(&self, url: &str) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().await.get(url) {
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().await.entry(url.to_string()).or_default())
    }

    async fn fetch(&self, url: &str) -> Result<JwkSet> {
        tracing::debug!(url = %url, "Fetching JWKS");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::JwksUnavailable(format!("failed to fetch URL: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AuthError::JwksUnavailable(format!(
                "bad status code: {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::JwksUnavailable(format!("failed to decode response body: {e}")))
    }
}
