//! TTL Cache Service
//!
//! Generic key/value store with per-key expiry, used by the verification
//! flow as a short-lived code store. Values are JSON-encoded on write and
//! decoded on read, so the service stays agnostic of what it holds.
//!
//! Expiry deadlines use [`tokio::time::Instant`] so tests can drive the
//! clock deterministically. Expired entries are dropped lazily on access
//! and by the periodic sweeper (see [`CacheService::run_sweeper`]).
//!
//! Absent keys are a normal outcome (`Ok(None)`), distinct from a decode
//! failure which is a [`CacheError::Codec`].

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cache error types
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone)]
struct CacheEntry {
    /// JSON-encoded value
    payload: String,
    /// Expiry deadline; the entry is dead once `now >= expires_at`
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Remaining TTL in whole seconds, rounded up so a freshly stored
    /// entry reports its full window.
    fn remaining_secs(&self, now: Instant) -> u64 {
        self.expires_at
            .saturating_duration_since(now)
            .as_secs_f64()
            .ceil() as u64
    }
}

/// In-process TTL cache
///
/// Cheap to clone; all clones share the same entry map.
#[derive(Clone, Debug)]
pub struct CacheService {
    entries: Arc<DashMap<String, CacheEntry>>,
    /// Serializes compute-if-absent so the supplier runs at most once
    /// per issuance window even under concurrent callers.
    fill_lock: Arc<Mutex<()>>,
}

impl CacheService {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            fill_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store a value with the given TTL, overwriting any prior value and
    /// deadline for the key.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> CacheResult<()> {
        let payload = serde_json::to_string(value)?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    /// Read a value without touching its TTL. Expired entries read as
    /// absent and are dropped.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.live_entry(key) {
            Some(entry) => Ok(Some(serde_json::from_str(&entry.payload)?)),
            None => Ok(None),
        }
    }

    /// Read a value together with its remaining TTL in seconds.
    ///
    /// Both come from a single entry snapshot, so the TTL can never be
    /// sampled after the value independently expired.
    pub async fn get_with_ttl<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> CacheResult<Option<(T, u64)>> {
        match self.live_entry(key) {
            Some(entry) => {
                let remaining = entry.remaining_secs(Instant::now());
                Ok(Some((serde_json::from_str(&entry.payload)?, remaining)))
            }
            None => Ok(None),
        }
    }

    /// Rewrite the value of an existing entry while preserving its expiry
    /// deadline. No-op if the key is absent or already expired.
    pub async fn update<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        let payload = serde_json::to_string(value)?;
        let now = Instant::now();
        if let Some(mut entry) = self.entries.get_mut(key)
            && !entry.is_expired(now)
        {
            entry.payload = payload;
        }
        Ok(())
    }

    /// Remove the entry. Idempotent.
    pub async fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Return the live entry for the key, or run the supplier once, store
    /// its result with the given TTL, and return `(value, ttl)`.
    ///
    /// Internally serialized: N concurrent callers racing an absent key
    /// invoke the supplier exactly once.
    pub async fn compute_if_absent<T, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u64,
        supplier: F,
    ) -> CacheResult<(T, u64)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.fill_lock.lock().await;

        if let Some(entry) = self.live_entry(key) {
            let remaining = entry.remaining_secs(Instant::now());
            return Ok((serde_json::from_str(&entry.payload)?, remaining));
        }

        let value = supplier().await;
        self.set(key, &value, ttl_secs).await?;
        Ok((value, ttl_secs))
    }

    /// Drop every expired entry; returns how many were purged.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Periodic sweeper loop; runs until the shutdown token fires.
    pub async fn run_sweeper(&self, period: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let purged = self.sweep_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "Cache sweep removed expired entries");
                    }
                }
            }
        }
    }

    /// Snapshot a live entry, lazily dropping it if it has expired.
    fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.clone());
            }
        }
        // Guard dropped above; safe to remove without deadlocking the shard
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new()
    }
}
