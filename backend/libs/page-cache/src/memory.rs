//! Process-local page cache

use crate::{CacheMetrics, CacheResult, CachedPage, PageCache};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct Entry {
    expires_at: Instant,
    page: CachedPage,
}

/// In-memory page cache
///
/// Expired entries are dropped when read, and swept on the first write
/// after the earliest stored expiry has passed, so keys that are never
/// read again do not pile up.
#[derive(Default)]
pub struct MemoryPageCache {
    entries: DashMap<String, Entry>,
    /// Earliest `expires_at` among stored entries
    next_expiry: Mutex<Option<Instant>>,
    metrics: CacheMetrics,
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries; returns the earliest remaining expiry
    fn sweep_expired(&self, now: Instant) -> Option<Instant> {
        let before = self.entries.len();
        let mut earliest: Option<Instant> = None;
        self.entries.retain(|_, entry| {
            if entry.expires_at <= now {
                return false;
            }
            earliest = Some(earliest.map_or(entry.expires_at, |e| e.min(entry.expires_at)));
            true
        });

        debug!(removed = before.saturating_sub(self.entries.len()), "Page cache swept");
        earliest
    }
}

#[async_trait::async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>> {
        let now = Instant::now();
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.expires_at, entry.page.clone()));

        match lookup {
            Some((expires_at, page)) if expires_at > now => {
                debug!(key = %key, "Page cache hit");
                self.metrics.record_hit(key);
                Ok(Some(page))
            }
            Some(_) => {
                self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
                debug!(key = %key, "Page cache entry expired");
                self.metrics.record_miss(key);
                Ok(None)
            }
            None => {
                debug!(key = %key, "Page cache miss");
                self.metrics.record_miss(key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let expires_at = now + ttl;

        let mut next_expiry = self.next_expiry.lock().await;
        if matches!(*next_expiry, Some(at) if at <= now) {
            *next_expiry = self.sweep_expired(now);
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                expires_at,
                page: page.clone(),
            },
        );
        *next_expiry = Some(next_expiry.map_or(expires_at, |at| at.min(expires_at)));
        drop(next_expiry);

        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Page cache set");
        self.metrics.record_write(key);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<usize> {
        let mut next_expiry = self.next_expiry.lock().await;
        let removed = self.entries.len();
        self.entries.clear();
        *next_expiry = None;
        drop(next_expiry);

        debug!(removed, "Page cache cleared");
        self.metrics.record_clear("memory");
        Ok(removed)
    }
}
