//! Full-page response cache
//!
//! Stores rendered HTTP responses under versioned keys with a TTL:
//! - [`MemoryPageCache`]: process-local, backed by `DashMap`
//! - [`RedisPageCache`]: shared across instances, `SET EX` + `SCAN` clear
//!
//! Both backends record hit/miss/write counters in the default Prometheus
//! registry.

mod error;
mod keys;
mod memory;
mod metrics;
mod redis_store;

pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, CACHE_VERSION};
pub use memory::MemoryPageCache;
pub use metrics::CacheMetrics;
pub use redis_store::{RedisPageCache, SharedRedis};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A rendered response as it is kept in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    pub status: u16,
    #[serde(default)]
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CachedPage {
    pub fn new(status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }
}

/// Core page cache operations
#[async_trait::async_trait]
pub trait PageCache: Send + Sync {
    /// Fetch a live (non-expired) page
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>>;

    /// Store a page for `ttl`
    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()>;

    /// Drop every cached page, returning how many entries were removed
    async fn clear(&self) -> CacheResult<usize>;
}
