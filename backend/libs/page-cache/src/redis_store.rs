//! Redis-backed page cache

use crate::{CacheError, CacheKey, CacheMetrics, CacheResult, CachedPage, PageCache};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Shared Redis connection manager
pub type SharedRedis = Arc<Mutex<ConnectionManager>>;

#[derive(Clone)]
pub struct RedisPageCache {
    redis: SharedRedis,
    metrics: CacheMetrics,
}

impl RedisPageCache {
    pub fn new(redis: SharedRedis) -> Self {
        Self {
            redis,
            metrics: CacheMetrics::new(),
        }
    }

    /// Connect to `url` and wrap the connection manager
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self::new(Arc::new(Mutex::new(manager))))
    }

    async fn scan_del(&self, pattern: &str) -> CacheResult<usize> {
        let mut conn = self.redis.lock().await;
        let mut cursor: u64 = 0;
        let mut total_deleted = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await?;

            if !keys.is_empty() {
                let mut pipe = Pipeline::new();
                for key in &keys {
                    pipe.del(key);
                }
                pipe.query_async::<_, ()>(&mut *conn).await?;

                total_deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted = total_deleted, "Page cache scan delete");
        Ok(total_deleted)
    }
}

#[async_trait::async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>> {
        let mut conn = self.redis.lock().await;

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => match serde_json::from_str::<CachedPage>(&data) {
                Ok(page) => {
                    debug!(key = %key, "Page cache hit");
                    self.metrics.record_hit(key);
                    Ok(Some(page))
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Page cache deserialization failed");
                    self.metrics.record_error(key, "deserialize");
                    let _ = conn.del::<_, ()>(key).await;
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!(key = %key, "Page cache miss");
                self.metrics.record_miss(key);
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis get error");
                self.metrics.record_error(key, "redis");
                Err(CacheError::Redis(e))
            }
        }
    }

    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()> {
        let data = serde_json::to_string(page)?;
        // SET EX takes whole seconds; never let a sub-second TTL become 0
        let ttl_secs = ttl.as_secs().max(1);

        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(key, data, ttl_secs).await?;

        debug!(key = %key, ttl = ttl_secs, "Page cache set");
        self.metrics.record_write(key);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<usize> {
        let removed = self.scan_del(&CacheKey::all_pages_pattern()).await?;
        self.metrics.record_clear("redis");
        Ok(removed)
    }
}
