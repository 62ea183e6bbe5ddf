/// Shared application state handed to every handler through `web::Data`
use crate::config::Config;
use crate::db::Repository;
use crate::media::MediaStore;
use crate::security::SessionKeys;
use page_cache::PageCache;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub page_cache: Arc<dyn PageCache>,
    pub media: MediaStore,
    pub sessions: SessionKeys,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, repo: Arc<dyn Repository>, page_cache: Arc<dyn PageCache>) -> Self {
        Self {
            media: MediaStore::new(config.media.root.clone()),
            sessions: SessionKeys::new(&config.session),
            config: Arc::new(config),
            repo,
            page_cache,
        }
    }

    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache.index_ttl_secs)
    }
}
