use actix_web::{web, App, HttpServer};
use anyhow::Context;
use blog_service::config::{CacheBackend, Config, StorageBackend};
use blog_service::db::{MemoryRepository, PgRepository, Repository};
use blog_service::middleware::SessionMiddleware;
use blog_service::{routes, AppState};
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use page_cache::{MemoryPageCache, PageCache, RedisPageCache};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "blog-service";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn Repository>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryRepository::new()))
        }
        StorageBackend::Postgres => {
            let mut db_cfg = DbPoolConfig::from_env(SERVICE_NAME)
                .unwrap_or_else(|_| DbPoolConfig::new(SERVICE_NAME, &config.database.url));
            if std::env::var("DB_MAX_CONNECTIONS").is_err() {
                db_cfg = db_cfg.with_max_connections(config.database.max_connections);
            }
            db_cfg.log_config();

            let pool = create_pg_pool(db_cfg)
                .await
                .context("Failed to create database pool")?;
            let repo = PgRepository::new(pool);
            repo.migrate()
                .await
                .context("Failed to run database migrations")?;

            tracing::info!("Connected to database via db-pool crate");
            Ok(Arc::new(repo))
        }
    }
}

async fn build_page_cache(config: &Config) -> anyhow::Result<Arc<dyn PageCache>> {
    match config.cache.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryPageCache::new())),
        CacheBackend::Redis => {
            let cache = RedisPageCache::connect(&config.cache.redis_url)
                .await
                .context("Failed to connect page cache to Redis")?;
            tracing::info!("Page cache backed by Redis");
            Ok(Arc::new(cache))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            anyhow::bail!("Failed to load configuration: {}", e);
        }
    };

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!(
        env = %config.app.env,
        storage = ?config.storage,
        cache = ?config.cache.backend,
        "Configuration loaded"
    );

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("Failed to create media root {:?}", config.media.root))?;

    let repo = build_repository(&config).await?;
    let page_cache = build_page_cache(&config).await?;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let state = AppState::new(config, repo, page_cache);

    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(SessionMiddleware::new(state.sessions.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(|cfg| routes::configure(cfg, &state))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await?;

    tracing::info!("{} stopped", SERVICE_NAME);
    Ok(())
}
