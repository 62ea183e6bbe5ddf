/// Configuration management for Blog Service
///
/// All settings come from environment variables (a `.env` file is loaded
/// by `main` through `dotenvy` first).
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Session secret used when none is configured. Refused in production.
pub const DEV_SESSION_SECRET: &str = "dev-only-session-secret-change-me";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Which repository backend to run on
    pub storage: StorageBackend,
    /// Page cache configuration
    pub cache: CacheConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
    /// Uploaded media configuration
    pub media: MediaConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Redis URL, used when `backend` is redis
    pub redis_url: String,
    /// Lifetime of a cached index page
    pub index_ttl_secs: u64,
    /// Key prefix of cached index pages
    pub index_key_prefix: String,
}

/// Session cookie configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HS256 signing secret
    pub secret: String,
    pub cookie_name: String,
    pub ttl_days: i64,
    /// Mark the cookie `Secure`
    pub secure_cookie: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"[REDACTED]")
            .field("cookie_name", &self.cookie_name)
            .field("ttl_days", &self.ttl_days)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// Uploaded media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded images are written under
    pub root: PathBuf,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                env: "development".to_string(),
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/blog".to_string(),
                max_connections: 10,
            },
            storage: StorageBackend::Postgres,
            cache: CacheConfig {
                backend: CacheBackend::Memory,
                redis_url: "redis://localhost:6379".to_string(),
                index_ttl_secs: 20,
                index_key_prefix: "index_page".to_string(),
            },
            session: SessionConfig {
                secret: DEV_SESSION_SECRET.to_string(),
                cookie_name: "blog_session".to_string(),
                ttl_days: 14,
                secure_cookie: false,
            },
            media: MediaConfig {
                root: PathBuf::from("media"),
                max_upload_bytes: 5 * 1024 * 1024,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let defaults = Config::default();
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| defaults.app.env.clone());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("BLOG_SERVICE_HOST").unwrap_or(defaults.app.host),
                port: parse_env_or_default("BLOG_SERVICE_PORT", defaults.app.port)?,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parse_env_or_default(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
            },
            storage: parse_env_or_default("STORAGE_BACKEND", defaults.storage)?,
            cache: CacheConfig {
                backend: parse_env_or_default("PAGE_CACHE_BACKEND", defaults.cache.backend)?,
                redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.cache.redis_url),
                index_ttl_secs: parse_env_or_default(
                    "INDEX_CACHE_TTL_SECS",
                    defaults.cache.index_ttl_secs,
                )?,
                index_key_prefix: std::env::var("INDEX_CACHE_KEY_PREFIX")
                    .unwrap_or(defaults.cache.index_key_prefix),
            },
            session: {
                let secret = std::env::var("SESSION_SECRET").unwrap_or_default();
                if production && (secret.trim().is_empty() || secret == DEV_SESSION_SECRET) {
                    return Err(
                        "SESSION_SECRET must be set to a non-default value in production"
                            .to_string(),
                    );
                }
                let secret = if secret.trim().is_empty() {
                    defaults.session.secret
                } else {
                    secret
                };

                SessionConfig {
                    secret,
                    cookie_name: std::env::var("SESSION_COOKIE_NAME")
                        .unwrap_or(defaults.session.cookie_name),
                    ttl_days: parse_env_or_default("SESSION_TTL_DAYS", defaults.session.ttl_days)?,
                    secure_cookie: parse_env_or_default("SESSION_SECURE_COOKIE", production)?,
                }
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.media.root),
                max_upload_bytes: parse_env_or_default(
                    "MEDIA_MAX_UPLOAD_BYTES",
                    defaults.media.max_upload_bytes,
                )?,
            },
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
