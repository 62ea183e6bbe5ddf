//! Page cache key schema
//!
//! Key format: v{VERSION}:page:{prefix}:{method}:{vary}:{path_and_query}

/// Cache schema version - increment when changing key formats
pub const CACHE_VERSION: u32 = 1;

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for one cached page.
    ///
    /// `vary` distinguishes viewers that must not share a page (for
    /// example `anon` and `user:42`).
    pub fn page(prefix: &str, method: &str, vary: &str, path_and_query: &str) -> String {
        format!(
            "v{}:page:{}:{}:{}:{}",
            CACHE_VERSION,
            prefix,
            method.to_ascii_uppercase(),
            vary,
            path_and_query
        )
    }

    /// Pattern matching every cached page
    pub fn all_pages_pattern() -> String {
        format!("v{}:page:*", CACHE_VERSION)
    }

    /// Extract the prefix segment of a page key, used as a metrics label
    pub fn prefix_of(key: &str) -> &str {
        key.splitn(4, ':').nth(2).unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_key_layout() {
        let key = CacheKey::page("index_page", "get", "anon", "/?page=2");
        assert_eq!(key, "v1:page:index_page:GET:anon:/?page=2");
    }

    #[test]
    fn test_prefix_of() {
        let key = CacheKey::page("index_page", "GET", "user:7", "/");
        assert_eq!(CacheKey::prefix_of(&key), "index_page");
        assert_eq!(CacheKey::prefix_of("garbage"), "unknown");
    }

    #[test]
    fn test_all_pages_pattern_matches_keys() {
        assert_eq!(CacheKey::all_pages_pattern(), "v1:page:*");
        let key = CacheKey::page("index_page", "GET", "anon", "/");
        assert!(key.starts_with(CacheKey::all_pages_pattern().trim_end_matches('*')));
    }
}
