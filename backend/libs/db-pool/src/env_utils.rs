//! Environment variable parsing helpers for pool tuning knobs

use std::str::FromStr;

/// Parse an environment variable with a default fallback
///
/// Missing and unparsable values both fall back to `default`.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, returning None if missing or invalid
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
