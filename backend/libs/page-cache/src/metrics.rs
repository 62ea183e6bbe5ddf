//! Cache metrics for observability

use crate::keys::CacheKey;
use prometheus::{register_int_counter_vec, IntCounterVec};
use std::sync::OnceLock;

static METRICS: OnceLock<CacheMetricsInner> = OnceLock::new();

struct CacheMetricsInner {
    hits: IntCounterVec,
    misses: IntCounterVec,
    writes: IntCounterVec,
    clears: IntCounterVec,
    errors: IntCounterVec,
}

impl CacheMetricsInner {
    fn new() -> Self {
        Self {
            hits: register_int_counter_vec!(
                "page_cache_hits_total",
                "Total page cache hits",
                &["prefix"]
            )
            .expect("valid metric definition"),
            misses: register_int_counter_vec!(
                "page_cache_misses_total",
                "Total page cache misses",
                &["prefix"]
            )
            .expect("valid metric definition"),
            writes: register_int_counter_vec!(
                "page_cache_writes_total",
                "Total page cache writes",
                &["prefix"]
            )
            .expect("valid metric definition"),
            clears: register_int_counter_vec!(
                "page_cache_clears_total",
                "Total page cache clear operations",
                &["backend"]
            )
            .expect("valid metric definition"),
            errors: register_int_counter_vec!(
                "page_cache_errors_total",
                "Total page cache errors",
                &["prefix", "error_type"]
            )
            .expect("valid metric definition"),
        }
    }
}

fn get_metrics() -> &'static CacheMetricsInner {
    METRICS.get_or_init(CacheMetricsInner::new)
}

/// Cache metrics wrapper, registered with the default Prometheus registry
#[derive(Clone, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_hit(&self, key: &str) {
        get_metrics()
            .hits
            .with_label_values(&[CacheKey::prefix_of(key)])
            .inc();
    }

    pub fn record_miss(&self, key: &str) {
        get_metrics()
            .misses
            .with_label_values(&[CacheKey::prefix_of(key)])
            .inc();
    }

    pub fn record_write(&self, key: &str) {
        get_metrics()
            .writes
            .with_label_values(&[CacheKey::prefix_of(key)])
            .inc();
    }

    pub fn record_clear(&self, backend: &str) {
        get_metrics().clears.with_label_values(&[backend]).inc();
    }

    pub fn record_error(&self, key: &str, error_type: &str) {
        get_metrics()
            .errors
            .with_label_values(&[CacheKey::prefix_of(key), error_type])
            .inc();
    }
}
