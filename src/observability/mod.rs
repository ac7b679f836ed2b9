//! Structured logging and lightweight runtime metrics.
//!
//! This module provides:
//! - [`init_logging`]: one-time structured logging setup with `RUST_LOG` support
//! - [`Metrics`]: counters for the explorer's action, fetch, and cache activity

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

/// Install the `tracing` subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to `wikigraph=info`. Output
/// goes to stderr so the CLI's JSON on stdout stays parseable. Only the first
/// call installs anything.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wikigraph=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Counters for one explorer session.
///
/// Serializable to JSON via [`Metrics::to_json`].
#[derive(Debug, Clone)]
pub struct Metrics {
    pub started_at: DateTime<Utc>,
    pub actions_delivered: u64,
    pub actions_rejected: u64,
    pub expansions: u64,
    pub collapses: u64,
    pub hard_resets: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub search_queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            actions_delivered: 0,
            actions_rejected: 0,
            expansions: 0,
            collapses: 0,
            hard_resets: 0,
            fetches: 0,
            fetch_failures: 0,
            search_queries: 0,
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "started_at": self.started_at.to_rfc3339(),
            "actions_delivered": self.actions_delivered,
            "actions_rejected": self.actions_rejected,
            "expansions": self.expansions,
            "collapses": self.collapses,
            "hard_resets": self.hard_resets,
            "fetches": self.fetches,
            "fetch_failures": self.fetch_failures,
            "search_queries": self.search_queries,
            "cache_hits": self.cache_hits,
            "cache_misses": self.cache_misses,
            "cache_hit_rate": self.cache_hit_rate(),
        })
    }

    /// Fraction of expansions served from the link cache.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / total as f64
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_twice_is_harmless() {
        init_logging();
        init_logging();
    }

    #[test]
    fn metrics_new_has_zero_counters() {
        let m = Metrics::new();
        assert_eq!(m.actions_delivered, 0);
        assert_eq!(m.actions_rejected, 0);
        assert_eq!(m.expansions, 0);
        assert_eq!(m.hard_resets, 0);
        assert_eq!(m.fetch_failures, 0);
        assert!(m.started_at <= Utc::now());
    }

    #[test]
    fn metrics_to_json_contains_all_fields() {
        let mut m = Metrics::new();
        m.actions_delivered = 12;
        m.actions_rejected = 2;
        m.expansions = 8;
        m.collapses = 3;
        m.hard_resets = 1;
        m.fetches = 6;
        m.fetch_failures = 1;
        m.search_queries = 4;
        m.cache_hits = 2;
        m.cache_misses = 6;

        let json = m.to_json();
        assert_eq!(json["actions_delivered"], 12);
        assert_eq!(json["actions_rejected"], 2);
        assert_eq!(json["expansions"], 8);
        assert_eq!(json["collapses"], 3);
        assert_eq!(json["hard_resets"], 1);
        assert_eq!(json["fetches"], 6);
        assert_eq!(json["fetch_failures"], 1);
        assert_eq!(json["search_queries"], 4);
        assert_eq!(json["cache_hits"], 2);
        assert_eq!(json["cache_misses"], 6);
        assert_eq!(json["cache_hit_rate"], 0.25);
        assert!(json["started_at"].is_string());
    }

    #[test]
    fn metrics_cache_hit_rate() {
        let mut m = Metrics::new();
        m.cache_hits = 7;
        m.cache_misses = 3;
        assert!((m.cache_hit_rate() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_cache_hit_rate_zero_total() {
        assert_eq!(Metrics::new().cache_hit_rate(), 0.0);
    }
}
