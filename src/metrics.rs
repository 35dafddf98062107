//! Prometheus metrics for the picker.
//!
//! Each concern (cache, bag, sources) owns a small struct of recording
//! functions; names follow `movie_roulette_{phase}_{name}_total`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("movie_roulette_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("movie_roulette_", $phase, "_", $name)
    };
}

/// Install the global Prometheus recorder. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_ok() {
                info!("Prometheus recorder installed");
            }
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Render current metrics in Prometheus text format
pub fn render() -> String {
    HANDLE.get().map(|h| h.render()).unwrap_or_default()
}

pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_hit() {
        ::metrics::counter!(phase_metric!(counter, "cache", "hits")).increment(1);
    }

    pub fn record_miss() {
        ::metrics::counter!(phase_metric!(counter, "cache", "misses")).increment(1);
    }

    pub fn record_backfill() {
        ::metrics::counter!(phase_metric!(counter, "cache", "backfills")).increment(1);
    }

    pub fn record_persist_error() {
        ::metrics::counter!(phase_metric!(counter, "cache", "persist_errors")).increment(1);
    }
}

pub struct BagMetrics;

impl BagMetrics {
    pub fn record_draw() {
        ::metrics::counter!(phase_metric!(counter, "bag", "draws")).increment(1);
    }

    pub fn record_reshuffle(size: usize) {
        ::metrics::counter!(phase_metric!(counter, "bag", "reshuffles")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "bag", "refill_size")).record(size as f64);
    }

    pub fn record_persist_error() {
        ::metrics::counter!(phase_metric!(counter, "bag", "persist_errors")).increment(1);
    }
}

pub struct SourceMetrics;

impl SourceMetrics {
    pub fn record_success(source: &'static str, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "sources", "lookups_success"), "source" => source)
            .increment(1);
        ::metrics::histogram!(
            phase_metric!(histogram, "sources", "lookup_duration_seconds"),
            "source" => source
        )
        .record(duration_secs);
    }

    pub fn record_error(source: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "sources", "lookups_error"), "source" => source)
            .increment(1);
    }
}
