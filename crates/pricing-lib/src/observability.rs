//! Observability for the price prediction service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, estimator usage, fallbacks, model reloads)
//! - Structured logging of domain events with tracing

use crate::models::ModelUsed;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

const BATCH_SIZE_BUCKETS: &[f64] = &[1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0];

static GLOBAL_METRICS: OnceLock<PricingMetricsInner> = OnceLock::new();

struct PricingMetricsInner {
    prediction_latency_seconds: Histogram,
    batch_latency_seconds: Histogram,
    batch_size: Histogram,
    predictions_total: IntCounterVec,
    fallbacks_total: IntCounter,
    prediction_errors_total: IntCounter,
    learned_model_loaded: IntGauge,
    model_reloads_total: IntCounterVec,
}

impl PricingMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "price_service_prediction_latency_seconds",
                "Time spent producing a single price prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            batch_latency_seconds: register_histogram!(
                "price_service_batch_latency_seconds",
                "Time spent producing a batch of price predictions",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register batch_latency_seconds"),

            batch_size: register_histogram!(
                "price_service_batch_size",
                "Number of properties per batch request",
                BATCH_SIZE_BUCKETS.to_vec()
            )
            .expect("Failed to register batch_size"),

            predictions_total: register_int_counter_vec!(
                "price_service_predictions_total",
                "Properties priced, by estimator",
                &["model"]
            )
            .expect("Failed to register predictions_total"),

            fallbacks_total: register_int_counter!(
                "price_service_fallbacks_total",
                "Requests served by the heuristic model while a learned model was loaded"
            )
            .expect("Failed to register fallbacks_total"),

            prediction_errors_total: register_int_counter!(
                "price_service_prediction_errors_total",
                "Prediction requests that failed"
            )
            .expect("Failed to register prediction_errors_total"),

            learned_model_loaded: register_int_gauge!(
                "price_service_learned_model_loaded",
                "1 when a learned model is active, 0 in heuristic-only mode"
            )
            .expect("Failed to register learned_model_loaded"),

            model_reloads_total: register_int_counter_vec!(
                "price_service_model_reloads_total",
                "Model reload attempts, by outcome",
                &["outcome"]
            )
            .expect("Failed to register model_reloads_total"),
        }
    }
}

/// Lightweight handle to the process-wide metric set
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct PricingMetrics {
    _private: (),
}

impl Default for PricingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingMetrics {
    /// Create a handle, registering the metrics on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PricingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PricingMetricsInner {
        GLOBAL_METRICS.get_or_init(PricingMetricsInner::new)
    }

    /// Record one single-property prediction
    ///
    /// `learned_available` is whether a learned model was loaded when the
    /// request was served; a heuristic answer in that case counts as a fallback.
    pub fn record_prediction(&self, model_used: ModelUsed, learned_available: bool, duration_secs: f64) {
        let inner = self.inner();
        inner.prediction_latency_seconds.observe(duration_secs);
        inner
            .predictions_total
            .with_label_values(&[model_used.as_str()])
            .inc();
        if learned_available && model_used == ModelUsed::Heuristic {
            inner.fallbacks_total.inc();
        }
    }

    pub fn record_batch(&self, model_used: ModelUsed, learned_available: bool, size: usize, duration_secs: f64) {
        let inner = self.inner();
        inner.batch_latency_seconds.observe(duration_secs);
        inner.batch_size.observe(size as f64);
        inner
            .predictions_total
            .with_label_values(&[model_used.as_str()])
            .inc_by(size as u64);
        if learned_available && model_used == ModelUsed::Heuristic {
            inner.fallbacks_total.inc();
        }
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.inner().learned_model_loaded.set(i64::from(loaded));
    }

    pub fn record_reload(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.inner()
            .model_reloads_total
            .with_label_values(&[outcome])
            .inc();
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn log_prediction(
        &self,
        model_used: ModelUsed,
        estimated_price: i64,
        confidence: f64,
        duration_ms: f64,
    ) {
        info!(
            event = "prediction_generated",
            service = %self.service_name,
            model_used = %model_used,
            estimated_price = estimated_price,
            confidence = confidence,
            duration_ms = duration_ms,
            "Generated price prediction"
        );
    }

    pub fn log_batch_prediction(&self, model_used: ModelUsed, properties: usize, duration_ms: f64) {
        info!(
            event = "batch_prediction_generated",
            service = %self.service_name,
            model_used = %model_used,
            properties = properties,
            duration_ms = duration_ms,
            "Generated batch price prediction"
        );
    }

    pub fn log_model_loaded(&self, loaded: bool, version: Option<&str>, model_path: Option<&str>) {
        if loaded {
            info!(
                event = "model_loaded",
                service = %self.service_name,
                model_version = version.unwrap_or_default(),
                model_path = model_path.unwrap_or_default(),
                "Learned model active"
            );
        } else {
            warn!(
                event = "model_loaded",
                service = %self.service_name,
                model_path = model_path.unwrap_or_default(),
                "No learned model active, serving heuristic estimates"
            );
        }
    }

    pub fn log_model_reload(&self, old_version: Option<&str>, new_version: Option<&str>) {
        info!(
            event = "model_reloaded",
            service = %self.service_name,
            old_version = old_version.unwrap_or("none"),
            new_version = new_version.unwrap_or("none"),
            "Learned model reloaded"
        );
    }

    pub fn log_model_reload_failed(&self, current_version: Option<&str>, error: &str) {
        warn!(
            event = "model_reload_failed",
            service = %self.service_name,
            current_version = current_version.unwrap_or("none"),
            error = %error,
            "Model reload failed, keeping previous version"
        );
    }

    pub fn log_startup(&self, version: &str, model_version: Option<&str>) {
        info!(
            event = "service_started",
            service = %self.service_name,
            service_version = %version,
            model_version = model_version.unwrap_or("none"),
            "Price service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Price service shutting down"
        );
    }
}
