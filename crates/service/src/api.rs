//! HTTP API for price predictions, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pricing_lib::{
    error::PredictError,
    health::{ComponentStatus, HealthRegistry},
    models::{BatchOutcome, PropertyFeatures},
    observability::{PricingMetrics, StructuredLogger},
    predictor::{
        BatchRunner, FeatureNormalizer, MarketTrendsReporter, PredictionOrchestrator,
        MAX_BATCH_SIZE,
    },
    schemas::{
        BatchPredictionRequest, BatchPredictionResponse, ErrorResponse, MarketTrendsResponse,
        PredictionRequest, PredictionResponse, PredictorHealth, ReloadResponse,
    },
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub orchestrator: PredictionOrchestrator,
    pub health_registry: HealthRegistry,
    pub metrics: PricingMetrics,
    pub logger: StructuredLogger,
    pub trends: MarketTrendsReporter,
}

impl AppState {
    pub fn new(
        orchestrator: PredictionOrchestrator,
        health_registry: HealthRegistry,
        metrics: PricingMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            orchestrator,
            health_registry,
            metrics,
            logger,
            trends: MarketTrendsReporter::new(),
        }
    }
}

/// Errors returned to API clients
#[derive(Debug)]
pub enum ApiError {
    Predict(PredictError),
    /// A batch entry failed validation; ids are 1-based
    InvalidProperty {
        property_id: usize,
        source: PredictError,
    },
    BadRequest(String),
    Internal(String),
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        ApiError::Predict(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn predict_error_status(err: &PredictError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Predict(PredictError::MissingFields { fields }) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::missing_fields(&fields))
            }
            ApiError::Predict(err) => (predict_error_status(&err), ErrorResponse::new(err.to_string())),
            ApiError::InvalidProperty { property_id, source } => {
                let mut body = match &source {
                    PredictError::MissingFields { fields } => ErrorResponse::missing_fields(fields),
                    other => ErrorResponse::new(other.to_string()),
                };
                body.error.message = format!("Property {}: {}", property_id, body.error.message);
                (predict_error_status(&source), body)
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorResponse::new(message)),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(message))
            }
        };
        (status, Json(body)).into_response()
    }
}

async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload?;
    let start = Instant::now();

    let adapter = state.orchestrator.store().current();
    let prediction = match FeatureNormalizer::new()
        .normalize(&request.features)
        .and_then(|record| state.orchestrator.predict_with(&adapter, &record))
    {
        Ok(prediction) => prediction,
        Err(err) => {
            state.metrics.inc_prediction_errors();
            return Err(err.into());
        }
    };

    let elapsed = start.elapsed();
    state
        .metrics
        .record_prediction(prediction.model_used, adapter.is_loaded(), elapsed.as_secs_f64());
    state.logger.log_prediction(
        prediction.model_used,
        prediction.result.estimated_price,
        prediction.result.confidence,
        elapsed.as_secs_f64() * 1000.0,
    );

    Ok(Json(PredictionResponse::new(request.features, prediction)))
}

/// Validate every property, then price the batch
fn run_batch(
    orchestrator: &PredictionOrchestrator,
    properties: &[PropertyFeatures],
) -> Result<BatchOutcome, ApiError> {
    let normalizer = FeatureNormalizer::new();
    let records = properties
        .iter()
        .enumerate()
        .map(|(idx, features)| {
            normalizer
                .normalize(features)
                .map_err(|source| ApiError::InvalidProperty {
                    property_id: idx + 1,
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchRunner::new(orchestrator).predict_batch(properties, &records)?)
}

async fn batch_predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchPredictionRequest>, JsonRejection>,
) -> Result<Json<BatchPredictionResponse>, ApiError> {
    let Json(request) = payload?;
    let properties = request.properties;
    if properties.len() > MAX_BATCH_SIZE {
        return Err(PredictError::BatchTooLarge {
            max: MAX_BATCH_SIZE,
            actual: properties.len(),
        }
        .into());
    }

    let start = Instant::now();
    let size = properties.len();
    let learned_available = state.orchestrator.store().is_model_loaded();

    let worker_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        run_batch(&worker_state.orchestrator, &properties)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Batch prediction task failed: {}", e)))?;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            state.metrics.inc_prediction_errors();
            return Err(err);
        }
    };

    let elapsed = start.elapsed();
    state
        .metrics
        .record_batch(outcome.model_used, learned_available, size, elapsed.as_secs_f64());
    state
        .logger
        .log_batch_prediction(outcome.model_used, size, elapsed.as_secs_f64() * 1000.0);

    Ok(Json(BatchPredictionResponse::from(outcome)))
}

async fn market_trends(State(state): State<Arc<AppState>>) -> Json<MarketTrendsResponse> {
    Json(MarketTrendsResponse::from(state.trends.trends()))
}

async fn predictor_health(State(state): State<Arc<AppState>>) -> Json<PredictorHealth> {
    Json(PredictorHealth::from(&state.orchestrator.store().status()))
}

/// Re-read the model artifacts and swap the active model
async fn reload_model(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>, ApiError> {
    let store = state.orchestrator.store().clone();
    let old_version = store.current().model_version().map(str::to_string);

    let result = tokio::task::spawn_blocking(move || store.reload())
        .await
        .map_err(|e| ApiError::Internal(format!("Model reload task failed: {}", e)))?;

    let status = state.orchestrator.store().status();
    state.health_registry.record_model_status(&status).await;
    state.metrics.set_model_loaded(status.loaded);

    match result {
        Ok(outcome) => {
            state.metrics.record_reload(true);
            state
                .logger
                .log_model_reload(old_version.as_deref(), outcome.version.as_deref());
            let message = if outcome.loaded {
                "ML model reloaded"
            } else {
                "Model file not found, using fallback heuristic model"
            };
            Ok(Json(ReloadResponse {
                success: true,
                ml_model_loaded: outcome.loaded,
                model_version: outcome.version,
                message: message.to_string(),
            }))
        }
        Err(e) => {
            let message = format!("{:#}", e);
            state.metrics.record_reload(false);
            state
                .logger
                .log_model_reload_failed(old_version.as_deref(), &message);
            Err(ApiError::Internal(format!("Model reload failed: {}", message)))
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // heuristic model still serves
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predictor/predict", post(predict))
        .route("/predictor/batch-predict", post(batch_predict))
        .route("/predictor/market-trends", get(market_trends))
        .route("/predictor/health", get(predictor_health))
        .route("/predictor/reload", post(reload_model))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
