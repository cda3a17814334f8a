//! Integration tests for the price service API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use price_service::api::{create_router, AppState};
use pricing_lib::{
    health::{components, HealthRegistry},
    observability::{PricingMetrics, StructuredLogger},
    predictor::{
        CategoricalColumn, CategoricalEncoder, FeatureRow, LearnedModelAdapter, ModelPaths,
        ModelStore, PredictionOrchestrator, RegressionModel,
    },
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Deterministic stand-in for a trained artifact: price = 150 * Area
struct AreaModel;

impl RegressionModel for AreaModel {
    fn predict_rows(&self, rows: &[FeatureRow]) -> anyhow::Result<Vec<f32>> {
        Ok(rows.iter().map(|row| 150.0 * row[0]).collect())
    }

    fn version(&self) -> &str {
        "area-test"
    }
}

fn encoder() -> CategoricalEncoder {
    CategoricalEncoder::from_vocabularies([
        (CategoricalColumn::Location, vec!["Downtown", "Rural", "Suburban", "Urban"]),
        (CategoricalColumn::Condition, vec!["Excellent", "Fair", "Good", "Poor"]),
        (CategoricalColumn::Garage, vec!["No", "Yes"]),
    ])
}

async fn setup_with_store(store: ModelStore) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::ENGINE).await;
    health_registry.record_model_status(&store.status()).await;

    let state = Arc::new(AppState::new(
        PredictionOrchestrator::new(Arc::new(store)),
        health_registry,
        PricingMetrics::new(),
        StructuredLogger::new("price-service-test"),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    setup_with_store(ModelStore::empty()).await
}

async fn setup_learned_app() -> (Router, Arc<AppState>) {
    let adapter = LearnedModelAdapter::new(Arc::new(AreaModel), encoder());
    setup_with_store(ModelStore::from_adapter(adapter)).await
}

fn reference_features() -> Value {
    json!({
        "area": 2000,
        "bedrooms": 3,
        "bathrooms": 2,
        "floors": 2,
        "age": 15,
        "location": "Urban",
        "condition": "Good",
        "garage": true
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn post_json(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_predict_uses_heuristic_without_model() {
    let (app, _state) = setup_test_app().await;

    let body = json!({ "features": reference_features() }).to_string();
    let (status, value) = post_json(app, "/predictor/predict", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["modelUsed"], "heuristic");
    assert_eq!(value["currency"], "INR");
    assert_eq!(value["prediction"]["estimatedPrice"], 387_500);
    assert_eq!(value["prediction"]["priceRange"]["min"], 348_750);
    assert_eq!(value["prediction"]["priceRange"]["max"], 426_250);
    assert_eq!(value["prediction"]["confidence"], 0.85);
    assert_eq!(value["prediction"]["breakdown"]["garageContribution"], 15_000);
    assert_eq!(value["inputFeatures"]["location"], "Urban");
    assert!(value["disclaimer"].as_str().unwrap().starts_with("This is an estimated price"));
}

#[tokio::test]
async fn test_predict_uses_learned_model_when_loaded() {
    let (app, _state) = setup_learned_app().await;

    let body = json!({ "features": reference_features() }).to_string();
    let (status, value) = post_json(app, "/predictor/predict", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["modelUsed"], "ml_model");
    assert_eq!(value["prediction"]["estimatedPrice"], 300_000);
    assert_eq!(value["prediction"]["priceRange"]["min"], 285_000);
    assert_eq!(value["prediction"]["priceRange"]["max"], 315_000);
    assert_eq!(value["prediction"]["confidence"], 0.9);
    assert!(value["prediction"]["breakdown"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_predict_reports_all_missing_fields() {
    let (app, _state) = setup_test_app().await;

    let body = json!({ "features": { "location": "Urban" } }).to_string();
    let (status, value) = post_json(app, "/predictor/predict", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["message"], "Required fields missing");
    assert_eq!(
        value["error"]["missing"],
        json!(["area", "bedrooms", "bathrooms", "yearBuilt or age"])
    );
    assert!(value["error"]["required"]["area"].is_string());
}

#[tokio::test]
async fn test_predict_rejects_out_of_range_values() {
    let (app, _state) = setup_test_app().await;

    let mut features = reference_features();
    features["area"] = json!(-5);
    let body = json!({ "features": features }).to_string();
    let (status, value) = post_json(app, "/predictor/predict", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"]["message"].as_str().unwrap().contains("area"));
}

#[tokio::test]
async fn test_predict_rejects_malformed_body() {
    let (app, _state) = setup_test_app().await;

    let (status, value) = post_json(app, "/predictor/predict", "{not json".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["success"], false);
}

#[tokio::test]
async fn test_batch_predict_numbers_properties() {
    let (app, _state) = setup_test_app().await;

    let mut second = reference_features();
    second["location"] = json!("Rural");
    let body = json!({ "properties": [reference_features(), second] }).to_string();
    let (status, value) = post_json(app, "/predictor/batch-predict", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["modelUsed"], "heuristic");
    let predictions = value["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0]["propertyId"], 1);
    assert_eq!(predictions[1]["propertyId"], 2);
    assert_eq!(predictions[1]["features"]["location"], "Rural");
    assert_eq!(predictions[1]["prediction"]["estimatedPrice"], 347_500);
    assert!(value["disclaimer"].as_str().unwrap().starts_with("These are estimated prices"));
}

#[tokio::test]
async fn test_batch_predict_with_learned_model() {
    let (app, _state) = setup_learned_app().await;

    let body = json!({ "properties": [reference_features(), reference_features()] }).to_string();
    let (status, value) = post_json(app, "/predictor/batch-predict", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["modelUsed"], "ml_model");
    assert_eq!(value["predictions"][1]["prediction"]["estimatedPrice"], 300_000);
}

#[tokio::test]
async fn test_batch_predict_rejects_empty_batch() {
    let (app, _state) = setup_test_app().await;

    let body = json!({ "properties": [] }).to_string();
    let (status, value) = post_json(app, "/predictor/batch-predict", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["success"], false);
}

#[tokio::test]
async fn test_batch_predict_rejects_oversized_batch() {
    let (app, _state) = setup_test_app().await;

    let properties: Vec<Value> = (0..101).map(|_| reference_features()).collect();
    let body = json!({ "properties": properties }).to_string();
    let (status, value) = post_json(app, "/predictor/batch-predict", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Maximum 100 properties"));
}

#[tokio::test]
async fn test_batch_predict_names_invalid_property() {
    let (app, _state) = setup_test_app().await;

    let body = json!({ "properties": [reference_features(), { "area": 1200 }] }).to_string();
    let (status, value) = post_json(app, "/predictor/batch-predict", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        value["error"]["message"],
        "Property 2: Required fields missing"
    );
    assert_eq!(value["error"]["missing"][0], "bedrooms");
}

#[tokio::test]
async fn test_market_trends() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/predictor/market-trends").await;
    let value: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["trends"]["averagePricePerSqFt"], 100.0);
    assert_eq!(value["trends"]["locationPremiums"]["urban"], 50_000);
    assert_eq!(value["trends"]["amenityValues"]["balcony"], 8_000);
    assert!(value["lastUpdated"].is_string());
    assert_eq!(value["message"], "Market trends based on current pricing model");
}

#[tokio::test]
async fn test_predictor_health_reports_fallback_mode() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/predictor/health").await;
    let value: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "degraded");
    assert_eq!(value["mlModelLoaded"], false);
    assert_eq!(value["message"], "Using fallback heuristic model");
}

#[tokio::test]
async fn test_predictor_health_reports_loaded_model() {
    let (app, _state) = setup_learned_app().await;

    let (_, body) = get(app, "/predictor/health").await;
    let value: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(value["status"], "healthy");
    assert_eq!(value["mlModelLoaded"], true);
}

#[tokio::test]
async fn test_reload_without_artifact_paths_fails() {
    let (app, _state) = setup_learned_app().await;

    let (status, value) = post_json(app.clone(), "/predictor/reload", String::new()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Model reload failed"));

    // The previous model keeps serving
    let (_, body) = get(app, "/predictor/health").await;
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["mlModelLoaded"], true);
}

#[tokio::test]
async fn test_reload_with_missing_artifact_switches_to_heuristic() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::load(ModelPaths::new(
        dir.path().join("model.onnx"),
        dir.path().join("encoder.json"),
    ));
    let (app, _state) = setup_with_store(store).await;

    let (status, value) = post_json(app, "/predictor/reload", String::new()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["mlModelLoaded"], false);
    assert!(value["modelVersion"].is_null());
}

#[tokio::test]
async fn test_healthz_degraded_without_learned_model() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/healthz").await;
    let health: Value = serde_json::from_slice(&body).unwrap();

    // Degraded still returns 200 (operational)
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"]["engine"]["status"], "healthy");
    assert_eq!(health["components"]["learned_model"]["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_healthy_with_learned_model() {
    let (app, _state) = setup_learned_app().await;

    let (status, body) = get(app, "/healthz").await;
    let health: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(components::ENGINE, "Worker pool exhausted")
        .await;

    let (status, body) = get(app, "/healthz").await;
    let health: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/readyz").await;
    let readiness: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state) = setup_test_app().await;

    state.health_registry.set_ready(true).await;

    let (status, body) = get(app, "/readyz").await;
    let readiness: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app().await;

    let body = json!({ "features": reference_features() }).to_string();
    let (status, _) = post_json(app.clone(), "/predictor/predict", body).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("price_service_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("price_service_predictions_total"));
    assert!(metrics_text.contains("price_service_learned_model_loaded"));
}
