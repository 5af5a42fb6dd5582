//! Router tests driving every route with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use potability::dataset::LabeledDataset;
use potability::trainer::Trainer;
use potability::{Predictor, FEATURE_NAMES, LABEL_COLUMN};
use potability_server::{build_router, AppState, ServerConfig};
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::sync::Arc;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Small deterministic dataset: potable iff ph in [6, 9) and Sulfate < 340.
fn training_csv() -> String {
    let mut csv = format!("{},{LABEL_COLUMN}\n", FEATURE_NAMES.join(","));
    for i in 0..200u32 {
        let ph = (i % 28) as f64 * 0.5;
        let sulfate = 150.0 + ((i * 37) % 300) as f64;
        let hardness = 80.0 + ((i * 13) % 200) as f64;
        let potable = (6.0..9.0).contains(&ph) && sulfate < 340.0;
        writeln!(
            csv,
            "{ph},{hardness},{},{},{sulfate},{},{},{},{},{}",
            20000.0 + (i * 97 % 500) as f64,
            5.0 + (i % 7) as f64,
            300.0 + (i * 11 % 200) as f64,
            10.0 + (i % 9) as f64,
            50.0 + (i * 3 % 60) as f64,
            3.0 + (i % 4) as f64 * 0.5,
            u8::from(potable)
        )
        .unwrap();
    }
    csv
}

fn test_app_with_limit(max_body_bytes: usize) -> Router {
    let dataset = LabeledDataset::from_csv_reader(training_csv().as_bytes()).unwrap();
    let outcome = Trainer::builder()
        .n_estimators(20)
        .build()
        .fit(&dataset)
        .unwrap();
    let state = Arc::new(AppState {
        config: ServerConfig {
            max_body_bytes,
            ..ServerConfig::default()
        },
        predictor: Predictor::new(outcome.pipeline),
    });
    build_router(state)
}

fn test_app() -> Router {
    test_app_with_limit(ServerConfig::default().max_body_bytes)
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn sample_json() -> Value {
    json!({
        "ph": 7.0,
        "Hardness": 100.0,
        "Solids": 10000.0,
        "Chloramines": 7.0,
        "Sulfate": 300.0,
        "Conductivity": 400.0,
        "Organic_carbon": 10.0,
        "Trihalomethanes": 70.0,
        "Turbidity": 4.0
    })
}

fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_endpoint() {
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["features"].as_array().unwrap().len(), 9);
    assert_eq!(json["features"][0], "ph");
    assert_eq!(json["trees"], 20);
}

#[tokio::test]
async fn test_index_page() {
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = test_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Water Potability Predictor"));
    assert!(html.contains("name=\"Trihalomethanes\""));
}

#[tokio::test]
async fn test_api_predict_is_stable() {
    let app = test_app();
    let mut labels = Vec::new();
    for _ in 0..2 {
        let req = post("/api/predict", "application/json", sample_json().to_string());
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let label = json["label"].as_str().unwrap().to_string();
        assert!(label == "POTABLE" || label == "NOT_POTABLE");
        let p = json["probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
        labels.push(label);
    }
    assert_eq!(labels[0], labels[1]);
}

#[tokio::test]
async fn test_api_predict_schema_mismatch() {
    let mut missing = sample_json();
    missing.as_object_mut().unwrap().remove("Sulfate");
    let mut extra = sample_json();
    extra["Colour"] = json!(1.0);
    let mut text = sample_json();
    text["ph"] = json!("seven");

    for body in [missing, extra, text] {
        let req = post("/api/predict", "application/json", body.to_string());
        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("schema mismatch"));
    }
}

#[tokio::test]
async fn test_form_predict() {
    let form: Vec<String> = FEATURE_NAMES
        .iter()
        .zip(["7", "100", "10000", "7", "300", "400", "10", "70", "4"])
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    let req = post(
        "/predict",
        "application/x-www-form-urlencoded",
        form.join("&"),
    );
    let response = test_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("id=\"verdict\""));
}

#[tokio::test]
async fn test_form_missing_field_is_reported() {
    let req = post(
        "/predict",
        "application/x-www-form-urlencoded",
        "ph=7&Hardness=100",
    );
    let response = test_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("id=\"error\""));
    assert!(html.contains("Turbidity"));
    assert!(html.contains("name=\"ph\" value=\"7\""));
    assert!(html.contains("name=\"Hardness\" value=\"100\""));
    assert!(html.contains("name=\"Solids\" value=\"\""));
}

#[tokio::test]
async fn test_batch_appends_prediction_column() {
    let csv = format!(
        "{}\n7,100,10000,7,300,400,10,70,4\n,100,,7,300,400,10,70,4\n2,250,40000,9,450,500,20,90,3\n",
        FEATURE_NAMES.join(",")
    );
    let response = test_app()
        .oneshot(post("/api/predict/batch", "text/csv", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"potability_results.csv\""
    );

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with(",Prediction"));
    assert!(lines[2].starts_with(",100,,7"));
    for line in &lines[1..] {
        assert!(
            line.ends_with(",Potable") || line.ends_with(",Not Potable"),
            "{line}"
        );
    }
}

#[tokio::test]
async fn test_batch_missing_column_is_422() {
    let csv = "ph,Hardness\n7,100\n";
    let response = test_app()
        .oneshot(post("/api/predict/batch", "text/csv", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Solids"));
}

#[tokio::test]
async fn test_body_limit() {
    let csv = format!("{}\n", FEATURE_NAMES.join(","))
        + &"7,100,10000,7,300,400,10,70,4\n".repeat(100);
    let response = test_app_with_limit(256)
        .oneshot(post("/api/predict/batch", "text/csv", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
