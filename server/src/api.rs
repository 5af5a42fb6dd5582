//! JSON and CSV endpoints.

use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use potability::dataset::FeatureTable;
use potability::{FeatureRow, Potability, PotabilityError, Predictor};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

/// File name offered for batch results.
pub const RESULTS_FILE_NAME: &str = "potability_results.csv";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn api_error(status: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        error: message.to_string(),
    };
    (status, Json(body)).into_response()
}

/// A failed request on its way to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Error from the classifier library.
    Potability(PotabilityError),
    /// The blocking worker panicked or was cancelled.
    Worker(JoinError),
}

impl From<PotabilityError> for ApiError {
    fn from(err: PotabilityError) -> Self {
        Self::Potability(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::Worker(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Potability(err) if err.is_input_error() => {
                warn!(error = %err, "rejected request");
                api_error(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string())
            }
            Self::Potability(err) => {
                error!(error = %err, "prediction failed");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
            Self::Worker(err) => {
                error!(error = %err, "prediction worker failed");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Single-row prediction result.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub label: Potability,
    pub annotation: &'static str,
    pub probability: f64,
}

/// `POST /api/predict`: classify one JSON feature row.
pub async fn predict_one(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let row: FeatureRow = serde_json::from_slice(&body)
        .map_err(|e| PotabilityError::SchemaMismatch(e.to_string()))?;
    let probability = state.predictor.predict_proba_one(&row)?;
    let label = Potability::from_probability(probability);
    debug!(%label, probability, "api prediction");

    Ok(Json(PredictionResponse {
        label,
        annotation: label.annotation(),
        probability,
    }))
}

/// Parse, classify and re-serialize a CSV table with a `Prediction` column
/// appended.
fn score_csv(predictor: &Predictor, body: &[u8]) -> Result<Vec<u8>, PotabilityError> {
    let table = FeatureTable::from_csv_reader(body)?;
    let predictions = predictor.predict_batch(&table)?;
    let annotations: Vec<&str> = predictions.iter().map(|p| p.annotation()).collect();

    let mut out = Vec::with_capacity(body.len() + 16 * annotations.len());
    table.write_csv_with_predictions(&mut out, &annotations)?;
    debug!(rows = table.len(), "batch prediction");
    Ok(out)
}

/// `POST /api/predict/batch`: classify a CSV table and return it with a
/// `Prediction` column appended. Runs on the blocking pool.
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let out = tokio::task::spawn_blocking(move || score_csv(&state.predictor, &body)).await??;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{RESULTS_FILE_NAME}\""),
            ),
        ],
        out,
    )
        .into_response())
}

/// `GET /health`: liveness plus the feature schema of the loaded artifact.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let pipeline = state.predictor.pipeline();
    let body = serde_json::json!({
        "status": "healthy",
        "features": pipeline.feature_names(),
        "trees": pipeline.model().trees().len(),
    });
    (StatusCode::OK, Json(body)).into_response()
}
