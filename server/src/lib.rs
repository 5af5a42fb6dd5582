//! HTTP front end for the water potability classifier.
//!
//! Serves a plain HTML form for one sample, a CSV upload for many, and the
//! JSON/CSV endpoints behind them. The loaded [`Predictor`] is shared
//! read-only across requests.

pub mod api;
pub mod config;
pub mod page;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use potability::Predictor;
use std::sync::Arc;

pub use config::{load_config, ServerConfig};

/// Shared state for all handlers.
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,
    /// Predictor over the artifact loaded at startup.
    pub predictor: Predictor,
}

/// Build the axum [`Router`] with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;
    Router::new()
        .route("/", get(page::index))
        .route("/predict", post(page::predict_form))
        .route("/api/predict", post(api::predict_one))
        .route("/api/predict/batch", post(api::predict_batch))
        .route("/health", get(api::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
