//! HTTP routes for health and prediction

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use flightdelay_core::{
    DelayPredictor, FlightValidator, JsonLinesSink, PredictError, PredictionRequest,
    PredictionResponse, PredictionSink, TracingSink,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::errors::ApiError;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<DelayPredictor>,
    pub validator: Arc<FlightValidator>,
    pub sink: Arc<dyn PredictionSink>,
}

impl AppState {
    pub fn new(
        predictor: DelayPredictor,
        validator: FlightValidator,
        sink: Arc<dyn PredictionSink>,
    ) -> Self {
        Self {
            predictor: Arc::new(predictor),
            validator: Arc::new(validator),
            sink,
        }
    }

    /// Load the artifact and open the prediction log
    ///
    /// A missing or corrupt artifact leaves the service running with an
    /// unavailable predictor.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let predictor = DelayPredictor::load_or_unavailable(&config.model_path);

        let sink: Arc<dyn PredictionSink> = match &config.prediction_log {
            Some(path) => match JsonLinesSink::open(path) {
                Ok(sink) => {
                    info!(path = %path.display(), "logging predictions");
                    Arc::new(sink)
                }
                Err(e) => {
                    warn!(path = %path.display(), "cannot open prediction log, using tracing: {}", e);
                    Arc::new(TracingSink)
                }
            },
            None => Arc::new(TracingSink),
        };

        Self::new(predictor, config.validator(), sink)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    schema_width: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/predict", post(handle_predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, "delay service listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("delay service terminated unexpectedly")
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.predictor.is_available(),
        schema_width: state.predictor.schema().map_or(0, |s| s.width()),
    })
}

async fn handle_predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    state.validator.validate_all(request.records())?;
    debug!(
        rows = request.records().len(),
        batch = request.is_batch(),
        "prediction request validated"
    );

    let predictor = Arc::clone(&state.predictor);
    let (request, response) = tokio::task::spawn_blocking(move || {
        let response = predictor.predict_request(&request);
        (request, response)
    })
    .await
    .map_err(|e| PredictError::Inference(format!("prediction task failed: {e}")))?;
    let response = response?;

    // Sink writes may block on disk; detach them from the response
    let predictions = response.predictions();
    let sink = Arc::clone(&state.sink);
    tokio::task::spawn_blocking(move || {
        for (record, prediction) in request.records().iter().zip(predictions) {
            sink.record(record, prediction);
        }
    });

    Ok(Json(response))
}
