use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use nowcast_core::{Forecaster, History, NowcastError, Sample, LOOKBACK};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;

/// Shared handles passed to every request.
#[derive(Clone)]
pub struct AppState {
    history: Arc<Mutex<History>>,
    model: Arc<dyn Forecaster>,
    model_path: Arc<PathBuf>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(history: History, model: Arc<dyn Forecaster>, model_path: PathBuf) -> Self {
        Self {
            history: Arc::new(Mutex::new(history)),
            model,
            model_path: Arc::new(model_path),
            started_at: Utc::now(),
        }
    }

    /// Locks the history. Appends never leave it half-written, so a poisoned
    /// lock is recovered rather than propagated.
    fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(|poisoned| {
            warn!("History mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

// Request/response types
#[derive(Deserialize)]
struct PredictRequest {
    number: serde_json::Value,
}

/// Accepts JSON numbers and strings that parse as a finite number.
fn reading_value(number: serde_json::Value) -> Result<f64, NowcastError> {
    let value = match number {
        serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
            NowcastError::MalformedInput(format!("`number` is out of range: {n}"))
        })?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            NowcastError::MalformedInput(format!("`number` is not numeric: {s:?}"))
        })?,
        _ => {
            return Err(NowcastError::MalformedInput(
                "`number` must be a number or numeric string".to_string(),
            ))
        }
    };
    if !value.is_finite() {
        return Err(NowcastError::MalformedInput(
            "`number` must be finite".to_string(),
        ));
    }
    Ok(value)
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// `None` until the history holds a full lookback window
    pub prediction: Option<f64>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
    started_at: DateTime<Utc>,
    samples: usize,
    lookback: usize,
    warming_up: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] NowcastError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NowcastError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_client_error() {
            warn!(error = %self.0, "Rejected request");
        } else {
            error!(error = %self.0, "Request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn parse_reading(body: &[u8]) -> Result<f64, NowcastError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(NowcastError::MalformedInput(
            "request body is empty".to_string(),
        ));
    }
    let request: PredictRequest = serde_json::from_slice(body)
        .map_err(|e| NowcastError::MalformedInput(e.to_string()))?;
    reading_value(request.number)
}

// Handlers
async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let value = parse_reading(&body)?;

    // Append and copy the window under one lock; inference runs without it.
    let (samples, window) = {
        let mut history = state.history();
        history.append(Sample::now(value));
        (history.len(), history.window())
    };

    let Some(window) = window else {
        debug!(samples, lookback = LOOKBACK, "Warming up, no prediction yet");
        return Ok(Json(PredictResponse { prediction: None }));
    };

    let model = Arc::clone(&state.model);
    let prediction = tokio::task::spawn_blocking(move || model.forecast(&window))
        .await
        .map_err(|e| NowcastError::Inference(format!("inference task failed: {e}")))??;

    if !prediction.is_finite() {
        return Err(NowcastError::Inference(format!(
            "model returned a non-finite value ({prediction})"
        ))
        .into());
    }

    debug!(samples, prediction, "Prediction served");
    Ok(Json(PredictResponse {
        prediction: Some(prediction),
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let samples = state.history().len();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: state.model_path.display().to_string(),
        started_at: state.started_at,
        samples,
        lookback: LOOKBACK,
        warming_up: samples < LOOKBACK,
    })
}

pub fn router(state: AppState, cors: bool) -> Router {
    let app = Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(state);

    if cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

pub async fn run_api_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(state, config.cors);

    let host = if std::env::var("NOWCAST_PUBLIC").is_ok() {
        "0.0.0.0"
    } else {
        config.host.as_str()
    };
    let addr = format!("{}:{}", host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
