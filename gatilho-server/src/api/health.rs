//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

pub const HEALTH_MESSAGE: &str = "Plataforma de Análise Psicológica ativa";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "OK" while the service answers
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Module name ("gatilho-server")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Analyses with an open event channel
    pub active_analyses: usize,
    /// Message of the most recent failed analysis, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    let uptime_seconds = now.signed_duration_since(state.startup_time).num_seconds().max(0) as u64;
    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: "OK".to_string(),
        message: HEALTH_MESSAGE.to_string(),
        timestamp: now,
        module: "gatilho-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        active_analyses: state.registry.active_count().await,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
