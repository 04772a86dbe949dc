//! gatilho-server library interface
//!
//! Exposes the router, state and pipeline for the binary and for
//! integration tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use crate::config::PipelineTiming;
use crate::services::TextProvider;
use crate::workflow::AnalysisSequencer;
use axum::Router;
use chrono::{DateTime, Utc};
use gatilho_common::events::ProgressRegistry;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Events buffered per analysis channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Per-analysis event channels
    pub registry: ProgressRegistry,
    pub sequencer: Arc<AnalysisSequencer>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Message of the most recent failed analysis
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, provider: Arc<dyn TextProvider>, timing: PipelineTiming) -> Self {
        let registry = ProgressRegistry::new(EVENT_CHANNEL_CAPACITY);
        let sequencer = Arc::new(AnalysisSequencer::new(
            db.clone(),
            registry.clone(),
            provider,
            timing,
        ));

        Self {
            db,
            registry,
            sequencer,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analysis_routes())
        .merge(api::driver_routes())
        .merge(api::health_routes())
        .merge(api::ws_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
