//! Analysis API handlers
//!
//! POST /api/analysis creates a queued record; the pipeline starts through
//! POST /api/analysis/:id/start or a WebSocket START_ANALYSIS message.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use gatilho_common::db::{
    AnalysisRequest, AnalysisStatus, AnalysisType, MentalDriverRecord, ObjectionRecord, Priority,
    ReportRecord, VisualDemoRecord,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{analyses, children};
use crate::workflow::{spawn_analysis, AnalysisOutcome};
use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

pub const CREATED_MESSAGE: &str = "Análise iniciada com sucesso";

/// POST /api/analysis request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysisRequest {
    pub product: String,
    pub target: String,
    #[serde(default)]
    pub competitors: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub analysis_type: AnalysisType,
    #[serde(default, alias = "urgency")]
    pub priority: Priority,
}

/// POST /api/analysis response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysisResponse {
    pub success: bool,
    pub analysis_id: Uuid,
    pub message: String,
}

/// POST /api/analysis/:id/start response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAnalysisResponse {
    pub success: bool,
    pub analysis_id: Uuid,
    pub status: AnalysisStatus,
}

#[derive(Debug, Serialize)]
pub struct AnalysisListResponse {
    pub analyses: Vec<AnalysisRequest>,
    pub total: usize,
}

/// Product and audience are the only mandatory intake fields
pub fn validate_intake(product: &str, target: &str) -> ApiResult<()> {
    if product.trim().is_empty() {
        return Err(ApiError::BadRequest("product is required".to_string()));
    }
    if target.trim().is_empty() {
        return Err(ApiError::BadRequest("target is required".to_string()));
    }
    Ok(())
}

/// Blank optional text is stored as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Start the sequencer for a stored, queued analysis
///
/// Failures are recorded as the service's last error for /health.
pub fn launch_analysis(state: &AppState, analysis: AnalysisRequest) {
    let analysis_id = analysis.id;
    let handle = spawn_analysis(state.sequencer.clone(), analysis);
    let last_error = state.last_error.clone();

    tokio::spawn(async move {
        match handle.await {
            Ok(AnalysisOutcome::Failed { message, .. }) => {
                *last_error.write().await = Some(message);
            }
            Ok(AnalysisOutcome::Completed { .. }) => {}
            Err(join_error) => {
                tracing::error!(
                    analysis_id = %analysis_id,
                    error = %join_error,
                    "Analysis task panicked"
                );
                *last_error.write().await = Some(format!("Analysis task panicked: {}", join_error));
            }
        }
    });
}

/// POST /api/analysis
pub async fn create_analysis(
    State(state): State<AppState>,
    Json(request): Json<CreateAnalysisRequest>,
) -> ApiResult<Json<CreateAnalysisResponse>> {
    validate_intake(&request.product, &request.target)?;

    let analysis = AnalysisRequest::new(
        request.product.trim(),
        request.target.trim(),
        request.competitors,
        non_blank(request.details),
        request.analysis_type,
        request.priority,
    );
    analyses::insert_analysis(&state.db, &analysis).await?;

    tracing::info!(
        analysis_id = %analysis.id,
        product = %analysis.product_name,
        "Analysis created"
    );

    Ok(Json(CreateAnalysisResponse {
        success: true,
        analysis_id: analysis.id,
        message: CREATED_MESSAGE.to_string(),
    }))
}

/// POST /api/analysis/:id/start
pub async fn start_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<StartAnalysisResponse>)> {
    let analysis = require_analysis(&state, analysis_id).await?;

    if analysis.status != AnalysisStatus::Queued {
        return Err(ApiError::BadRequest(format!(
            "Analysis {} is already {}",
            analysis_id,
            analysis.status.as_str()
        )));
    }

    launch_analysis(&state, analysis);

    Ok((
        StatusCode::ACCEPTED,
        Json(StartAnalysisResponse {
            success: true,
            analysis_id,
            status: AnalysisStatus::Processing,
        }),
    ))
}

/// GET /api/analysis
pub async fn list_analyses(State(state): State<AppState>) -> ApiResult<Json<AnalysisListResponse>> {
    let analyses = analyses::list_analyses(&state.db).await?;
    Ok(Json(AnalysisListResponse {
        total: analyses.len(),
        analyses,
    }))
}

/// GET /api/analysis/:id
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> ApiResult<Json<AnalysisRequest>> {
    Ok(Json(require_analysis(&state, analysis_id).await?))
}

/// DELETE /api/analysis/:id
pub async fn delete_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !analyses::delete_analysis(&state.db, analysis_id).await? {
        return Err(not_found(analysis_id));
    }

    tracing::info!(analysis_id = %analysis_id, "Analysis deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/analysis/:id/drivers
pub async fn get_drivers(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MentalDriverRecord>>> {
    require_analysis(&state, analysis_id).await?;
    Ok(Json(children::list_drivers(&state.db, analysis_id).await?))
}

/// GET /api/analysis/:id/objections
pub async fn get_objections(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ObjectionRecord>>> {
    require_analysis(&state, analysis_id).await?;
    Ok(Json(children::list_objections(&state.db, analysis_id).await?))
}

/// GET /api/analysis/:id/provi
pub async fn get_demos(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> ApiResult<Json<Vec<VisualDemoRecord>>> {
    require_analysis(&state, analysis_id).await?;
    Ok(Json(children::list_demos(&state.db, analysis_id).await?))
}

/// GET /api/analysis/:id/report
pub async fn get_report(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> ApiResult<Json<ReportRecord>> {
    children::load_report(&state.db, analysis_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Report not found for analysis: {}", analysis_id)))
}

async fn require_analysis(state: &AppState, analysis_id: Uuid) -> ApiResult<AnalysisRequest> {
    analyses::load_analysis(&state.db, analysis_id)
        .await?
        .ok_or_else(|| not_found(analysis_id))
}

fn not_found(analysis_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Analysis not found: {}", analysis_id))
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analysis", post(create_analysis).get(list_analyses))
        .route("/api/analysis/:id", get(get_analysis).delete(delete_analysis))
        .route("/api/analysis/:id/start", post(start_analysis))
        .route("/api/analysis/:id/drivers", get(get_drivers))
        .route("/api/analysis/:id/objections", get(get_objections))
        .route("/api/analysis/:id/provi", get(get_demos))
        .route("/api/analysis/:id/report", get(get_report))
        .route("/api/analysis/:id/events", get(super::sse::analysis_events))
}
