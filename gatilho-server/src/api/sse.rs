//! GET /api/analysis/:id/events - resumable progress stream
//!
//! A client that lost its socket reconnects here: the stream opens with
//! the persisted state of the analysis, then follows its live channel.

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use gatilho_common::db::{AnalysisRequest, AnalysisStatus, PENDING_PHASE};
use gatilho_common::events::AnalysisEvent;
use gatilho_common::sse::analysis_event_stream;
use std::convert::Infallible;
use uuid::Uuid;

use crate::db::{analyses, children};
use crate::error::{ApiError, ApiResult};
use crate::workflow::{Phase, ERROR_MESSAGE_PREFIX};
use crate::AppState;

const PENDING_MESSAGE: &str = "Aguardando início da análise";

/// Events describing the stored state of an analysis
pub fn snapshot_events(
    analysis: &AnalysisRequest,
    report: Option<serde_json::Value>,
) -> Vec<AnalysisEvent> {
    let analysis_id = analysis.id;

    let event = match analysis.status {
        AnalysisStatus::Queued => AnalysisEvent::ProgressUpdate {
            analysis_id,
            phase: PENDING_PHASE.to_string(),
            progress: 0,
            message: PENDING_MESSAGE.to_string(),
        },
        AnalysisStatus::Processing => AnalysisEvent::ProgressUpdate {
            analysis_id,
            phase: analysis.current_phase.clone(),
            progress: analysis.progress,
            message: Phase::from_label(&analysis.current_phase)
                .map(|phase| phase.message().to_string())
                .unwrap_or_default(),
        },
        AnalysisStatus::Completed => AnalysisEvent::AnalysisComplete {
            analysis_id,
            progress: Phase::Complete.progress(),
            report: report.unwrap_or(serde_json::Value::Null),
        },
        AnalysisStatus::Error => AnalysisEvent::Error {
            analysis_id: Some(analysis_id),
            message: format!("{}análise encerrada com erro", ERROR_MESSAGE_PREFIX),
        },
    };

    vec![event]
}

pub async fn analysis_events(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    // Subscribe before reading the snapshot so no event falls in between
    let rx = state.registry.subscribe(analysis_id).await;

    let analysis = match analyses::load_analysis(&state.db, analysis_id).await? {
        Some(analysis) => analysis,
        None => {
            state.registry.close(analysis_id).await;
            return Err(ApiError::NotFound(format!("Analysis not found: {}", analysis_id)));
        }
    };

    let report = if analysis.status == AnalysisStatus::Completed {
        children::load_report(&state.db, analysis_id)
            .await?
            .map(|record| record.full_report_json)
    } else {
        None
    };

    if analysis.status.is_terminal() {
        // No sequencer will publish again; drop the channel this request opened
        state.registry.close(analysis_id).await;
    }

    Ok(analysis_event_stream(
        state.registry.clone(),
        analysis_id,
        snapshot_events(&analysis, report),
        rx,
    ))
}
