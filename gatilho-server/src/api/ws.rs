//! GET /ws - duplex analysis channel
//!
//! Clients send `START_ANALYSIS`; the server answers with that analysis'
//! PROGRESS_UPDATE events and one terminal event. Several analyses may
//! run over the same socket, each event names its analysis.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use gatilho_common::db::{AnalysisRequest, AnalysisStatus};
use gatilho_common::events::{AnalysisEvent, ClientMessage, StartAnalysisPayload};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::analysis::{launch_analysis, non_blank, validate_intake};
use crate::db::analyses;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("WebSocket client connected");

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<AnalysisEvent>();

    let writer = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!("WebSocket: Failed to serialize {}: {}", event.event_type(), e);
                    continue;
                }
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = stream.next().await {
        match received {
            Ok(Message::Text(text)) => handle_client_text(&state, &text, &out_tx).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Running analyses continue; only this socket's delivery stops
    writer.abort();
    info!("WebSocket client disconnected");
}

/// Handle one text frame; replies go to the socket's writer channel
pub(crate) async fn handle_client_text(
    state: &AppState,
    text: &str,
    out_tx: &mpsc::UnboundedSender<AnalysisEvent>,
) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("WebSocket: Rejected client message: {}", e);
            let _ = out_tx.send(AnalysisEvent::Error {
                analysis_id: None,
                message: format!("Mensagem inválida: {}", e),
            });
            return;
        }
    };

    let ClientMessage::StartAnalysis { payload } = message;
    let requested_id = payload.analysis_id;

    match prepare_analysis(state, payload).await {
        Ok(analysis) => {
            // Subscribe before the sequencer publishes its first event
            let rx = state.registry.subscribe(analysis.id).await;
            tokio::spawn(forward_events(analysis.id, rx, out_tx.clone()));
            launch_analysis(state, analysis);
        }
        Err(e) => {
            let _ = out_tx.send(AnalysisEvent::Error {
                analysis_id: requested_id,
                message: e.to_string(),
            });
        }
    }
}

/// Resolve the record a START_ANALYSIS refers to, creating it if needed
///
/// A known ID must still be queued; an unknown ID or no ID at all creates a
/// new record from the payload.
pub async fn prepare_analysis(
    state: &AppState,
    payload: StartAnalysisPayload,
) -> ApiResult<AnalysisRequest> {
    validate_intake(&payload.product, &payload.target)?;

    if let Some(analysis_id) = payload.analysis_id {
        if let Some(existing) = analyses::load_analysis(&state.db, analysis_id).await? {
            if existing.status != AnalysisStatus::Queued {
                return Err(ApiError::BadRequest(format!(
                    "Analysis {} is already {}",
                    analysis_id,
                    existing.status.as_str()
                )));
            }
            return Ok(existing);
        }
    }

    let analysis = AnalysisRequest::with_id(
        payload.analysis_id.unwrap_or_else(Uuid::new_v4),
        payload.product.trim(),
        payload.target.trim(),
        payload.competitors,
        non_blank(payload.details),
        payload.analysis_type,
        payload.priority,
    );
    analyses::insert_analysis(&state.db, &analysis).await?;

    info!(analysis_id = %analysis.id, "Analysis created from WebSocket intake");
    Ok(analysis)
}

/// Relay one analysis channel to a socket until its terminal event
async fn forward_events(
    analysis_id: Uuid,
    mut rx: broadcast::Receiver<AnalysisEvent>,
    out_tx: mpsc::UnboundedSender<AnalysisEvent>,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let terminal = event.is_terminal();
                if out_tx.send(event).is_err() || terminal {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(analysis_id = %analysis_id, skipped, "WebSocket: Client lagged, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}
