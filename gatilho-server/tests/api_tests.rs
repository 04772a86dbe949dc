//! Integration tests for gatilho-server HTTP endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use gatilho_common::db::{init_memory_database, AnalysisStatus, AnalysisType, Priority};
use gatilho_common::events::StartAnalysisPayload;
use gatilho_server::api::ws::prepare_analysis;
use gatilho_server::config::PipelineTiming;
use gatilho_server::db::analyses;
use gatilho_server::services::SimulatedProvider;
use gatilho_server::{AppState, ApiError};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use uuid::Uuid;

/// Test helper: app state over an in-memory database with no pacing
async fn create_test_state() -> AppState {
    let pool = init_memory_database()
        .await
        .expect("Failed to create in-memory database");

    AppState::new(
        pool,
        Arc::new(SimulatedProvider::new(Duration::ZERO)),
        PipelineTiming::immediate(),
    )
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let app = gatilho_server::build_router(state.clone());
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_analysis(state: &AppState, competitors: Option<&str>) -> Uuid {
    let (status, body) = send(
        state,
        post_json(
            "/api/analysis",
            json!({
                "product": "Curso X",
                "target": "Empreendedores",
                "competitors": competitors,
                "details": "Lançamento em março",
                "urgency": "high"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["analysisId"].as_str().unwrap().parse().unwrap()
}

async fn wait_for_terminal(state: &AppState, analysis_id: Uuid) -> AnalysisStatus {
    for _ in 0..200 {
        let analysis = analyses::load_analysis(&state.db, analysis_id).await.unwrap().unwrap();
        if analysis.status.is_terminal() {
            return analysis.status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("analysis {} did not finish", analysis_id);
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = create_test_state().await;
    let (status, body) = send(&state, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "Plataforma de Análise Psicológica ativa");
    assert_eq!(body["module"], "gatilho-server");
    assert!(body["timestamp"].is_string());
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_driver_catalog() {
    let state = create_test_state().await;
    let (status, body) = send(&state, get("/api/drivers")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 10);
    assert_eq!(body["drivers"].as_array().unwrap().len(), 10);
    assert_eq!(body["drivers"][0]["name"], "Ferida Exposta");
}

#[tokio::test]
async fn test_create_analysis_stores_queued_record() {
    let state = create_test_state().await;
    let (status, body) = send(
        &state,
        post_json("/api/analysis", json!({"product": "Curso X", "target": "Empreendedores"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Análise iniciada com sucesso");

    let analysis_id: Uuid = body["analysisId"].as_str().unwrap().parse().unwrap();
    let stored = analyses::load_analysis(&state.db, analysis_id).await.unwrap().unwrap();
    assert_eq!(stored.status, AnalysisStatus::Queued);
    assert_eq!(stored.progress, 0);
}

#[tokio::test]
async fn test_create_analysis_requires_product_and_target() {
    let state = create_test_state().await;
    let (status, body) = send(
        &state,
        post_json("/api/analysis", json!({"product": "  ", "target": "Empreendedores"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(analyses::list_analyses(&state.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_start_runs_pipeline_to_completion() {
    let state = create_test_state().await;
    let analysis_id = create_analysis(&state, Some("ConcA, ConcB")).await;

    let (status, body) = send(
        &state,
        post_json(&format!("/api/analysis/{}/start", analysis_id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "processing");

    assert_eq!(wait_for_terminal(&state, analysis_id).await, AnalysisStatus::Completed);

    let (_, drivers) = send(&state, get(&format!("/api/analysis/{}/drivers", analysis_id))).await;
    assert_eq!(drivers.as_array().unwrap().len(), 5);

    let (_, objections) = send(&state, get(&format!("/api/analysis/{}/objections", analysis_id))).await;
    let objections = objections.as_array().unwrap();
    assert_eq!(objections.len(), 6);
    assert_eq!(objections.iter().filter(|o| o["is_hidden"] == true).count(), 3);

    let (_, demos) = send(&state, get(&format!("/api/analysis/{}/provi", analysis_id))).await;
    assert_eq!(demos.as_array().unwrap().len(), 3);

    let (status, report) = send(&state, get(&format!("/api/analysis/{}/report", analysis_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["full_report_json"]["quality_score"], 95);

    let (_, analysis) = send(&state, get(&format!("/api/analysis/{}", analysis_id))).await;
    assert_eq!(analysis["status"], "completed");
    assert_eq!(analysis["progress"], 100);
    assert_eq!(analysis["priority"], "high");
}

#[tokio::test]
async fn test_failed_analysis_is_reported_by_health() {
    let state = create_test_state().await;
    let analysis_id = create_analysis(&state, None).await;

    send(&state, post_json(&format!("/api/analysis/{}/start", analysis_id), json!({}))).await;
    assert_eq!(wait_for_terminal(&state, analysis_id).await, AnalysisStatus::Error);

    // The failure is recorded by a watcher task after the record is written
    let mut last_error = Value::Null;
    for _ in 0..100 {
        let (_, health) = send(&state, get("/health")).await;
        last_error = health["last_error"].clone();
        if !last_error.is_null() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(last_error, "Erro na análise: campo de concorrentes ausente");

    let (_, analysis) = send(&state, get(&format!("/api/analysis/{}", analysis_id))).await;
    assert_eq!(analysis["current_phase"], "ERROR");
}

#[tokio::test]
async fn test_start_rejects_unknown_and_started_analyses() {
    let state = create_test_state().await;

    let (status, _) = send(
        &state,
        post_json(&format!("/api/analysis/{}/start", Uuid::new_v4()), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let analysis_id = create_analysis(&state, Some("A")).await;
    let uri = format!("/api/analysis/{}/start", analysis_id);
    let (first, _) = send(&state, post_json(&uri, json!({}))).await;
    assert_eq!(first, StatusCode::ACCEPTED);

    wait_for_terminal(&state, analysis_id).await;
    let (second, body) = send(&state, post_json(&uri, json!({}))).await;
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_list_and_delete() {
    let state = create_test_state().await;
    let first = create_analysis(&state, Some("A")).await;
    let second = create_analysis(&state, Some("B")).await;

    let (status, body) = send(&state, get("/api/analysis")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let ids: Vec<_> = body["analyses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&first.to_string()) && ids.contains(&second.to_string()));

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/analysis/{}", first))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&state, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&state, get(&format!("/api/analysis/{}", first))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_report_missing_until_completed() {
    let state = create_test_state().await;
    let analysis_id = create_analysis(&state, Some("A")).await;

    let (status, _) = send(&state, get(&format!("/api/analysis/{}/report", analysis_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&state, get(&format!("/api/analysis/{}/drivers", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_stream_replays_completed_analysis() {
    let state = create_test_state().await;
    let analysis_id = create_analysis(&state, Some("ConcA")).await;
    send(&state, post_json(&format!("/api/analysis/{}/start", analysis_id), json!({}))).await;
    wait_for_terminal(&state, analysis_id).await;

    let app = gatilho_server::build_router(state.clone());
    let response = app
        .oneshot(get(&format!("/api/analysis/{}/events", analysis_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The snapshot is terminal, so the stream ends after one event
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("event: ANALYSIS_COMPLETE"));
    assert!(text.contains(&analysis_id.to_string()));
    assert_eq!(state.registry.channel_count().await, 0);
}

#[tokio::test]
async fn test_event_stream_unknown_analysis() {
    let state = create_test_state().await;
    let (status, _) = send(&state, get(&format!("/api/analysis/{}/events", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.registry.channel_count().await, 0);
}

#[tokio::test]
async fn test_abandoned_stream_of_queued_analysis_is_released() {
    let state = create_test_state().await;
    let analysis_id = create_analysis(&state, Some("A")).await;

    let app = gatilho_server::build_router(state.clone());
    let response = app
        .oneshot(get(&format!("/api/analysis/{}/events", analysis_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.registry.channel_count().await, 1);

    let (_, health) = send(&state, get("/health")).await;
    assert_eq!(health["active_analyses"], 0);

    // Client goes away before the analysis is started
    drop(response);
    for _ in 0..100 {
        if state.registry.channel_count().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.registry.channel_count().await, 0);
}

fn payload(analysis_id: Option<Uuid>) -> StartAnalysisPayload {
    StartAnalysisPayload {
        product: "Curso X".to_string(),
        target: "Empreendedores".to_string(),
        competitors: Some("ConcA, ConcB".to_string()),
        details: None,
        analysis_id,
        analysis_type: AnalysisType::Complete,
        priority: Priority::Normal,
    }
}

#[tokio::test]
async fn test_socket_intake_creates_record_without_id() {
    let state = create_test_state().await;
    let analysis = prepare_analysis(&state, payload(None)).await.unwrap();

    let stored = analyses::load_analysis(&state.db, analysis.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AnalysisStatus::Queued);
}

#[tokio::test]
async fn test_socket_intake_adopts_unknown_id() {
    let state = create_test_state().await;
    let requested = Uuid::new_v4();
    let analysis = prepare_analysis(&state, payload(Some(requested))).await.unwrap();

    assert_eq!(analysis.id, requested);
    assert!(analyses::load_analysis(&state.db, requested).await.unwrap().is_some());
}

#[tokio::test]
async fn test_socket_intake_reuses_queued_record() {
    let state = create_test_state().await;
    let analysis_id = create_analysis(&state, Some("A")).await;

    let analysis = prepare_analysis(&state, payload(Some(analysis_id))).await.unwrap();
    assert_eq!(analysis.id, analysis_id);
    // Stored fields win over the payload
    assert_eq!(analysis.competitors.as_deref(), Some("A"));
    assert_eq!(analyses::list_analyses(&state.db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_socket_intake_rejects_started_record() {
    let state = create_test_state().await;
    let analysis_id = create_analysis(&state, Some("A")).await;
    analyses::mark_processing(&state.db, analysis_id, "INITIALIZATION", 5).await.unwrap();

    let err = prepare_analysis(&state, payload(Some(analysis_id))).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn test_socket_intake_rejects_blank_target() {
    let state = create_test_state().await;
    let mut blank = payload(None);
    blank.target = String::new();

    assert!(matches!(
        prepare_analysis(&state, blank).await,
        Err(ApiError::BadRequest(_))
    ));
}
