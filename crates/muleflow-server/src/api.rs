//! HTTP API: upload, poll, download, graph, health.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, RequestExt, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use muleflow_core::config::EngineConfig;
use muleflow_engine::report::DownloadReport;
use muleflow_engine::types::AnalysisStatus;
use muleflow_engine::AnalysisEngine;

use crate::store::{ResultStore, StoredAnalysis};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Result store injected into every handler.
    pub store: Arc<ResultStore>,
    /// Engine configuration.
    pub config: Arc<EngineConfig>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_input_bytes + 64 * 1024;
    Router::new()
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/analysis/{id}", get(analysis_status))
        .route("/api/v1/analysis/{id}/download", get(download))
        .route("/api/v1/analysis/{id}/graph", get(graph))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

/// Pull the CSV payload out of the request: either the first file field
/// of a multipart form, or the raw body.
async fn extract_csv(request: Request, body_limit: usize) -> Result<Bytes, Response> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart: Multipart = request.extract().await.map_err(|_| {
            error_response(StatusCode::BAD_REQUEST, "malformed multipart body")
        })?;
        while let Some(field) = multipart.next_field().await.map_err(|_| {
            error_response(StatusCode::BAD_REQUEST, "malformed multipart body")
        })? {
            if field.name() == Some("file") || field.file_name().is_some() {
                return field.bytes().await.map_err(|_| {
                    error_response(StatusCode::BAD_REQUEST, "malformed multipart body")
                });
            }
        }
        Err(error_response(
            StatusCode::BAD_REQUEST,
            "no file field in multipart body",
        ))
    } else {
        axum::body::to_bytes(request.into_body(), body_limit)
            .await
            .map_err(|_| error_response(StatusCode::PAYLOAD_TOO_LARGE, "body too large"))
    }
}

/// POST /api/v1/analyze: accept a CSV batch and start the analysis.
async fn analyze(State(state): State<AppState>, request: Request) -> Response {
    let body_limit = state.config.max_input_bytes + 64 * 1024;
    let csv_bytes = match extract_csv(request, body_limit).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    if csv_bytes.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No file content received");
    }
    if csv_bytes.len() > state.config.max_input_bytes {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "File too large. Maximum size is 10MB.",
        );
    }

    let analysis_id = Uuid::new_v4().to_string();
    state
        .store
        .put(&analysis_id, StoredAnalysis::pending(analysis_id.clone()));

    let store = Arc::clone(&state.store);
    let config = Arc::clone(&state.config);
    let id = analysis_id.clone();
    tokio::spawn(async move {
        store.update_status(&id, AnalysisStatus::Processing);

        let worker_id = id.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            AnalysisEngine::analyze(&csv_bytes, &config)
        })
        .await;

        let mut entry = StoredAnalysis::pending(worker_id.clone());
        match outcome {
            Ok(Ok(result)) => {
                entry.status = AnalysisStatus::Complete;
                entry.result = Some(result);
            }
            Ok(Err(err)) => {
                tracing::warn!(analysis_id = %worker_id, error = %err, "analysis failed");
                entry.status = AnalysisStatus::Error;
                entry.error = Some(err.to_string());
            }
            Err(join_err) => {
                tracing::error!(analysis_id = %worker_id, error = %join_err, "worker panicked");
                entry.status = AnalysisStatus::Error;
                entry.error = Some("analysis worker failed".to_string());
            }
        }
        store.put(&worker_id, entry);
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({ "analysis_id": analysis_id, "status": "pending" })),
    )
        .into_response()
}

/// GET /api/v1/analysis/{id}: poll status, returning the result once
/// complete.
async fn analysis_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(entry) = state.store.get(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Analysis not found");
    };

    let mut body = json!({
        "analysis_id": entry.analysis_id,
        "status": entry.status.as_str(),
    });
    match entry.status {
        AnalysisStatus::Complete => {
            if let Some(result) = &entry.result {
                body["result"] = json!({
                    "summary": result.summary,
                    "suspicious_accounts": result.suspicious_accounts,
                    "fraud_rings": result.fraud_rings,
                });
            }
        }
        AnalysisStatus::Error => {
            body["error"] = json!(entry.error.clone().unwrap_or_default());
        }
        _ => {
            body["result"] = serde_json::Value::Null;
        }
    }

    Json(body).into_response()
}

/// GET /api/v1/analysis/{id}/download: the forensic report.
async fn download(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(entry) = state.store.get(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Analysis not found");
    };
    let (AnalysisStatus::Complete, Some(result)) = (entry.status, &entry.result) else {
        return error_response(StatusCode::BAD_REQUEST, "Analysis not yet completed");
    };

    let report = DownloadReport::from_result(result);
    match report.to_json() {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"analysis_{id}.json\""),
                ),
            ],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(analysis_id = %id, error = %err, "report serialization failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "serialization failed")
        }
    }
}

/// GET /api/v1/analysis/{id}/graph: visualization data.
async fn graph(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(entry) = state.store.get(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Analysis not found");
    };
    let (AnalysisStatus::Complete, Some(result)) = (entry.status, entry.result) else {
        return error_response(StatusCode::BAD_REQUEST, "Analysis not yet completed");
    };

    Json(result.graph).into_response()
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "muleflow-server" }))
}
