//! HTTP JSON surface: the two flows plus the bounded detection history.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use verity_core::history::{History, DETECTION_HISTORY_CAPACITY};
use verity_core::{
    DetectionRequest, FetchBackend, ModelBackend, ResearchRequest, Verdict,
};
use verity_local::{detect, research};

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn ModelBackend>,
    pub fetcher: Arc<dyn FetchBackend>,
    pub history: Arc<Mutex<History<HistoryEntry>>>,
}

impl AppState {
    pub fn new(model: Arc<dyn ModelBackend>, fetcher: Arc<dyn FetchBackend>) -> Self {
        Self {
            model,
            fetcher,
            history: Arc::new(Mutex::new(History::new(DETECTION_HISTORY_CAPACITY))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// First 50 chars of the submitted input.
    pub input: String,
    pub verdict: Verdict,
    pub score: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

fn summarize_input(input: &str) -> String {
    let mut out: String = input.chars().take(50).collect();
    if input.chars().count() > 50 {
        out.push_str("...");
    }
    out
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/detect", post(detect_handler))
        .route("/api/research", post(research_handler))
        .route("/api/history", get(history_handler))
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn flow_error(e: verity_core::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}

async fn detect_handler(
    State(state): State<AppState>,
    Json(req): Json<DetectionRequest>,
) -> Response {
    match detect::detect_fake_news(state.model.as_ref(), state.fetcher.as_ref(), &req).await {
        Ok(report) => {
            let mut history = state.history.lock().unwrap_or_else(|e| e.into_inner());
            history.push(HistoryEntry {
                input: summarize_input(&req.input),
                verdict: report.verdict,
                score: report.score,
                timestamp: chrono::Utc::now(),
            });
            Json(report).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "detection request failed");
            flow_error(e)
        }
    }
}

async fn research_handler(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Response {
    match research::generate_research_paper(state.model.as_ref(), &req).await {
        Ok(paper) => Json(paper).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "research request failed");
            flow_error(e)
        }
    }
}

async fn history_handler(State(state): State<AppState>) -> Response {
    let history = state.history.lock().unwrap_or_else(|e| e.into_inner());
    let entries: Vec<HistoryEntry> = history.iter().cloned().collect();
    Json(entries).into_response()
}
