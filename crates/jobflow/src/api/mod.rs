use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::imports::{ImportRunRow, RunLogRepo};
use crate::jobs::JobStore;
use crate::queue::TaskQueue;
use crate::scheduler::Scheduler;

#[derive(Clone)]
pub struct ApiState {
    pub queue: TaskQueue,
    pub store: JobStore,
    pub run_log: RunLogRepo,
    pub scheduler: Arc<Scheduler>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/imports/run", post(run_import))
        .route("/imports/trigger-now", post(trigger_now))
        .route("/imports/logs", get(list_logs))
        .route("/imports/stats", get(stats))
        .route("/health", get(health))
        .with_state(state)
}

fn internal_err(e: anyhow::Error) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("internal error: {e}"),
    )
}

#[derive(Debug, Deserialize)]
pub struct RunImportRequest {
    pub feed_url: String,
}

#[derive(Debug, Serialize)]
pub struct RunImportResponse {
    pub task_id: Uuid,
}

pub async fn run_import(
    State(state): State<ApiState>,
    Json(body): Json<RunImportRequest>,
) -> Result<Json<RunImportResponse>, (StatusCode, String)> {
    let feed_url = body.feed_url.trim();
    if feed_url.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "feed_url is required".into()));
    }

    let task_id = state.queue.enqueue(feed_url).await.map_err(internal_err)?;

    Ok(Json(RunImportResponse { task_id }))
}

#[derive(Debug, Serialize)]
pub struct TriggerNowResponse {
    pub message: String,
    pub feed_urls: Vec<String>,
}

pub async fn trigger_now(State(state): State<ApiState>) -> Json<TriggerNowResponse> {
    let summary = state.scheduler.trigger_all().await;

    Json(TriggerNowResponse {
        message: format!("Queued {} import tasks", summary.queued),
        feed_urls: summary.feed_urls,
    })
}

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    pub limit: Option<i64>,
}

pub async fn list_logs(
    State(state): State<ApiState>,
    Query(q): Query<ListLogsQuery>,
) -> Result<Json<Vec<ImportRunRow>>, (StatusCode, String)> {
    let rows = state
        .run_log
        .list_recent(q.limit.unwrap_or(100))
        .await
        .map_err(internal_err)?;

    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_jobs: i64,
    pub queued_tasks: i64,
    pub running_tasks: i64,
    pub dead_tasks: i64,
    pub last_import: Option<ImportRunRow>,
    pub recent_imports: usize,
}

pub async fn stats(
    State(state): State<ApiState>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let total_jobs = state.store.count_jobs().await.map_err(internal_err)?;
    let (queued_tasks, running_tasks, dead_tasks) =
        state.queue.depth().await.map_err(internal_err)?;
    let recent = state.run_log.list_recent(10).await.map_err(internal_err)?;

    Ok(Json(StatsResponse {
        total_jobs,
        queued_tasks,
        running_tasks,
        dead_tasks,
        last_import: recent.first().cloned(),
        recent_imports: recent.len(),
    }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
