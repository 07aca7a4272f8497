//! HTTP API handlers.
//!
//! Each handler reads from the version store or gauge and returns JSON or
//! Prometheus text.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};

use apptrail_core::{VersionRecord, WorkloadIdentity};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// One tracked workload as returned by the API.
#[derive(Debug, serde::Serialize)]
pub struct WorkloadView {
    pub namespace: String,
    pub name: String,
    pub previous_version: String,
    pub current_version: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl WorkloadView {
    fn new(identity: WorkloadIdentity, record: VersionRecord) -> Self {
        Self {
            namespace: identity.namespace,
            name: identity.name,
            previous_version: record.previous_version,
            current_version: record.current_version,
            last_updated: record.last_updated,
        }
    }
}

// ── Workloads ──────────────────────────────────────────────────

/// GET /api/v1/workloads
pub async fn list_workloads(State(state): State<ApiState>) -> impl IntoResponse {
    let workloads: Vec<WorkloadView> = state
        .store
        .snapshot()
        .await
        .into_iter()
        .map(|(id, record)| WorkloadView::new(id, record))
        .collect();
    ApiResponse::ok(workloads)
}

/// GET /api/v1/workloads/{namespace}/{name}
pub async fn get_workload(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
) -> impl IntoResponse {
    let identity = WorkloadIdentity::new(namespace, name);
    match state.store.get(&identity).await {
        Some(record) => ApiResponse::ok(WorkloadView::new(identity, record)).into_response(),
        None => error_response("workload not found", StatusCode::NOT_FOUND).into_response(),
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let series = state.gauge.series().await;
    let body = apptrail_metrics::render_prometheus(&series);
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
