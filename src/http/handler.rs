//! HTTP handlers for the dashboard API

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::remote::TaskService;
use crate::session::SessionError;
use crate::staging::StageSelection;
use serde_json::json;
use tracing::warn;
use super::server::AppState;

/// Session error rendered as `{"error", "kind"}`
pub struct ApiError(pub SessionError);

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SessionError::Submission(_) | SessionError::MissingResult(_) => StatusCode::BAD_GATEWAY,
            SessionError::NotReady(_) => StatusCode::ACCEPTED,
            SessionError::Stage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::TaskInFlight(_)
            | SessionError::NoTaskSubmitted
            | SessionError::NoResultsAvailable => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(kind = self.0.kind(), error = %self.0, "Request failed");
        }
        (
            status,
            Json(json!({ "error": self.0.to_string(), "kind": self.0.kind() })),
        )
            .into_response()
    }
}

/// Dropdown options for the three TNM axes
pub async fn staging_handler<S: TaskService>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    Json(state.staging.options())
}

/// Version and current session state
pub async fn status_handler<S: TaskService>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "session": session.snapshot(),
    }))
}

/// "Send task"
pub async fn submit_handler<S: TaskService>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = state.session.lock().await;
    let receipt = session.submit().await?;
    Ok(Json(json!({
        "task_id": receipt.task_id,
        "submitted_at": receipt.submitted_at.to_rfc3339(),
        "message": "Task was created, waiting for results...",
    })))
}

/// "Get results"
pub async fn results_handler<S: TaskService>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = state.session.lock().await;
    let outcome = session.retrieve().await?;
    Ok(Json(json!({
        "task_id": outcome.task_id,
        "clusters": outcome.clusters,
        "duration_minutes": outcome.duration_minutes,
        "message": format!("Analysis completed in {} minutes", outcome.duration_minutes),
    })))
}

/// Survival profile for the cluster nearest to the selected stage
pub async fn match_handler<S: TaskService>(
    State(state): State<AppState<S>>,
    Json(selection): Json<StageSelection>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session.lock().await;
    let outcome = session.match_stage(&selection)?;
    Ok(Json(json!({
        "encoded": outcome.encoded,
        "cluster": outcome.cluster,
        "centroid": outcome.centroid,
        "distance": outcome.distance,
        "chart": outcome.chart(),
    })))
}

/// Discard the current task and results
pub async fn reset_handler<S: TaskService>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    session.reset();
    Json(json!({ "session": session.snapshot() }))
}
