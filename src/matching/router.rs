use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::{ExclusionReason, MatchResult};
use super::repository::{RepositoryError, SubmissionId, SubmissionRecord, SubmissionRepository};
use super::service::{MatchRequest, MatchService, MatchServiceError};

/// Router builder exposing the matching endpoints.
pub fn matching_router<R>(service: Arc<MatchService<R>>) -> Router
where
    R: SubmissionRepository + 'static,
{
    Router::new()
        .route("/api/v1/matches", post(submit_handler::<R>))
        .route("/api/v1/matches/:submission_id", get(status_handler::<R>))
        .with_state(service)
}

/// Response body for a completed matching request.
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub submission_id: SubmissionId,
    pub profile_hash: String,
    pub matches: Vec<MatchResult>,
    pub exclusions: Vec<ExclusionReason>,
}

impl From<SubmissionRecord> for MatchResponse {
    fn from(record: SubmissionRecord) -> Self {
        Self {
            submission_id: record.submission_id,
            profile_hash: record.profile_hash,
            matches: record.outcome.matches,
            exclusions: record.outcome.exclusions,
        }
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<MatchService<R>>>,
    axum::Json(request): axum::Json<MatchRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
{
    match service.submit(request) {
        Ok(record) => {
            let response = MatchResponse::from(record);
            (StatusCode::OK, axum::Json(response)).into_response()
        }
        Err(error @ (MatchServiceError::InvalidLocale { .. } | MatchServiceError::Validation(_))) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(MatchServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "submission already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<MatchService<R>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    R: SubmissionRepository + 'static,
{
    let id = SubmissionId(submission_id);
    match service.get(&id) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(MatchServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": format!("submission '{id}' not found"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
