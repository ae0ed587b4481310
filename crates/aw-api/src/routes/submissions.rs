//! Submission endpoints backed by the spreadsheet store.
//!
//! Reads are open; writes need a logged-in user. Storage calls do blocking
//! file IO and run on the blocking pool.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::debug;

use aw_core::{Record, SpreadsheetStorage, StorageError, Submission};

use crate::auth::CurrentUser;
use crate::dto::{
    SubmissionListResponse, SubmissionResponse, SubmissionSavedResponse, SuccessResponse,
};
use crate::error::{ApiError, ErrorResponse};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Creates submission routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_submissions).post(create_submission))
        .route("/search", post(search_submissions))
        .route(
            "/:id",
            get(get_submission)
                .put(update_submission)
                .delete(delete_submission),
        )
}

/// Runs a storage operation on the blocking pool.
pub(crate) async fn with_storage<T, F>(
    storage: &Arc<SpreadsheetStorage>,
    op: F,
) -> Result<T, ApiError>
where
    F: FnOnce(&SpreadsheetStorage) -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    let storage = Arc::clone(storage);
    let result = tokio::task::spawn_blocking(move || op(&storage)).await?;
    result.map_err(ApiError::from)
}

fn validate(submission: &Submission) -> Result<(), ApiError> {
    submission.validate().map_err(ApiError::InvalidSubmission)
}

/// Validates and stores a new submission.
#[utoipa::path(
    post,
    path = "/api/submissions",
    responses(
        (status = 201, description = "Submission saved", body = SubmissionSavedResponse),
        (status = 400, description = "Validation failed; `details.errors` lists the problems", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    tag = "Submissions"
)]
pub async fn create_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(submission): ApiJson<Submission>,
) -> Result<(StatusCode, Json<SubmissionSavedResponse>), ApiError> {
    validate(&submission)?;

    let id = with_storage(&state.submissions, move |store| {
        store.save_submission(submission)
    })
    .await?;
    state.metrics.record_submission_saved();

    debug!(submission_id = %id, user = %user.username, "Submission saved");

    Ok((
        StatusCode::CREATED,
        Json(SubmissionSavedResponse {
            success: true,
            id,
            message: "Submission saved successfully".to_string(),
        }),
    ))
}

/// Lists every stored submission.
#[utoipa::path(
    get,
    path = "/api/submissions",
    responses(
        (status = 200, description = "All submissions", body = SubmissionListResponse)
    ),
    tag = "Submissions"
)]
pub async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<SubmissionListResponse>, ApiError> {
    let data = with_storage(&state.submissions, |store| store.list_submissions()).await?;

    Ok(Json(SubmissionListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

/// Reads one submission by id.
#[utoipa::path(
    get,
    path = "/api/submissions/{id}",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission", body = SubmissionResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "Submissions"
)]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let lookup = id.clone();
    let data = with_storage(&state.submissions, move |store| {
        store.get_submission(&lookup)
    })
    .await?
    .ok_or(StorageError::NotFound(id))?;

    Ok(Json(SubmissionResponse {
        success: true,
        data,
    }))
}

/// Finds submissions whose columns equal every given value.
#[utoipa::path(
    post,
    path = "/api/submissions/search",
    responses(
        (status = 200, description = "Matching submissions", body = SubmissionListResponse)
    ),
    tag = "Submissions"
)]
pub async fn search_submissions(
    State(state): State<AppState>,
    ApiJson(criteria): ApiJson<Record>,
) -> Result<Json<SubmissionListResponse>, ApiError> {
    let data = with_storage(&state.submissions, move |store| {
        store.search_submissions(&criteria)
    })
    .await?;

    Ok(Json(SubmissionListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

/// Replaces a stored submission.
#[utoipa::path(
    put,
    path = "/api/submissions/{id}",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission updated", body = SubmissionSavedResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "Submissions"
)]
pub async fn update_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(submission): ApiJson<Submission>,
) -> Result<Json<SubmissionSavedResponse>, ApiError> {
    validate(&submission)?;

    let target = id.clone();
    with_storage(&state.submissions, move |store| {
        store.update_submission(&target, submission)
    })
    .await?;

    debug!(submission_id = %id, user = %user.username, "Submission updated");

    Ok(Json(SubmissionSavedResponse {
        success: true,
        id,
        message: "Submission updated successfully".to_string(),
    }))
}

/// Removes a submission and its material and source rows.
#[utoipa::path(
    delete,
    path = "/api/submissions/{id}",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission deleted", body = SuccessResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "Submissions"
)]
pub async fn delete_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let target = id.clone();
    with_storage(&state.submissions, move |store| {
        store.delete_submission(&target)
    })
    .await?;

    debug!(submission_id = %id, user = %user.username, "Submission deleted");

    Ok(Json(SuccessResponse::with_message(
        "Submission deleted successfully",
    )))
}
